//! redisnodes transport layer
//!
//! This crate provides the TCP transport the `redisnodes` tool uses to issue a
//! single request/response exchange against a Redis node. Sockets are
//! non-blocking (driven by `mio`), but every operation that can wait is
//! bounded by a caller-supplied timeout so a silent peer can never hang the
//! process.
//!
//! ```rust,no_run
//! use redisnodes_transport::{TcpTransport, Transport};
//! use std::net::SocketAddr;
//! use std::time::Duration;
//!
//! let mut transport = TcpTransport::new(Duration::from_secs(5)).unwrap();
//! let addr: SocketAddr = "127.0.0.1:6379".parse().unwrap();
//!
//! transport.connect(&addr).unwrap();
//! transport.send(b"*1\r\n$4\r\nPING\r\n").unwrap();
//!
//! if transport.poll_readable(Duration::from_secs(1)).unwrap() {
//!     let response = transport.recv().unwrap();
//!     println!("Received: {:?}", response);
//! }
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Transport layer error types
#[derive(Debug)]
pub enum Error {
    /// I/O errors from transport layer
    Io(std::io::Error),

    /// Connection errors
    Connection(String),

    /// An operation did not finish within its deadline
    Timeout(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Connection(msg) => write!(f, "Connection error: {msg}"),
            Error::Timeout(msg) => write!(f, "Timeout: {msg}"),
            Error::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Single-connection transport
///
/// All methods are synchronous. Implementations must bound every wait so that
/// callers can rely on `connect` and `poll_readable` returning in finite time.
pub trait Transport {
    /// Connect to a target
    ///
    /// Returns once the connection is established, or with
    /// [`Error::Timeout`] when the transport's connect deadline passes.
    fn connect(&mut self, target: &SocketAddr) -> Result<()>;

    /// Write all of `data` to the peer
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive whatever data is currently available
    ///
    /// Returns an empty buffer if nothing is available yet. A peer that closed
    /// the connection is reported as [`Error::Connection`].
    fn recv(&mut self) -> Result<Vec<u8>>;

    /// Wait up to `timeout` for the connection to become readable
    fn poll_readable(&mut self, timeout: Duration) -> Result<bool>;

    /// Close the connection
    fn close(&mut self) -> Result<()>;
}

pub mod tcp;

pub use tcp::TcpTransport;
