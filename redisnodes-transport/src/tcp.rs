//! TCP transport implementation using non-blocking I/O with mio

use super::Transport;
use crate::{Error, Result};
use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token};
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

const SOCKET_TOKEN: Token = Token(0);

/// Granularity of the connect wait loop
const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct TcpTransport {
    stream: Option<TcpStream>,
    poll: Poll,
    recv_buffer: Vec<u8>,
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Create a transport whose `connect` gives up after `connect_timeout`
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        Ok(Self {
            stream: None,
            poll: Poll::new()?,
            recv_buffer: vec![0u8; 16 * 1024],
            connect_timeout,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, target: &SocketAddr) -> Result<()> {
        let mut stream = TcpStream::connect(*target)?;

        let mut events = Events::with_capacity(1);
        self.poll.registry().register(
            &mut stream,
            SOCKET_TOKEN,
            Interest::WRITABLE | Interest::READABLE,
        )?;

        let deadline = Instant::now() + self.connect_timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let wait = (deadline - now).min(CONNECT_POLL_INTERVAL);
            self.poll.poll(&mut events, Some(wait))?;

            // Writable means the handshake finished, successfully or not
            let writable =
                events.iter().any(|event| event.token() == SOCKET_TOKEN && event.is_writable());
            if !writable {
                continue;
            }

            if let Some(err) = stream.take_error()? {
                let _ = self.poll.registry().deregister(&mut stream);
                return Err(Error::Connection(format!("Connection to {target} failed: {err}")));
            }

            match stream.peer_addr() {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotConnected => continue,
                Err(e) => {
                    let _ = self.poll.registry().deregister(&mut stream);
                    return Err(Error::Connection(format!("Connection to {target} failed: {e}")));
                }
            }

            self.poll.registry().reregister(&mut stream, SOCKET_TOKEN, Interest::READABLE)?;
            tracing::debug!("Connected to {}", target);
            self.stream = Some(stream);
            return Ok(());
        }

        let _ = self.poll.registry().deregister(&mut stream);
        Err(Error::Timeout(format!(
            "connecting to {target} took longer than {:?}",
            self.connect_timeout
        )))
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Connection("Not connected".to_string()))?;

        let mut total_written = 0;
        while total_written < data.len() {
            match stream.write(&data[total_written..]) {
                Ok(0) => {
                    return Err(Error::Connection("Connection closed while writing".to_string()))
                }
                Ok(n) => total_written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    // Socket buffer full, spin until ready
                    std::hint::spin_loop();
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Connection("Not connected".to_string()))?;

        // Readiness is edge-triggered, so drain until the socket would block
        let mut data = Vec::new();
        loop {
            match stream.read(&mut self.recv_buffer) {
                Ok(0) if data.is_empty() => {
                    return Err(Error::Connection("Connection closed by peer".to_string()))
                }
                Ok(0) => return Ok(data),
                Ok(n) => data.extend_from_slice(&self.recv_buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(data),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn poll_readable(&mut self, timeout: Duration) -> Result<bool> {
        let mut events = Events::with_capacity(1);
        self.poll.poll(&mut events, Some(timeout))?;

        Ok(events.iter().any(|event| event.token() == SOCKET_TOKEN && event.is_readable()))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = self.poll.registry().deregister(&mut stream);
        }
        Ok(())
    }
}
