//! Fetching the raw CLUSTER NODES report from a node

use anyhow::{anyhow, bail, Context, Result};
use redisnodes_protocols::{cluster_nodes_command, decode_text_reply, find_reply_end};
use redisnodes_transport::{TcpTransport, Transport};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Source of the raw membership report
pub trait ReportSource {
    /// Return the multi-line `CLUSTER NODES` text
    fn fetch_report(&mut self) -> Result<String>;
}

/// Issues `CLUSTER NODES` over a [`Transport`] and decodes the reply
pub struct ClusterNodesClient<T: Transport> {
    transport: T,
    server: String,
    read_timeout: Duration,
}

impl ClusterNodesClient<TcpTransport> {
    /// Client over a fresh TCP transport
    pub fn tcp(server: &str, connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let transport = TcpTransport::new(connect_timeout)?;
        Ok(Self::new(transport, server, read_timeout))
    }
}

impl<T: Transport> ClusterNodesClient<T> {
    pub fn new(transport: T, server: &str, read_timeout: Duration) -> Self {
        Self { transport, server: server.to_string(), read_timeout }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn read_reply(&mut self) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.read_timeout;
        let mut buffer = Vec::new();

        while find_reply_end(&buffer)? == 0 {
            let now = Instant::now();
            if now >= deadline {
                bail!(
                    "No complete reply from {} within {:?} ({} bytes received)",
                    self.server,
                    self.read_timeout,
                    buffer.len()
                );
            }

            if self.transport.poll_readable(deadline - now)? {
                let chunk = self
                    .transport
                    .recv()
                    .with_context(|| format!("Failed to read reply from {}", self.server))?;
                tracing::trace!("Received {} bytes", chunk.len());
                buffer.extend_from_slice(&chunk);
            }
        }

        Ok(buffer)
    }
}

impl<T: Transport> ReportSource for ClusterNodesClient<T> {
    fn fetch_report(&mut self) -> Result<String> {
        let addr = resolve_server(&self.server)?;
        tracing::debug!("Querying CLUSTER NODES from {} ({})", self.server, addr);

        self.transport
            .connect(&addr)
            .with_context(|| format!("Failed to connect to {}", self.server))?;

        let result = self
            .transport
            .send(&cluster_nodes_command())
            .with_context(|| format!("Failed to send CLUSTER NODES to {}", self.server))
            .and_then(|_| self.read_reply());

        if let Err(e) = self.transport.close() {
            tracing::debug!("Closing connection to {} failed: {}", self.server, e);
        }

        let reply = result?;
        decode_text_reply(&reply)
            .with_context(|| format!("CLUSTER NODES failed on {}", self.server))
    }
}

/// Turn a `host:port` target into a socket address
///
/// An empty host (`:6379`) means the local machine.
pub fn resolve_server(server: &str) -> Result<SocketAddr> {
    let target = if server.starts_with(':') {
        format!("127.0.0.1{server}")
    } else {
        server.to_string()
    };

    target
        .to_socket_addrs()
        .with_context(|| format!("Invalid server address: {}", server))?
        .next()
        .ok_or_else(|| anyhow!("Server address {} did not resolve", server))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redisnodes_transport::Error;
    use std::collections::VecDeque;

    /// Transport replaying canned reply chunks
    struct ScriptedTransport {
        chunks: VecDeque<Vec<u8>>,
        sent: Vec<u8>,
        connected: bool,
    }

    impl ScriptedTransport {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                sent: Vec::new(),
                connected: false,
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn connect(&mut self, _target: &SocketAddr) -> redisnodes_transport::Result<()> {
            self.connected = true;
            Ok(())
        }

        fn send(&mut self, data: &[u8]) -> redisnodes_transport::Result<()> {
            self.sent.extend_from_slice(data);
            Ok(())
        }

        fn recv(&mut self) -> redisnodes_transport::Result<Vec<u8>> {
            self.chunks.pop_front().ok_or_else(|| Error::Connection("closed".to_string()))
        }

        fn poll_readable(&mut self, _timeout: Duration) -> redisnodes_transport::Result<bool> {
            Ok(true)
        }

        fn close(&mut self) -> redisnodes_transport::Result<()> {
            self.connected = false;
            Ok(())
        }
    }

    #[test]
    fn test_reply_split_across_reads() {
        let transport = ScriptedTransport::new(&[b"$13\r\nm 1", b"27.0.0.1 ", b"x\r\n"]);
        let mut client =
            ClusterNodesClient::new(transport, "127.0.0.1:7000", Duration::from_secs(1));

        assert_eq!(client.fetch_report().unwrap(), "m 127.0.0.1 x");
        assert_eq!(client.transport.sent, b"*2\r\n$7\r\nCLUSTER\r\n$5\r\nNODES\r\n");
        assert!(!client.transport.connected);
    }

    #[test]
    fn test_error_reply_surfaces() {
        let transport =
            ScriptedTransport::new(&[b"-ERR This instance has cluster support disabled\r\n"]);
        let mut client =
            ClusterNodesClient::new(transport, "127.0.0.1:7000", Duration::from_secs(1));

        let err = client.fetch_report().unwrap_err();
        assert!(format!("{err:#}").contains("cluster support disabled"));
    }

    #[test]
    fn test_peer_closing_early_fails() {
        let transport = ScriptedTransport::new(&[b"$100\r\npartial"]);
        let mut client =
            ClusterNodesClient::new(transport, "127.0.0.1:7000", Duration::from_secs(1));
        assert!(client.fetch_report().is_err());
    }

    #[test]
    fn test_resolve_server() {
        let local: SocketAddr = "127.0.0.1:6379".parse().unwrap();
        assert_eq!(resolve_server(":6379").unwrap(), local);

        let explicit: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        assert_eq!(resolve_server("127.0.0.1:7000").unwrap(), explicit);
        assert!(resolve_server("no-port").is_err());
    }
}
