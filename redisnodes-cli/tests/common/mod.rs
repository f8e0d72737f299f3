//! Common test utilities for integration tests
//!
//! Provides a scripted single-connection RESP server so the client can be
//! exercised over real TCP without a running Redis Cluster.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

/// Six-node report as printed by a three-shard cluster
pub const SIX_NODE_REPORT: &str = "\
07c37dfeb235213a872192d90877d0cd55635b91 127.0.0.1:30004@31004 slave e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 0 1426238317239 4 connected
67ed2db8d677e59ec4a4cefb06858cf2a1a89fa1 127.0.0.1:30002@31002 master - 0 1426238316232 2 connected 5461-10922
292f8b365bb7edb5e285caf0b7e6ddc7265d2f4f 127.0.0.1:30003@31003 master - 0 1426238318243 3 connected 10923-16383
6ec23923021cf3ffec47632106199cb7f496ce01 127.0.0.1:30005@31005 slave 67ed2db8d677e59ec4a4cefb06858cf2a1a89fa1 0 1426238316232 5 connected
824fe116063bc5fcf9f4ffd895bc17aee7731ac3 127.0.0.1:30006@31006 slave 292f8b365bb7edb5e285caf0b7e6ddc7265d2f4f 0 1426238317741 6 connected
e7d1eecce10fd6bb5eb35b9f99a514335d9ba9ca 127.0.0.1:30001@31001 myself,master - 0 0 1 connected 0-5460
";

/// Encode `text` as a RESP bulk string
pub fn bulk_reply(text: &str) -> Vec<u8> {
    format!("${}\r\n{}\r\n", text.len(), text).into_bytes()
}

/// Encode `text` as a RESP3 verbatim string
pub fn verbatim_reply(text: &str) -> Vec<u8> {
    format!("={}\r\ntxt:{}\r\n", text.len() + 4, text).into_bytes()
}

/// Server that answers one request with a canned reply
pub struct ScriptedServer {
    addr: SocketAddr,
    handle: Option<JoinHandle<Vec<u8>>>,
}

impl ScriptedServer {
    /// Accept one connection, read one command, write `reply` in `chunk_size` pieces
    pub fn start(reply: Vec<u8>, chunk_size: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind scripted server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("Failed to accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 256];
            while !request.ends_with(b"NODES\r\n") {
                let n = stream.read(&mut buf).expect("Failed to read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            for chunk in reply.chunks(chunk_size.max(1)) {
                stream.write_all(chunk).expect("Failed to write reply");
                stream.flush().expect("Failed to flush reply");
                thread::sleep(std::time::Duration::from_millis(5));
            }

            // Wait for the client to hang up
            let _ = stream.read(&mut buf);
            request
        });

        Self { addr, handle: Some(handle) }
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Bytes the client sent
    pub fn request(mut self) -> Vec<u8> {
        self.handle
            .take()
            .expect("Server already joined")
            .join()
            .expect("Scripted server panicked")
    }
}

/// Address with nothing listening on it
pub fn unused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to port 0");
    let addr = listener.local_addr().expect("Failed to get local addr");
    drop(listener);
    addr.to_string()
}
