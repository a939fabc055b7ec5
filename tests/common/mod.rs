//! Test utilities and mocks for Sockslib
//!
//! This module provides a scripted loopback SOCKS5 server and frame
//! builders shared by the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One step of a scripted server exchange
#[derive(Debug, Clone)]
pub enum Step {
    /// Read exactly this many bytes from the client and record them
    Read(usize),
    /// Write these bytes to the client
    Write(Vec<u8>),
    /// Drop the connection without reading the rest
    Close,
}

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Address nothing is listening on
pub async fn closed_port() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr
}

/// Accept one client and play `steps` against it
///
/// The handle yields every chunk read by a `Read` step. Unless the script
/// ends with `Close`, a final chunk holds whatever the client sent after
/// the script finished, up to EOF.
pub async fn spawn_scripted_server(steps: Vec<Step>) -> (SocketAddr, JoinHandle<Vec<Vec<u8>>>) {
    let (listener, addr) = create_test_listener().await;

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();

        for step in steps {
            match step {
                Step::Read(len) => {
                    let mut buf = vec![0u8; len];
                    stream.read_exact(&mut buf).await.unwrap();
                    received.push(buf);
                }
                Step::Write(bytes) => stream.write_all(&bytes).await.unwrap(),
                Step::Close => return received,
            }
        }

        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
        received.push(rest);
        received
    });

    (addr, handle)
}

/// SOCKS5 frames as a server sees or sends them
pub mod socks5_mock {
    use sockslib::socks::*;

    /// Greeting every client sends
    pub fn greeting() -> Vec<u8> {
        vec![
            SOCKS5_VERSION,
            2,
            SOCKS5_AUTH_METHOD_NONE,
            SOCKS5_AUTH_METHOD_PASSWORD,
        ]
    }

    /// Method selection reply
    pub fn method_reply(method: u8) -> Vec<u8> {
        vec![SOCKS5_VERSION, method]
    }

    /// Username/password sub-negotiation request
    pub fn auth_request(username: &str, password: &str) -> Vec<u8> {
        let mut frame = vec![SOCKS5_AUTH_VERSION, username.len() as u8];
        frame.extend_from_slice(username.as_bytes());
        frame.push(password.len() as u8);
        frame.extend_from_slice(password.as_bytes());
        frame
    }

    /// Sub-negotiation reply
    pub fn auth_reply(status: u8) -> Vec<u8> {
        vec![SOCKS5_AUTH_VERSION, status]
    }

    /// CONNECT request to an IPv4 address
    pub fn connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// CONNECT request to an IPv6 address
    pub fn connect_ipv6(ip: [u8; 16], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV6,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// CONNECT request to a domain name
    pub fn connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// CONNECT reply carrying an IPv4 bound address
    pub fn reply_ipv4(status: u8, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut reply = connect_ipv4(ip, port);
        reply[1] = status;
        reply
    }

    /// CONNECT reply carrying a domain bound address
    pub fn reply_domain(status: u8, domain: &str, port: u16) -> Vec<u8> {
        let mut reply = connect_domain(domain, port);
        reply[1] = status;
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_listener() {
        let (listener, addr) = create_test_listener().await;
        assert!(addr.port() > 0);
        drop(listener);
    }

    #[test]
    fn test_socks5_mock_connect_ipv4() {
        let cmd = socks5_mock::connect_ipv4([192, 168, 1, 1], 8080);
        assert_eq!(cmd[0], 5); // SOCKS5 version
        assert_eq!(cmd[1], 1); // CONNECT
        assert_eq!(cmd[3], 1); // IPv4
        assert_eq!(&cmd[4..8], &[192, 168, 1, 1]);
    }

    #[test]
    fn test_socks5_mock_reply_status() {
        let reply = socks5_mock::reply_ipv4(0x05, [0, 0, 0, 0], 0);
        assert_eq!(reply.len(), 10);
        assert_eq!(reply[1], 0x05);
    }
}
