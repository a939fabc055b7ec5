//! Transport module for Sockslib
//!
//! Resolves the proxy server, prepares a local socket with the configured
//! options and connects it.

mod addr;
mod tcp;

pub use addr::{ResolveError, Resolver, SystemResolver};
pub use tcp::{open_socket, PreparedSocket};

use crate::config::SocketConfig;
use std::time::Duration;

/// Socket options for configuring connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            keepalive_secs: Some(20),
            keepalive_interval: Some(8),
        }
    }
}

impl SocketOpts {
    /// Options that leave the socket as the platform created it
    pub fn none() -> Self {
        SocketOpts {
            nodelay: false,
            keepalive_secs: None,
            keepalive_interval: None,
        }
    }

    /// Create socket options from the `[socket]` config table
    pub fn from_config(config: &SocketConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: Some(config.keepalive_secs),
            keepalive_interval: Some(config.keepalive_interval),
        }
    }

    /// Apply socket options to a socket
    pub fn apply(&self, socket: &socket2::Socket) -> std::io::Result<()> {
        socket.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}
