//! Configuration module for Sockslib
//!
//! This module provides configuration types and parsing for the client.

mod client;
mod socket;

pub use client::{AuthConfig, ClientConfig, ServerConfig, SocksConfig};
pub use socket::SocketConfig;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<ClientConfig> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}
