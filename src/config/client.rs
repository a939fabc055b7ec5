//! Client configuration types
//!
//! Defines the configuration structures for a SOCKS5 client session.

use super::SocketConfig;
use crate::socks::{ReplyFraming, MAX_CREDENTIAL_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default proxy server port
fn default_server_port() -> u16 {
    1080
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    /// Proxy server to connect through
    pub server: ServerConfig,

    /// Username/password credentials, if the proxy may ask for them
    #[serde(default)]
    pub auth: Option<AuthConfig>,

    /// Socket options
    #[serde(default)]
    pub socket: SocketConfig,

    /// SOCKS5 protocol options
    #[serde(default)]
    pub socks: SocksConfig,
}

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.host.trim().is_empty() {
            return Err("Server host must not be empty".to_string());
        }
        if let Some(auth) = &self.auth {
            auth.validate()?;
        }
        Ok(())
    }
}

/// Proxy server address
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host name or IP address of the proxy
    pub host: String,

    /// Proxy port
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Username/password credentials, zeroed on drop
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuthConfig {
    /// Username for SOCKS5 auth
    pub username: String,

    /// Password for SOCKS5 auth
    pub password: String,
}

impl AuthConfig {
    /// Check both fields are usable in a sub-negotiation frame
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [("username", &self.username), ("password", &self.password)] {
            if value.is_empty() {
                return Err(format!("Auth {} must not be empty", field));
            }
            if value.len() > MAX_CREDENTIAL_LEN {
                return Err(format!(
                    "Auth {} is {} bytes, at most {} allowed",
                    field,
                    value.len(),
                    MAX_CREDENTIAL_LEN
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SOCKS5 protocol options
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SocksConfig {
    /// How the CONNECT reply is read
    #[serde(default)]
    pub reply_framing: ReplyFraming,
}
