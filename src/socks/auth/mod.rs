//! SOCKS5 authentication module
//!
//! Handles method negotiation and, when the server asks for it,
//! username/password authentication.

mod credentials;
mod password;

pub use credentials::Credentials;

use super::consts::*;
use crate::error::{ErrorCode, Result};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Authentication method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication required
    None,
    /// Username/password authentication
    Password,
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::None => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Password => SOCKS5_AUTH_METHOD_PASSWORD,
        }
    }

    /// Parse from SOCKS5 method byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => Some(AuthMethod::None),
            SOCKS5_AUTH_METHOD_PASSWORD => Some(AuthMethod::Password),
            _ => None,
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::None => write!(f, "no authentication"),
            AuthMethod::Password => write!(f, "username/password"),
        }
    }
}

/// Client greeting, always offering both supported methods
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     |    2     |
/// +----+----------+----------+
/// ```
pub const GREETING: [u8; GREETING_LEN] = [
    SOCKS5_VERSION,
    2,
    SOCKS5_AUTH_METHOD_NONE,
    SOCKS5_AUTH_METHOD_PASSWORD,
];

/// Perform method negotiation and any required authentication
///
/// 1. Send the greeting
/// 2. Read the server's method selection
/// 3. Run the username/password sub-negotiation if selected
///
/// Returns the method the server selected once the session is
/// authenticated. `credentials` is only consulted when the server selects
/// username/password.
pub async fn negotiate<S>(stream: &mut S, credentials: Option<&Credentials>) -> Result<AuthMethod>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&GREETING).await?;
    stream.flush().await?;
    tracing::debug!("Sent method negotiation greeting");

    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await?;

    if choice[0] != SOCKS5_VERSION {
        tracing::warn!("Unexpected SOCKS version in method selection: {}", choice[0]);
    }

    let method = match AuthMethod::from_byte(choice[1]) {
        Some(method) => method,
        None => {
            tracing::debug!("Server selected unsupported method 0x{:02X}", choice[1]);
            return Err(ErrorCode::AuthMethodNotSupported.into());
        }
    };
    tracing::debug!("Server selected {}", method);

    if method == AuthMethod::Password {
        let credentials = credentials.ok_or(ErrorCode::InvalidAuth)?;
        password::authenticate(stream, credentials).await?;
    }

    Ok(method)
}
