//! Username/password sub-negotiation
//!
//! Client side of RFC 1929. One attempt per connection; a rejection is final.

use super::Credentials;
use crate::error::{ErrorCode, Result};
use crate::socks::consts::{SOCKS5_AUTH_STATUS_SUCCESS, SOCKS5_AUTH_VERSION};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Send the credentials and check the server's verdict
///
/// Server responds:
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
pub async fn authenticate<S>(stream: &mut S, credentials: &Credentials) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = credentials.encode_request()?;
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;
    drop(request);

    let mut response = [0u8; 2];
    stream.read_exact(&mut response).await?;

    if response[0] != SOCKS5_AUTH_VERSION {
        tracing::warn!("Unexpected auth sub-negotiation version: {}", response[0]);
    }

    if response[1] != SOCKS5_AUTH_STATUS_SUCCESS {
        tracing::debug!(
            "Server rejected credentials for user {} (status {})",
            String::from_utf8_lossy(credentials.username()),
            response[1]
        );
        return Err(ErrorCode::InvalidAuth.into());
    }

    tracing::debug!(
        "Authentication successful for user: {}",
        String::from_utf8_lossy(credentials.username())
    );
    Ok(())
}
