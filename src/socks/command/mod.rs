//! SOCKS5 CONNECT exchange
//!
//! Builds and sends the CONNECT request, then reads the reply.

mod reply;
mod request;

pub use reply::{read_reply, ConnectReply, ReplyFraming};
pub use request::build_connect_request;

use super::types::SocksAddr;
use crate::error::Result;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Send a CONNECT request for `destination` and read the reply
///
/// A non-zero reply status is returned as data, not as an error; mapping
/// it onto the error taxonomy is the caller's decision.
pub async fn send_connect<S>(
    stream: &mut S,
    destination: &SocksAddr,
    framing: ReplyFraming,
) -> Result<ConnectReply>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = build_connect_request(destination)?;
    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;
    tracing::debug!("Sent CONNECT request for {}", destination);

    let reply = read_reply(stream, framing, request.len()).await?;
    tracing::debug!("CONNECT reply status: {}", reply.status);

    Ok(reply)
}
