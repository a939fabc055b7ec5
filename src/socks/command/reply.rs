//! SOCKS5 CONNECT reply reader
//!
//! Two framings are supported. `MirrorRequest` reads exactly as many bytes
//! as the request that was sent. That is only correct when BND.ADDR has the
//! same type and length as DST.ADDR, and it is kept as the default for
//! compatibility. `Parsed` reads the fixed header and then the tail that the
//! reply's own ATYP calls for.

use crate::error::Result;
use crate::socks::consts::*;
use crate::socks::types::SocksAddr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt};

/// How the CONNECT reply is framed on read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyFraming {
    /// Read as many bytes as the request
    #[default]
    MirrorRequest,
    /// Read the header, then the tail selected by the reply's ATYP
    Parsed,
}

impl FromStr for ReplyFraming {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mirror-request" => Ok(ReplyFraming::MirrorRequest),
            "parsed" => Ok(ReplyFraming::Parsed),
            other => Err(format!(
                "unknown reply framing '{}', expected 'mirror-request' or 'parsed'",
                other
            )),
        }
    }
}

impl fmt::Display for ReplyFraming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyFraming::MirrorRequest => write!(f, "mirror-request"),
            ReplyFraming::Parsed => write!(f, "parsed"),
        }
    }
}

/// Decoded CONNECT reply
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectReply {
    /// REP status byte
    pub status: u8,
    /// BND.ADDR and BND.PORT when they could be decoded
    pub bound: Option<SocksAddr>,
}

impl ConnectReply {
    /// Whether the server reported success
    pub fn is_success(&self) -> bool {
        self.status == SOCKS5_REPLY_SUCCEEDED
    }
}

/// Read the reply to a CONNECT request of `request_len` bytes
pub async fn read_reply<S>(
    stream: &mut S,
    framing: ReplyFraming,
    request_len: usize,
) -> Result<ConnectReply>
where
    S: AsyncRead + Unpin,
{
    match framing {
        ReplyFraming::MirrorRequest => read_mirrored(stream, request_len).await,
        ReplyFraming::Parsed => read_parsed(stream).await,
    }
}

async fn read_mirrored<S>(stream: &mut S, request_len: usize) -> Result<ConnectReply>
where
    S: AsyncRead + Unpin,
{
    let len = request_len.clamp(REPLY_HEADER_LEN, MAX_REQUEST_LEN);
    let mut buf = [0u8; MAX_REQUEST_LEN];
    stream.read_exact(&mut buf[..len]).await?;
    check_version(buf[0]);

    // BND is only trusted when it accounts for exactly the bytes read.
    let bound = SocksAddr::decode(buf[3], &buf[REPLY_HEADER_LEN..len])
        .ok()
        .filter(|(_, used)| REPLY_HEADER_LEN + used == len)
        .map(|(addr, _)| addr);

    Ok(ConnectReply {
        status: buf[1],
        bound,
    })
}

async fn read_parsed<S>(stream: &mut S) -> Result<ConnectReply>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; REPLY_HEADER_LEN];
    stream.read_exact(&mut header).await?;
    check_version(header[0]);

    let status = header[1];
    let bound = match SocksAddr::read_from(stream, header[3]).await {
        Ok(addr) => Some(addr),
        // A failure status is still meaningful without its BND fields.
        Err(_) if status != SOCKS5_REPLY_SUCCEEDED => None,
        Err(err) => return Err(err),
    };

    Ok(ConnectReply { status, bound })
}

fn check_version(version: u8) {
    if version != SOCKS5_VERSION {
        tracing::warn!("Unexpected SOCKS version in reply: {}", version);
    }
}
