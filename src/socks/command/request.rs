//! SOCKS5 CONNECT request builder

use crate::error::Result;
use crate::socks::consts::*;
use crate::socks::frame::FrameBuf;
use crate::socks::types::SocksAddr;

/// Build a CONNECT request for `destination`
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub fn build_connect_request(destination: &SocksAddr) -> Result<FrameBuf<MAX_REQUEST_LEN>> {
    let mut request = FrameBuf::new();
    request.extend(&[SOCKS5_VERSION, SOCKS5_CMD_TCP_CONNECT, SOCKS5_RESERVED])?;
    destination.encode_into(&mut request)?;
    Ok(request)
}
