//! Staged username/password credentials
//!
//! Both values are held as raw bytes with their lengths bounded to 1..=255.
//! The buffers are zeroed when the credentials are dropped, which covers both
//! replacement by a new `set_auth` and context teardown.

use crate::error::{ErrorCode, Result};
use crate::socks::consts::{MAX_AUTH_REQUEST_LEN, MAX_CREDENTIAL_LEN, SOCKS5_AUTH_VERSION};
use crate::socks::frame::FrameBuf;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Username and password for RFC 1929 authentication
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    username: Vec<u8>,
    password: Vec<u8>,
}

impl Credentials {
    /// Validate and stage a username/password pair
    pub fn new(username: &str, password: &str) -> Result<Self> {
        if username.is_empty() || password.is_empty() {
            return Err(ErrorCode::InvalidArgument.into());
        }
        if username.len() > MAX_CREDENTIAL_LEN || password.len() > MAX_CREDENTIAL_LEN {
            return Err(ErrorCode::ValueTooLong.into());
        }

        Ok(Credentials {
            username: username.as_bytes().to_vec(),
            password: password.as_bytes().to_vec(),
        })
    }

    /// Username bytes
    pub fn username(&self) -> &[u8] {
        &self.username
    }

    /// Password bytes
    pub fn password(&self) -> &[u8] {
        &self.password
    }

    /// Build the sub-negotiation request
    ///
    /// ```text
    /// +----+------+----------+------+----------+
    /// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
    /// +----+------+----------+------+----------+
    /// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
    /// +----+------+----------+------+----------+
    /// ```
    pub fn encode_request(&self) -> Result<FrameBuf<MAX_AUTH_REQUEST_LEN>> {
        let mut frame = FrameBuf::new();
        frame.push(SOCKS5_AUTH_VERSION)?;
        frame.push_len_prefixed(&self.username)?;
        frame.push_len_prefixed(&self.password)?;
        Ok(frame)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"<redacted>")
            .finish()
    }
}
