//! Fixed-capacity frame buffer
//!
//! Outgoing SOCKS5 frames are assembled in a stack buffer sized for the
//! protocol's worst case. Every write is bounds-checked and the contents are
//! wiped when the buffer is dropped, since auth frames carry the password.

use crate::error::{ErrorCode, Result};
use zeroize::Zeroize;

/// Bounded frame builder with capacity `N`
pub struct FrameBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> FrameBuf<N> {
    /// Create an empty frame
    pub fn new() -> Self {
        FrameBuf { buf: [0u8; N], len: 0 }
    }

    /// Append a single byte
    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.extend(&[byte])
    }

    /// Append a byte slice
    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self
            .len
            .checked_add(bytes.len())
            .filter(|end| *end <= N)
            .ok_or(ErrorCode::ValueTooLong)?;
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Append a one-byte length followed by `bytes`
    pub fn push_len_prefixed(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u8::try_from(bytes.len()).map_err(|_| ErrorCode::ValueTooLong)?;
        if self.len + 1 + bytes.len() > N {
            return Err(ErrorCode::ValueTooLong.into());
        }
        self.push(len)?;
        self.extend(bytes)
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of bytes written
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total capacity
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for FrameBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Zeroize for FrameBuf<N> {
    fn zeroize(&mut self) {
        self.buf[..self.len].zeroize();
        self.len = 0;
    }
}

impl<const N: usize> Drop for FrameBuf<N> {
    fn drop(&mut self) {
        self.zeroize();
    }
}
