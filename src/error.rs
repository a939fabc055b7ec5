//! Error types for Sockslib
//!
//! Every library operation reports failures through [`SocksError`], which
//! always maps onto the flat [`ErrorCode`] taxonomy. The numeric values of
//! [`ErrorCode`] are stable; reply statuses 1 to 8 from a SOCKS5 server map
//! onto the members with the same value.

use std::io;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, SocksError>;

/// Flat enumeration of protocol and library error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// No error
    Ok = 0,
    /// General SOCKS server failure
    ServerFailure = 1,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 2,
    /// Network unreachable
    NetworkUnreachable = 3,
    /// Host unreachable
    HostUnreachable = 4,
    /// Connection refused
    ConnectionRefused = 5,
    /// TTL expired
    TtlExpired = 6,
    /// Command not supported
    CommandNotSupported = 7,
    /// Address type not supported
    AddressNotSupported = 8,
    /// Server selected an authentication method we do not speak
    AuthMethodNotSupported = 9,
    /// Credentials rejected or unusable
    InvalidAuth = 10,
    /// A value exceeds its protocol length limit
    ValueTooLong = 11,
    /// Allocation failure
    OutOfMemory = 12,
    /// Caller supplied an invalid argument
    InvalidArgument = 13,
    /// Peer closed the connection before a full frame arrived
    EmptyRequestOrResponse = 14,
    /// Platform call failed; the wrapped OS error has the details
    SystemError = 15,
}

const ALL_CODES: [ErrorCode; 16] = [
    ErrorCode::Ok,
    ErrorCode::ServerFailure,
    ErrorCode::ConnectionNotAllowed,
    ErrorCode::NetworkUnreachable,
    ErrorCode::HostUnreachable,
    ErrorCode::ConnectionRefused,
    ErrorCode::TtlExpired,
    ErrorCode::CommandNotSupported,
    ErrorCode::AddressNotSupported,
    ErrorCode::AuthMethodNotSupported,
    ErrorCode::InvalidAuth,
    ErrorCode::ValueTooLong,
    ErrorCode::OutOfMemory,
    ErrorCode::InvalidArgument,
    ErrorCode::EmptyRequestOrResponse,
    ErrorCode::SystemError,
];

impl ErrorCode {
    /// Look up a code by its numeric value; either sign is accepted
    pub fn from_i32(code: i32) -> Option<Self> {
        let index = usize::try_from(code.checked_abs()?).ok()?;
        ALL_CODES.get(index).copied()
    }

    /// Map a SOCKS5 CONNECT reply status onto the taxonomy
    ///
    /// Statuses 1 to 8 map one-to-one. Unassigned statuses are reported as
    /// a general server failure.
    pub fn from_reply(status: u8) -> Self {
        match status {
            0x00..=0x08 => ALL_CODES[status as usize],
            _ => ErrorCode::ServerFailure,
        }
    }

    /// Positive numeric value
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Ok => "",
            ErrorCode::ServerFailure => "SOCKS server failure",
            ErrorCode::ConnectionNotAllowed => "Connection not allowed",
            ErrorCode::NetworkUnreachable => "Network unreachable",
            ErrorCode::HostUnreachable => "Host unreachable",
            ErrorCode::ConnectionRefused => "Connection refused",
            ErrorCode::TtlExpired => "TTL expired",
            ErrorCode::CommandNotSupported => "Command not supported",
            ErrorCode::AddressNotSupported => "Address type not supported",
            ErrorCode::AuthMethodNotSupported => "Authentication method not supported",
            ErrorCode::InvalidAuth => "Invalid authentication",
            ErrorCode::ValueTooLong => "Value too long",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::InvalidArgument => "Invalid argument",
            ErrorCode::EmptyRequestOrResponse => "Empty Request/Response",
            ErrorCode::SystemError => "System error (check errno)",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Describe a numeric error code, accepting either sign
pub fn strerror(code: i32) -> &'static str {
    ErrorCode::from_i32(code)
        .map(ErrorCode::description)
        .unwrap_or("Unknown error")
}

/// Main error type for Sockslib operations
#[derive(Error, Debug)]
pub enum SocksError {
    /// Library or protocol failure
    #[error("{0}")]
    Code(ErrorCode),

    /// Transport failure reported by the platform
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SocksError {
    /// Taxonomy member for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            SocksError::Code(code) => *code,
            SocksError::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                ErrorCode::EmptyRequestOrResponse
            }
            SocksError::Io(_) => ErrorCode::SystemError,
        }
    }

    /// Negated numeric code
    pub fn raw(&self) -> i32 {
        -self.code().as_i32()
    }

    /// Underlying OS error, when there is one
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            SocksError::Io(err) => Some(err),
            SocksError::Code(_) => None,
        }
    }
}

impl From<ErrorCode> for SocksError {
    fn from(code: ErrorCode) -> Self {
        SocksError::Code(code)
    }
}
