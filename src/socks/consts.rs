//! SOCKS5 protocol constants
//!
//! Byte values from RFC 1928 and RFC 1929 used on the client side.

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

/// Username/password sub-negotiation version
pub const SOCKS5_AUTH_VERSION: u8 = 0x01;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// GSSAPI authentication (not implemented)
pub const SOCKS5_AUTH_METHOD_GSSAPI: u8 = 0x01;
/// Username/password authentication
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

/// Sub-negotiation status for accepted credentials
pub const SOCKS5_AUTH_STATUS_SUCCESS: u8 = 0x00;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

/// Succeeded
pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;

/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

/// Port used when the caller does not name one
pub const DEFAULT_SERVER_PORT: &str = "1080";

// Length limits
/// Maximum domain name length
pub const MAX_DOMAIN_LEN: usize = 255;
/// Maximum username or password length
pub const MAX_CREDENTIAL_LEN: usize = 255;

// Frame capacities
/// VER, NMETHODS and the two offered methods
pub const GREETING_LEN: usize = 4;
/// VER CMD RSV ATYP, a length-prefixed name and the port
pub const MAX_REQUEST_LEN: usize = 4 + 1 + MAX_DOMAIN_LEN + 2;
/// VER, ULEN, UNAME, PLEN, PASSWD
pub const MAX_AUTH_REQUEST_LEN: usize = 1 + 1 + MAX_CREDENTIAL_LEN + 1 + MAX_CREDENTIAL_LEN;
/// VER REP RSV ATYP
pub const REPLY_HEADER_LEN: usize = 4;
