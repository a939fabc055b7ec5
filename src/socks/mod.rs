//! SOCKS5 protocol module for Sockslib
//!
//! Client side of RFC 1928 with the RFC 1929 username/password extension:
//! method negotiation, the CONNECT request and its reply. Everything here
//! works on any `AsyncRead + AsyncWrite` stream; opening the connection to
//! the proxy is the transport's job.

mod auth;
mod command;
mod consts;
mod frame;
mod types;

pub use auth::{negotiate, AuthMethod, Credentials, GREETING};
pub use command::{build_connect_request, read_reply, send_connect, ConnectReply, ReplyFraming};
pub use consts::*;
pub use frame::FrameBuf;
pub use types::{parse_port, DomainName, HostAddr, SocksAddr};
