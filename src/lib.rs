//! # Sockslib - SOCKS5 Client Library
//!
//! Sockslib opens outbound TCP connections through a SOCKS5 proxy
//! (RFC 1928), with optional username/password authentication (RFC 1929).
//! Destinations can be IPv4 or IPv6 addresses, or domain names that the
//! proxy resolves.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sockslib::Socks5Context;
//!
//! #[tokio::main]
//! async fn main() -> sockslib::Result<()> {
//!     let mut ctx = Socks5Context::new();
//!     ctx.set_auth("user", "secret")?;
//!     ctx.set_server("proxy.example.com", None).await?;
//!     ctx.connect_server().await?;
//!     ctx.set_destination_name("example.com", "80")?;
//!
//!     let stream = ctx.connect().await?;
//!     // `stream` is now tunnelled to example.com:80
//!     # let _ = stream;
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Every operation fails with a [`SocksError`] whose [`ErrorCode`] is one
//! member of a flat taxonomy. [`SocksError::raw`] gives the negated numeric
//! code and [`strerror`] describes any numeric code.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod context;
pub mod error;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, ClientConfig};
pub use context::{SessionState, Socks5Context};
pub use error::{strerror, ErrorCode, Result, SocksError};
pub use socks::{AuthMethod, ReplyFraming, SocksAddr};

/// Version of the Sockslib library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the library
pub const NAME: &str = env!("CARGO_PKG_NAME");
