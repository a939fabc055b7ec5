//! Server name resolution
//!
//! The context resolves the proxy server through a [`Resolver`], so callers
//! can substitute their own lookup. Failures are reported in a small
//! taxonomy that maps onto [`ErrorCode`].

use crate::error::{ErrorCode, SocksError};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Resolver failure kinds
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Temporary failure; a later attempt may succeed
    #[error("temporary failure in name resolution")]
    Transient,

    /// Non-recoverable failure in the resolver
    #[error("non-recoverable failure in name resolution")]
    Permanent,

    /// Resolver ran out of memory
    #[error("resolver out of memory")]
    OutOfMemory,

    /// Platform error reported by the resolver
    #[error("resolver system error: {0}")]
    System(#[source] io::Error),

    /// Resolver rejected the lookup flags
    #[error("bad resolver flags")]
    BadFlags,

    /// Name or address family cannot be resolved
    #[error("address not supported")]
    Unsupported,
}

impl ResolveError {
    /// Taxonomy member for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolveError::Transient => ErrorCode::ConnectionRefused,
            ResolveError::Permanent => ErrorCode::ServerFailure,
            ResolveError::OutOfMemory => ErrorCode::OutOfMemory,
            ResolveError::System(_) => ErrorCode::SystemError,
            ResolveError::BadFlags => ErrorCode::InvalidArgument,
            ResolveError::Unsupported => ErrorCode::AddressNotSupported,
        }
    }

    /// Classify an error returned by the platform resolver
    pub fn classify(err: io::Error) -> Self {
        if err.raw_os_error().is_some() {
            return ResolveError::System(err);
        }
        if err.kind() == io::ErrorKind::OutOfMemory {
            return ResolveError::OutOfMemory;
        }

        // std only exposes the resolver failure as text. These substrings are
        // the glibc and musl gai_strerror() messages for EAI_AGAIN, EAI_FAIL,
        // EAI_MEMORY and EAI_BADFLAGS.
        let message = err.to_string().to_ascii_lowercase();
        if message.contains("temporary failure") || message.contains("try again") {
            ResolveError::Transient
        } else if message.contains("non-recoverable") {
            ResolveError::Permanent
        } else if message.contains("memory") {
            ResolveError::OutOfMemory
        } else if message.contains("ai_flags") || message.contains("invalid flags") {
            ResolveError::BadFlags
        } else {
            ResolveError::Unsupported
        }
    }
}

impl From<ResolveError> for SocksError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::System(io) if io.kind() != io::ErrorKind::UnexpectedEof => {
                SocksError::Io(io)
            }
            other => SocksError::Code(other.code()),
        }
    }
}

/// Name resolution seam used by the context
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `host` and `port` to an ordered list of candidates
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, ResolveError>;
}

/// Resolver backed by the platform's `getaddrinfo`, via tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, ResolveError> {
        let addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(ResolveError::classify)?;
        Ok(addrs.collect())
    }
}
