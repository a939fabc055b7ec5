//! SOCKS5 session context
//!
//! [`Socks5Context`] owns everything one proxied connection needs: the
//! resolved server candidates, the socket, staged credentials, the
//! destination and the last reply. A session runs in a fixed order:
//!
//! 1. `set_auth` (optional) and `set_server`
//! 2. `connect_server`, which also negotiates the auth method
//! 3. one of the `set_destination_*` calls
//! 4. `connect`, which yields the tunnelled stream
//!
//! The context keeps ownership of the stream until [`Socks5Context::close`]
//! or drop, unless the caller takes it with [`Socks5Context::into_stream`].

use crate::config::ClientConfig;
use crate::error::{ErrorCode, Result, SocksError};
use crate::socks::{
    negotiate, parse_port, send_connect, AuthMethod, ConnectReply, Credentials, ReplyFraming,
    SocksAddr, DEFAULT_SERVER_PORT,
};
use crate::transport::{open_socket, PreparedSocket, Resolver, SocketOpts, SystemResolver};
use std::fmt;
use std::net::{Shutdown, SocketAddr};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Progress of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No server has been set
    Unconfigured,
    /// Server resolved and a local socket prepared
    ServerSet,
    /// Connected to the server and authenticated
    Authenticated,
    /// Authenticated with a destination staged
    DestinationSet,
    /// CONNECT request sent, reply not yet read
    RequestSent,
    /// Server accepted the CONNECT request
    Completed,
    /// A step after `set_server` failed
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unconfigured => "unconfigured",
            SessionState::ServerSet => "server set",
            SessionState::Authenticated => "authenticated",
            SessionState::DestinationSet => "destination set",
            SessionState::RequestSent => "request sent",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Client-side SOCKS5 session
pub struct Socks5Context {
    resolver: Box<dyn Resolver>,
    socket_opts: SocketOpts,
    reply_framing: ReplyFraming,
    credentials: Option<Credentials>,
    candidates: Vec<SocketAddr>,
    server_addr: Option<SocketAddr>,
    prepared: Option<PreparedSocket>,
    stream: Option<TcpStream>,
    auth_method: Option<AuthMethod>,
    authenticated: bool,
    destination: Option<SocksAddr>,
    last_reply: Option<u8>,
    bound_addr: Option<SocksAddr>,
    state: SessionState,
}

impl Socks5Context {
    /// Create an empty context using the platform resolver
    pub fn new() -> Self {
        Self::with_resolver(Box::new(SystemResolver))
    }

    /// Create an empty context that resolves the server through `resolver`
    pub fn with_resolver(resolver: Box<dyn Resolver>) -> Self {
        Socks5Context {
            resolver,
            socket_opts: SocketOpts::default(),
            reply_framing: ReplyFraming::default(),
            credentials: None,
            candidates: Vec::new(),
            server_addr: None,
            prepared: None,
            stream: None,
            auth_method: None,
            authenticated: false,
            destination: None,
            last_reply: None,
            bound_addr: None,
            state: SessionState::Unconfigured,
        }
    }

    /// Build a context from configuration and run `set_server`
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut ctx = Self::new();
        if let Some(auth) = &config.auth {
            ctx.set_auth(&auth.username, &auth.password)?;
        }
        ctx.set_socket_opts(SocketOpts::from_config(&config.socket));
        ctx.set_reply_framing(config.socks.reply_framing);

        let port = config.server.port.to_string();
        ctx.set_server(&config.server.host, Some(&port)).await?;
        Ok(ctx)
    }

    /// Stage username/password credentials
    ///
    /// Replaces (and wipes) any previously staged pair. On failure the
    /// previous pair is kept.
    pub fn set_auth(&mut self, username: &str, password: &str) -> Result<()> {
        let credentials = Credentials::new(username, password)?;
        debug!(
            "Staged credentials for user {} ({} byte password)",
            username,
            password.len()
        );
        self.credentials = Some(credentials);
        Ok(())
    }

    /// Set the options applied to the server socket before it connects
    pub fn set_socket_opts(&mut self, opts: SocketOpts) {
        self.socket_opts = opts;
    }

    /// Choose how the CONNECT reply is read
    pub fn set_reply_framing(&mut self, framing: ReplyFraming) {
        self.reply_framing = framing;
    }

    /// Resolve the proxy server and prepare a socket for it
    ///
    /// `port` defaults to 1080 when absent or empty. Candidates are tried in
    /// resolver order and the first one whose address family yields a socket
    /// is kept. Any previous server socket and candidate list are released
    /// first.
    pub async fn set_server(&mut self, host: &str, port: Option<&str>) -> Result<()> {
        if host.is_empty() {
            return Err(ErrorCode::InvalidArgument.into());
        }
        let port = match port {
            Some(port) if !port.is_empty() => port,
            _ => DEFAULT_SERVER_PORT,
        };
        let port = parse_port(port)?;

        self.release_server();
        self.state = SessionState::Unconfigured;

        let candidates = self.resolver.resolve(host, port).await.map_err(|e| {
            debug!("Failed to resolve {}:{}: {}", host, port, e);
            SocksError::from(e)
        })?;
        debug!("Resolved {}:{} to {} candidate(s)", host, port, candidates.len());

        let prepared = open_socket(&candidates).ok_or(ErrorCode::ServerFailure)?;

        self.server_addr = Some(prepared.peer());
        self.prepared = Some(prepared);
        self.candidates = candidates;
        self.state = SessionState::ServerSet;
        Ok(())
    }

    /// Connect to the server and negotiate authentication
    ///
    /// Connects to the candidate chosen by `set_server` only; there is no
    /// fallback to the others.
    pub async fn connect_server(&mut self) -> Result<AuthMethod> {
        let prepared = self.prepared.take().ok_or(ErrorCode::InvalidArgument)?;

        if let Err(e) = prepared.apply(&self.socket_opts) {
            warn!("Failed to apply socket options: {}", e);
        }

        let peer = prepared.peer();
        let stream = match prepared.connect().await {
            Ok(stream) => stream,
            Err(e) => {
                debug!("Failed to connect to SOCKS5 server {}: {}", peer, e);
                self.state = SessionState::Failed;
                return Err(e.into());
            }
        };
        let stream = self.stream.insert(stream);

        match negotiate(stream, self.credentials.as_ref()).await {
            Ok(method) => {
                info!("Connected to SOCKS5 server {} ({})", peer, method);
                self.auth_method = Some(method);
                self.authenticated = true;
                self.state = if self.destination.is_some() {
                    SessionState::DestinationSet
                } else {
                    SessionState::Authenticated
                };
                Ok(method)
            }
            Err(e) => {
                debug!("Negotiation with {} failed: {}", peer, e);
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Stage an IPv4 destination
    pub fn set_destination_ipv4(&mut self, ip: &str, port: &str) -> Result<()> {
        let destination = SocksAddr::ipv4(ip, port)?;
        self.stage_destination(destination);
        Ok(())
    }

    /// Stage an IPv6 destination
    pub fn set_destination_ipv6(&mut self, ip: &str, port: &str) -> Result<()> {
        let destination = SocksAddr::ipv6(ip, port)?;
        self.stage_destination(destination);
        Ok(())
    }

    /// Stage a domain-name destination, resolved by the proxy
    pub fn set_destination_name(&mut self, name: &str, port: &str) -> Result<()> {
        let destination = SocksAddr::domain(name, port)?;
        self.stage_destination(destination);
        Ok(())
    }

    fn stage_destination(&mut self, destination: SocksAddr) {
        debug!("Destination set to {}", destination);
        self.destination = Some(destination);
        if self.state == SessionState::Authenticated {
            self.state = SessionState::DestinationSet;
        }
    }

    /// Ask the proxy to connect to the staged destination
    ///
    /// On success returns the tunnelled stream; the context still owns it
    /// and closes it on teardown. A non-zero reply status is returned as the
    /// matching [`ErrorCode`] and recorded in [`Self::last_reply`].
    pub async fn connect(&mut self) -> Result<&mut TcpStream> {
        let destination = self
            .destination
            .as_ref()
            .ok_or(ErrorCode::AddressNotSupported)?;
        if !self.authenticated || !self.ready_for_request() {
            return Err(ErrorCode::InvalidArgument.into());
        }
        let stream = self.stream.as_mut().ok_or(ErrorCode::InvalidArgument)?;

        self.state = SessionState::RequestSent;
        let reply = match send_connect(stream, destination, self.reply_framing).await {
            Ok(reply) => reply,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e);
            }
        };

        let success = reply.is_success();
        let ConnectReply { status, bound } = reply;
        self.last_reply = Some(status);
        self.bound_addr = bound;

        if !success {
            let code = ErrorCode::from_reply(status);
            debug!("CONNECT to {} rejected: {}", destination, code);
            self.state = SessionState::Failed;
            return Err(code.into());
        }

        info!("CONNECT to {} established", destination);
        self.state = SessionState::Completed;
        self.stream
            .as_mut()
            .ok_or_else(|| SocksError::from(ErrorCode::InvalidArgument))
    }

    fn ready_for_request(&self) -> bool {
        matches!(
            self.state,
            SessionState::Authenticated | SessionState::DestinationSet
        )
    }

    /// Release the socket, the candidate list and the staged credentials
    ///
    /// Safe to call any number of times.
    pub fn close(&mut self) {
        let had_resources = self.stream.is_some() || self.prepared.is_some();
        self.release_server();
        self.credentials = None;
        self.state = SessionState::Unconfigured;
        if had_resources {
            debug!("SOCKS5 context closed");
        }
    }

    fn release_server(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = socket2::SockRef::from(&stream).shutdown(Shutdown::Both);
        }
        self.prepared = None;
        self.candidates = Vec::new();
        self.server_addr = None;
        self.auth_method = None;
        self.authenticated = false;
        self.last_reply = None;
        self.bound_addr = None;
    }

    /// Move the connected stream out of the context
    ///
    /// Teardown of the context then has no socket left to close.
    pub fn into_stream(mut self) -> Option<TcpStream> {
        self.stream.take()
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether method negotiation (and any sub-negotiation) succeeded
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Method the server selected
    pub fn auth_method(&self) -> Option<AuthMethod> {
        self.auth_method
    }

    /// Status byte of the last CONNECT reply
    pub fn last_reply(&self) -> Option<u8> {
        self.last_reply
    }

    /// Bound address from the last CONNECT reply, when it could be decoded
    pub fn bound_addr(&self) -> Option<&SocksAddr> {
        self.bound_addr.as_ref()
    }

    /// Staged destination
    pub fn destination(&self) -> Option<&SocksAddr> {
        self.destination.as_ref()
    }

    /// Candidates returned by the resolver, in resolver order
    pub fn server_candidates(&self) -> &[SocketAddr] {
        &self.candidates
    }

    /// Candidate the server socket was created for
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server_addr
    }

    /// Connected stream, if any
    pub fn stream(&self) -> Option<&TcpStream> {
        self.stream.as_ref()
    }

    /// Reply framing in use
    pub fn reply_framing(&self) -> ReplyFraming {
        self.reply_framing
    }

    /// Socket options in use
    pub fn socket_opts(&self) -> &SocketOpts {
        &self.socket_opts
    }

    /// Whether credentials are staged
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

impl Default for Socks5Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Socks5Context {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Socks5Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socks5Context")
            .field("state", &self.state)
            .field("server_addr", &self.server_addr)
            .field("auth_method", &self.auth_method)
            .field("authenticated", &self.authenticated)
            .field("destination", &self.destination)
            .field("last_reply", &self.last_reply)
            .field("reply_framing", &self.reply_framing)
            .finish_non_exhaustive()
    }
}
