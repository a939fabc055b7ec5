//! End-to-end client sessions against a scripted loopback SOCKS5 server

mod common;

use async_trait::async_trait;
use common::socks5_mock::*;
use common::{closed_port, spawn_scripted_server, Step};
use sockslib::config::parse_config;
use sockslib::socks::{SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE, SOCKS5_AUTH_METHOD_NONE, SOCKS5_AUTH_METHOD_PASSWORD};
use sockslib::transport::{ResolveError, Resolver};
use sockslib::{AuthMethod, ErrorCode, ReplyFraming, SessionState, Socks5Context, SocksAddr};
use std::net::{Ipv6Addr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const DEST_IP: [u8; 4] = [93, 184, 216, 34];

/// Context with the server set; tests drive `connect_server` themselves
async fn server_context(server: SocketAddr) -> Socks5Context {
    let mut ctx = Socks5Context::new();
    ctx.set_server(&server.ip().to_string(), Some(&server.port().to_string()))
        .await
        .unwrap();
    ctx
}

#[tokio::test]
async fn test_no_auth_ipv4_connect_and_relay() {
    let request = connect_ipv4(DEST_IP, 1080);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
        Step::Read(request.len()),
        Step::Write(reply_ipv4(0x00, [10, 0, 0, 9], 40000)),
        Step::Read(4),
        Step::Write(b"pong".to_vec()),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    assert_eq!(ctx.state(), SessionState::ServerSet);
    assert_eq!(ctx.server_addr(), Some(addr));

    let method = ctx.connect_server().await.unwrap();
    assert_eq!(method, AuthMethod::None);
    assert!(ctx.is_authenticated());
    assert_eq!(ctx.state(), SessionState::Authenticated);

    ctx.set_destination_ipv4("93.184.216.34", "1080").unwrap();
    assert_eq!(ctx.state(), SessionState::DestinationSet);

    let stream = ctx.connect().await.unwrap();
    stream.write_all(b"ping").await.unwrap();
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"pong");

    assert_eq!(ctx.state(), SessionState::Completed);
    assert_eq!(ctx.last_reply(), Some(0));
    assert_eq!(
        ctx.bound_addr(),
        Some(&SocksAddr::ipv4("10.0.0.9", "40000").unwrap())
    );

    ctx.close();
    let received = server.await.unwrap();
    assert_eq!(received[0], greeting());
    assert_eq!(
        received[1],
        vec![0x05, 0x01, 0x00, 0x01, 0x5D, 0xB8, 0xD8, 0x22, 0x04, 0x38]
    );
    assert_eq!(received[2], b"ping");
    assert!(received[3].is_empty());
}

#[tokio::test]
async fn test_no_auth_server_ignores_staged_credentials() {
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    ctx.set_auth("user", "pass").unwrap();
    ctx.connect_server().await.unwrap();
    assert!(ctx.is_authenticated());

    ctx.close();
    let received = server.await.unwrap();
    // Nothing follows the greeting: no sub-negotiation frame was sent.
    assert_eq!(received[0], greeting());
    assert!(received[1].is_empty());
}

#[tokio::test]
async fn test_password_auth_then_domain_connect() {
    let auth = auth_request("alice", "s3cret");
    let request = connect_domain("example.com", 443);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_PASSWORD)),
        Step::Read(auth.len()),
        Step::Write(auth_reply(0x00)),
        Step::Read(request.len()),
        Step::Write(reply_domain(0x00, "example.com", 443)),
    ])
    .await;

    let mut ctx = Socks5Context::new();
    ctx.set_auth("alice", "s3cret").unwrap();
    ctx.set_server("127.0.0.1", Some(&addr.port().to_string()))
        .await
        .unwrap();

    assert_eq!(ctx.connect_server().await.unwrap(), AuthMethod::Password);
    assert_eq!(ctx.auth_method(), Some(AuthMethod::Password));
    assert!(ctx.is_authenticated());

    ctx.set_destination_name("example.com", "443").unwrap();
    ctx.connect().await.unwrap();
    assert_eq!(
        ctx.bound_addr(),
        Some(&SocksAddr::domain("example.com", "443").unwrap())
    );

    ctx.close();
    let received = server.await.unwrap();
    assert_eq!(received[1], auth);
    assert_eq!(received[2], request);
}

#[tokio::test]
async fn test_password_rejected() {
    let auth = auth_request("alice", "wrong");
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_PASSWORD)),
        Step::Read(auth.len()),
        Step::Write(auth_reply(0x01)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    ctx.set_auth("alice", "wrong").unwrap();

    let err = ctx.connect_server().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidAuth);
    assert!(!ctx.is_authenticated());
    assert_eq!(ctx.state(), SessionState::Failed);

    // No second attempt is made on the same connection.
    ctx.close();
    let received = server.await.unwrap();
    assert!(received[2].is_empty());
}

#[tokio::test]
async fn test_password_selected_without_credentials() {
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_PASSWORD)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    let err = ctx.connect_server().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidAuth);

    ctx.close();
    let received = server.await.unwrap();
    assert!(received[1].is_empty());
}

#[tokio::test]
async fn test_no_acceptable_methods() {
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    let err = ctx.connect_server().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::AuthMethodNotSupported);
    assert_eq!(err.raw(), -9);
    assert!(!ctx.is_authenticated());

    ctx.close();
    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused_by_proxy() {
    let request = connect_ipv4(DEST_IP, 1080);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
        Step::Read(request.len()),
        Step::Write(reply_ipv4(0x05, [0, 0, 0, 0], 0)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    ctx.connect_server().await.unwrap();
    ctx.set_destination_ipv4("93.184.216.34", "1080").unwrap();

    let err = ctx.connect().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConnectionRefused);
    assert_eq!(err.raw(), -5);
    assert_eq!(ctx.last_reply(), Some(0x05));
    assert_eq!(ctx.state(), SessionState::Failed);

    // The context still owns the socket until teardown.
    assert!(ctx.stream().is_some());
    ctx.close();
    assert!(ctx.stream().is_none());
    server.await.unwrap();
}

#[tokio::test]
async fn test_unassigned_reply_status() {
    let request = connect_ipv4(DEST_IP, 80);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
        Step::Read(request.len()),
        Step::Write(reply_ipv4(0x2A, [0, 0, 0, 0], 0)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    ctx.connect_server().await.unwrap();
    ctx.set_destination_ipv4("93.184.216.34", "80").unwrap();

    let err = ctx.connect().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ServerFailure);
    assert_eq!(ctx.last_reply(), Some(0x2A));

    ctx.close();
    server.await.unwrap();
}

#[tokio::test]
async fn test_ipv6_destination_with_parsed_reply() {
    let ip = "2001:db8::10".parse::<Ipv6Addr>().unwrap();
    let request = connect_ipv6(ip.octets(), 8443);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
        Step::Read(request.len()),
        Step::Write(reply_ipv4(0x00, [198, 51, 100, 7], 50000)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    ctx.set_reply_framing(ReplyFraming::Parsed);
    ctx.connect_server().await.unwrap();
    ctx.set_destination_ipv6("2001:db8::10", "8443").unwrap();

    ctx.connect().await.unwrap();
    assert_eq!(
        ctx.bound_addr(),
        Some(&SocksAddr::ipv4("198.51.100.7", "50000").unwrap())
    );

    ctx.close();
    let received = server.await.unwrap();
    assert_eq!(received[1], request);
}

#[tokio::test]
async fn test_destination_set_before_server() {
    let request = connect_domain("internal.example", 22);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
        Step::Read(request.len()),
        Step::Write(reply_domain(0x00, "internal.example", 22)),
    ])
    .await;

    let mut ctx = Socks5Context::new();
    ctx.set_destination_name("internal.example", "22").unwrap();
    ctx.set_server("127.0.0.1", Some(&addr.port().to_string()))
        .await
        .unwrap();
    ctx.connect_server().await.unwrap();
    assert_eq!(ctx.state(), SessionState::DestinationSet);

    ctx.connect().await.unwrap();
    assert_eq!(ctx.state(), SessionState::Completed);

    ctx.close();
    server.await.unwrap();
}

#[tokio::test]
async fn test_second_connect_is_rejected() {
    let request = connect_ipv4(DEST_IP, 1080);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
        Step::Read(request.len()),
        Step::Write(reply_ipv4(0x00, [0, 0, 0, 0], 0)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    ctx.connect_server().await.unwrap();
    ctx.set_destination_ipv4("93.184.216.34", "1080").unwrap();
    ctx.connect().await.unwrap();

    let err = ctx.connect().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    ctx.close();
    let received = server.await.unwrap();
    assert!(received[2].is_empty());
}

#[tokio::test]
async fn test_server_hangs_up_during_negotiation() {
    let (addr, server) = spawn_scripted_server(vec![Step::Read(4), Step::Close]).await;

    let mut ctx = server_context(addr).await;
    let err = ctx.connect_server().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::EmptyRequestOrResponse);

    server.await.unwrap();
}

#[tokio::test]
async fn test_transport_connect_failure() {
    let addr = closed_port().await;

    let mut ctx = server_context(addr).await;
    let err = ctx.connect_server().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::SystemError);
    assert!(err.io_error().is_some());
    assert_eq!(ctx.state(), SessionState::Failed);

    // The prepared socket was consumed; there is no retry.
    let err = ctx.connect_server().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

struct FixedResolver(Vec<SocketAddr>);

#[async_trait]
impl Resolver for FixedResolver {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, ResolveError> {
        if host != "proxy.test" || port != 1080 {
            return Err(ResolveError::Unsupported);
        }
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_custom_resolver() {
    let request = connect_ipv4(DEST_IP, 1080);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
        Step::Read(request.len()),
        Step::Write(reply_ipv4(0x00, [0, 0, 0, 0], 0)),
    ])
    .await;

    let mut ctx = Socks5Context::with_resolver(Box::new(FixedResolver(vec![addr])));
    let err = ctx.set_server("other.test", None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::AddressNotSupported);

    ctx.set_server("proxy.test", None).await.unwrap();
    assert_eq!(ctx.server_candidates(), &[addr]);
    ctx.connect_server().await.unwrap();
    ctx.set_destination_ipv4("93.184.216.34", "1080").unwrap();
    ctx.connect().await.unwrap();

    ctx.close();
    server.await.unwrap();
}

#[tokio::test]
async fn test_into_stream_outlives_context() {
    let request = connect_ipv4(DEST_IP, 1080);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
        Step::Read(request.len()),
        Step::Write(reply_ipv4(0x00, [0, 0, 0, 0], 0)),
        Step::Write(b"hello".to_vec()),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    ctx.connect_server().await.unwrap();
    ctx.set_destination_ipv4("93.184.216.34", "1080").unwrap();
    ctx.connect().await.unwrap();

    let mut stream = ctx.into_stream().unwrap();
    let mut buf = [0u8; 5];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello");

    drop(stream);
    server.await.unwrap();
}

#[tokio::test]
async fn test_session_from_config() {
    let auth = auth_request("cfg-user", "cfg-pass");
    let request = connect_domain("example.org", 80);
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_PASSWORD)),
        Step::Read(auth.len()),
        Step::Write(auth_reply(0x00)),
        Step::Read(request.len()),
        Step::Write(reply_ipv4(0x00, [127, 0, 0, 1], 1)),
    ])
    .await;

    let config = parse_config(&format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[auth]
username = "cfg-user"
password = "cfg-pass"

[socks]
reply_framing = "parsed"
"#,
        addr.port()
    ))
    .unwrap();

    let mut ctx = Socks5Context::from_config(&config).await.unwrap();
    assert_eq!(ctx.reply_framing(), ReplyFraming::Parsed);
    assert!(ctx.has_credentials());

    ctx.connect_server().await.unwrap();
    ctx.set_destination_name("example.org", "80").unwrap();
    ctx.connect().await.unwrap();
    assert_eq!(
        ctx.bound_addr(),
        Some(&SocksAddr::ipv4("127.0.0.1", "1").unwrap())
    );

    ctx.close();
    let received = server.await.unwrap();
    assert_eq!(received[1], auth);
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let (addr, server) = spawn_scripted_server(vec![
        Step::Read(4),
        Step::Write(method_reply(SOCKS5_AUTH_METHOD_NONE)),
    ])
    .await;

    let mut ctx = server_context(addr).await;
    ctx.connect_server().await.unwrap();

    ctx.close();
    ctx.close();
    drop(ctx);

    server.await.unwrap();
}
