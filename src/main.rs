//! socks5-probe - SOCKS5 connectivity check
//!
//! Connects through a SOCKS5 proxy to one destination and reports the
//! outcome. The exit status is the library's error code (0 on success).

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use sockslib::config::{load_config, AuthConfig, ServerConfig, SocketConfig, SocksConfig};
use sockslib::{ClientConfig, ErrorCode, ReplyFraming, Socks5Context, SocksError};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroize;

/// socks5-probe - open one connection through a SOCKS5 proxy
#[derive(Parser, Debug)]
#[command(name = "socks5-probe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proxy server host (overrides the config file)
    #[arg(short, long)]
    server: Option<String>,

    /// Proxy server port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Username for proxy authentication
    #[arg(short, long, requires = "password")]
    username: Option<String>,

    /// Password for proxy authentication
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Destination as host:port, ipv4:port or [ipv6]:port
    #[arg(short, long)]
    destination: String,

    /// How to read the CONNECT reply (mirror-request, parsed)
    #[arg(long)]
    reply_framing: Option<ReplyFraming>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

/// Destination as typed on the command line
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Ipv4(String),
    Ipv6(String),
    Name(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = Args::parse();

    if let Err(e) = setup_logging(&args.log_level, args.json_log) {
        eprintln!("Failed to set up logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&mut args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(args: &mut Args) -> Result<()> {
    info!("socks5-probe v{}", sockslib::VERSION);

    let config = build_config(args);
    args.password.zeroize();
    let config = config?;
    let (target, port) = parse_destination(&args.destination)?;

    info!(
        "Using SOCKS5 server {}:{} ({} reply framing)",
        config.server.host, config.server.port, config.socks.reply_framing
    );

    let mut ctx = Socks5Context::from_config(&config).await?;
    let method = ctx.connect_server().await?;
    info!("Negotiated {}", method);

    match &target {
        Target::Ipv4(ip) => ctx.set_destination_ipv4(ip, &port)?,
        Target::Ipv6(ip) => ctx.set_destination_ipv6(ip, &port)?,
        Target::Name(name) => ctx.set_destination_name(name, &port)?,
    }

    let stream = ctx.connect().await?;
    let local = stream.local_addr().ok();
    info!("Tunnel to {} is open", args.destination);
    if let Some(local) = local {
        info!("Local endpoint: {}", local);
    }
    if let Some(bound) = ctx.bound_addr() {
        info!("Proxy bound address: {}", bound);
    }

    ctx.close();
    Ok(())
}

/// Merge the optional config file with command-line overrides
fn build_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!("Configuration loaded from: {:?}", path);
            config
        }
        None => ClientConfig {
            server: ServerConfig {
                host: String::new(),
                port: 1080,
            },
            auth: None,
            socket: SocketConfig::default(),
            socks: SocksConfig::default(),
        },
    };

    if let Some(server) = &args.server {
        config.server.host = server.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let (Some(username), Some(password)) = (&args.username, &args.password) {
        config.auth = Some(AuthConfig {
            username: username.clone(),
            password: password.clone(),
        });
    }
    if let Some(framing) = args.reply_framing {
        config.socks.reply_framing = framing;
    }

    if config.server.host.is_empty() {
        return Err(anyhow!("No SOCKS5 server given; use --server or --config"));
    }
    config.validate().map_err(|e| anyhow!(e))?;
    Ok(config)
}

/// Split `host:port`, `ipv4:port` or `[ipv6]:port`
fn parse_destination(destination: &str) -> Result<(Target, String)> {
    if let Some(rest) = destination.strip_prefix('[') {
        let (ip, port) = rest
            .split_once("]:")
            .with_context(|| format!("Invalid IPv6 destination: {}", destination))?;
        return Ok((Target::Ipv6(ip.to_string()), port.to_string()));
    }

    let (host, port) = destination
        .rsplit_once(':')
        .with_context(|| format!("Destination needs a port: {}", destination))?;
    if host.contains(':') {
        return Err(anyhow!(
            "IPv6 destinations must be bracketed: [{}]:{}",
            host,
            port
        ));
    }

    let target = if host.parse::<Ipv4Addr>().is_ok() {
        Target::Ipv4(host.to_string())
    } else {
        Target::Name(host.to_string())
    };
    Ok((target, port.to_string()))
}

/// Positive library error code for `err`; argument errors otherwise
fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<SocksError>()
        .map(SocksError::code)
        .unwrap_or(ErrorCode::InvalidArgument);
    code.as_i32() as u8
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
