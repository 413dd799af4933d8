//! sack: a small RESP key-value store with an append-only log.
//!
//! This is the command-line entry point: `sack start` runs the server,
//! `sack ping` checks that one is answering.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sack::protocol::{Frame, RespParser};
use sack::server::LogLevel;
use sack::{Config, Server, DEFAULT_PORT, VERSION};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sack", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the server.
    Start(StartArgs),
    /// Send PING to a running server and print the reply.
    Ping(PingArgs),
}

#[derive(Args, Debug)]
struct StartArgs {
    /// Port to listen on (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Path to a configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level: debug, verbose, notice or warning.
    #[arg(long, value_parser = parse_loglevel)]
    loglevel: Option<LogLevel>,
}

#[derive(Args, Debug)]
struct PingArgs {
    /// Server host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Optional message to echo back.
    message: Option<String>,
}

fn parse_loglevel(s: &str) -> Result<LogLevel, String> {
    LogLevel::from_name(s).ok_or_else(|| format!("unknown log level '{s}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start(args) => start(args).await,
        Command::Ping(args) => ping(args).await,
    }
}

async fn start(args: StartArgs) -> anyhow::Result<()> {
    // Load configuration
    let mut config = match args.config {
        Some(ref path) => match Config::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Error loading config file {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    // Override with CLI arguments
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(level) = args.loglevel {
        config.loglevel = level;
    }

    init_logging(&config).context("failed to initialize logging")?;

    info!("sack {} starting on {}:{}", VERSION, config.bind, config.port);

    let server = match Server::open(config) {
        Ok(server) => Arc::new(server),
        Err(e) => {
            error!("Failed to load data: {}", e);
            eprintln!("Fatal: {e}");
            std::process::exit(1);
        }
    };

    let listener = match server.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind: {}", e);
            eprintln!("Fatal: {e}");
            std::process::exit(1);
        }
    };

    // Handle shutdown signals
    let server_clone = server.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received shutdown signal");
        server_clone.shutdown();
    });

    server.serve(listener).await?;
    Ok(())
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.loglevel.as_filter()));

    if let Some(ref logfile) = config.logfile {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(logfile)
            .with_context(|| format!("cannot open log file {}", logfile.display()))?;

        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .init();
    }

    Ok(())
}

async fn ping(args: PingArgs) -> anyhow::Result<()> {
    let addr = format!("{}:{}", args.host, args.port);
    let mut stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("could not connect to {addr}"))?;

    let mut parts = vec!["PING".to_string()];
    parts.extend(args.message);
    stream.write_all(&Frame::command(&parts).to_vec()).await?;

    let mut parser = RespParser::new();
    let mut buf = [0u8; 4096];
    let reply = loop {
        if let Some(frame) = parser.parse()? {
            break frame;
        }
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            parser.finish()?;
            anyhow::bail!("server closed the connection without replying");
        }
        parser.extend(&buf[..n]);
    };

    println!("{reply}");
    if reply.is_error() {
        std::process::exit(1);
    }
    Ok(())
}
