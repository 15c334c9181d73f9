//! Chatroom Server
//!
//! Run with: cargo run --bin chatroom
//!
//! # Configuration
//!
//! Settings come from `--config <file>` or the default locations
//! (`~/.config/chatroom/config.toml`, `/etc/chatroom/config.toml`,
//! `./config.toml`), then environment variables:
//! - `CHATROOM_HOST`: Host to bind to (default: 0.0.0.0)
//! - `CHATROOM_PORT`: Port to listen on (default: 8080)
//! - `CHATROOM_DEFAULT_ROOM`: Room created at startup (default: general)
//! - `CHATROOM_DEFAULT_ROOM_CAPACITY`: Its capacity (default: 100)
//! - `CHATROOM_ENFORCE_CAPACITY`: Reject joins to full rooms (default: true)
//! - `CHATROOM_LOG_LEVEL` / `CHATROOM_LOG_FORMAT`: Logging (default: info / pretty)
//! - `RUST_LOG`: Overrides the log filter entirely

use chatroom::api::{serve, AppState};
use chatroom::config::{generate_default_config, Config, LoggingConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chatroom")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time room-based chat server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    init_tracing(&config.logging);

    tracing::info!("Starting Chatroom server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Default room: {} (capacity {})",
        config.chat.default_room,
        config.chat.default_room_capacity
    );
    tracing::info!("Capacity enforcement: {}", config.chat.enforce_capacity);

    let state = AppState::initialize(config).await?;

    serve(state).await?;

    tracing::info!("Chatroom server stopped");
    Ok(())
}

/// Initialize tracing from the logging config
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("chatroom={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
