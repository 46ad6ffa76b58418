//! Evasion Game Server
//!
//! Accepts players and spectators over TCP, pairs them into matches, and
//! prints every concluded session as JSON on shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use evasion::{Config, MatchmakingServer, VERSION};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port, overrides the configured bind address port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(port) = args.port {
        config.server.bind_addr.set_port(port);
    }

    info!("Evasion Server v{}", VERSION);
    info!(
        "Board: {}x{}, walls: {}, cooldowns: {}/{}, time limit: {} ms",
        config.game.width,
        config.game.height,
        config.game.wall_max,
        config.game.hunter_cooldown,
        config.game.prey_cooldown,
        config.game.time_limit_ms,
    );

    let server = Arc::new(MatchmakingServer::new(config.server, config.game));
    let background = server.clone();
    let mut serve = tokio::spawn(async move { background.run().await });

    tokio::select! {
        joined = &mut serve => {
            joined.context("server task panicked")??;
            warn!("Server stopped unexpectedly");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl+C")?;
            info!("Ctrl+C received, shutting down");
            server.shutdown();
            serve.await.context("server task panicked")??;
        }
    }

    let results = server.results().await;
    info!("{} session(s) concluded", results.len());
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}
