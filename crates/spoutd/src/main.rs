//! spoutd — the spout API daemon.
//!
//! Single binary wiring the HTTP surface to the built-in command set:
//! configuration file, tracing, graceful shutdown.
//!
//! # Usage
//!
//! ```text
//! spoutd serve --listen 127.0.0.1:5001 --config spoutd.toml
//! ```

mod commands;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use spout_http::{ApiServer, Handler};

use crate::commands::Registry;
use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "spoutd", about = "Spout API daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:5001")]
        listen: SocketAddr,

        /// Optional TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spoutd=debug,spout_http=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { listen, config } => serve(listen, config).await,
    }
}

async fn serve(listen: SocketAddr, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => {
            let config = DaemonConfig::from_file(path)?;
            info!(path = ?path, "configuration loaded");
            config
        }
        None => DaemonConfig::default(),
    };

    let registry = Arc::new(Registry::new());
    let handler = Handler::new(registry.clone(), registry, config.server_config());
    let server = ApiServer::bind(listen, handler).await?;

    // ── Shutdown signal ──

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    server.serve(shutdown_rx).await?;
    info!("spoutd stopped");
    Ok(())
}
