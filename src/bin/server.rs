//! Solana Demo Wallet Web Server
//!
//! JSON API over the wallet registry and the configured RPC node.

use anyhow::{Context, Result};
use solana_demo_wallet::api::{create_app, AppState};
use solana_demo_wallet::Config;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Default to info for this crate; override with RUST_LOG
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,solana_demo_wallet=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║       SOLANA DEMO WALLET - WEB SERVER                        ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  RPC: {:<54} ║", config.rpc_url);
    println!("║  Database: {:<49} ║", config.database_path);
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    if !config.is_local_validator() {
        warn!(
            "RPC endpoint {} is not a local validator; keys are stored unencrypted, use test funds only",
            config.rpc_url
        );
    }

    info!("Initializing application state...");
    let state = AppState::new(config.clone()).await?;

    // Fold a pre-registry wallet in before the first request
    if let Some(migrated) = state.wallets.migrate_legacy_wallet().await? {
        info!("Migrated legacy wallet {}", migrated.public_key);
    }

    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("SERVER_HOST/SERVER_PORT do not form a valid socket address")?;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
