//! Axum server setup and configuration

use crate::api::routes;
use crate::chain::ChainService;
use crate::price::PriceFeed;
use crate::rpc::RpcClient;
use crate::wallet::{BackupReminder, WalletManager};
use crate::{Config, Database};
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
    pub wallets: Arc<WalletManager>,
    /// Per-process backup reminder dismissals
    pub reminder: Arc<BackupReminder>,
    pub chain: Arc<ChainService>,
    pub price: Arc<PriceFeed>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(&config.database_path).await?;
        Self::with_database(config, Arc::new(db))
    }

    /// Build state around an already opened database
    pub fn with_database(config: Config, db: Arc<Database>) -> Result<Self> {
        let rpc = RpcClient::new(&config)?;
        let chain = ChainService::new(Arc::new(rpc), config.display_timezone);
        let price = PriceFeed::new(config.price.clone())?;

        Ok(Self {
            wallets: Arc::new(WalletManager::new(db.clone())),
            reminder: Arc::new(BackupReminder::new()),
            chain: Arc::new(chain),
            price: Arc::new(price),
            config: Arc::new(config),
            db,
        })
    }
}

/// Create the Axum application with all routes
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // API routes
    let api_routes = Router::new()
        // Wallet registry
        .route(
            "/wallets",
            get(routes::wallets::list_wallets).post(routes::wallets::create_wallet),
        )
        .route("/wallets/import", post(routes::wallets::import_wallet))
        .route("/wallets/active", get(routes::wallets::get_active_wallet))
        .route(
            "/wallets/:id",
            put(routes::wallets::rename_wallet).delete(routes::wallets::remove_wallet),
        )
        .route("/wallets/:id/activate", post(routes::wallets::activate_wallet))
        .route("/wallets/:id/export", get(routes::wallets::export_wallet))
        // Backup reminder
        .route("/backup/status", get(routes::wallets::backup_status))
        .route("/backup/dismiss", post(routes::wallets::dismiss_backup_reminder))
        // Chain
        .route("/balance", get(routes::chain::get_balance))
        .route("/airdrop", post(routes::chain::request_airdrop))
        .route("/send", post(routes::chain::send_sol))
        .route("/clear", post(routes::chain::clear_wallet))
        .route("/fee", get(routes::chain::estimate_fee))
        .route("/transactions", get(routes::chain::list_transactions))
        // Price
        .route("/price", get(routes::price::get_price))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let rpc = state.chain.rpc();
    Json(json!({
        "status": "ok",
        "rpcUrl": rpc.url(),
        "commitment": rpc.commitment(),
    }))
}
