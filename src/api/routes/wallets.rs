//! Wallet registry endpoints

use crate::api::error::{error_response, storage_error, wallet_error, ApiResult};
use crate::api::server::AppState;
use crate::types::WalletRecord;
use crate::wallet::{ImportData, WalletError, WalletExport};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A wallet as the API shows it. The secret key never leaves through here;
/// use the export endpoint for that.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub id: String,
    pub public_key: String,
    pub label: String,
    pub backup_downloaded: bool,
    pub created_at: i64,
    pub is_active: bool,
}

impl WalletView {
    fn new(wallet: &WalletRecord, active_id: Option<&str>) -> Self {
        Self {
            id: wallet.id.clone(),
            public_key: wallet.public_key.clone(),
            label: wallet.display_label().to_string(),
            backup_downloaded: wallet.backup_downloaded,
            created_at: wallet.created_at,
            is_active: active_id == Some(wallet.id.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WalletListResponse {
    pub wallets: Vec<WalletView>,
}

/// Response of operations that may change the active wallet
#[derive(Debug, Serialize)]
pub struct ActiveWalletResponse {
    pub active: Option<WalletView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateWalletRequest {
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportWalletRequest {
    /// A secret key array or `{ publicKey, secretKey }`
    pub data: Value,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameWalletRequest {
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatusResponse {
    pub address: Option<String>,
    pub should_remind: bool,
}

/// List all wallets in registry order
pub async fn list_wallets(State(state): State<AppState>) -> ApiResult<WalletListResponse> {
    let wallets = state.wallets.get_wallets().await.map_err(wallet_error)?;
    let active = state.wallets.get_active_wallet().await.map_err(wallet_error)?;
    let active_id = active.as_ref().map(|w| w.id.as_str());

    Ok(Json(WalletListResponse {
        wallets: wallets.iter().map(|w| WalletView::new(w, active_id)).collect(),
    }))
}

/// Generate a new keypair and add it to the registry
pub async fn create_wallet(
    State(state): State<AppState>,
    body: Option<Json<CreateWalletRequest>>,
) -> ApiResult<WalletView> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let wallet = state.wallets.create_wallet(req.label).await.map_err(wallet_error)?;
    let active = state.wallets.get_active_wallet().await.map_err(wallet_error)?;

    Ok(Json(WalletView::new(&wallet, active.as_ref().map(|w| w.id.as_str()))))
}

/// Import a wallet file
pub async fn import_wallet(
    State(state): State<AppState>,
    Json(req): Json<ImportWalletRequest>,
) -> ApiResult<WalletView> {
    let data: ImportData = serde_json::from_value(req.data)
        .map_err(|_| wallet_error(WalletError::InvalidFormat))?;
    let wallet = state
        .wallets
        .import_wallet(data, req.label)
        .await
        .map_err(wallet_error)?;
    let active = state.wallets.get_active_wallet().await.map_err(wallet_error)?;

    Ok(Json(WalletView::new(&wallet, active.as_ref().map(|w| w.id.as_str()))))
}

pub async fn get_active_wallet(State(state): State<AppState>) -> ApiResult<ActiveWalletResponse> {
    let active = state.wallets.get_active_wallet().await.map_err(wallet_error)?;
    Ok(Json(ActiveWalletResponse {
        active: active.as_ref().map(|w| WalletView::new(w, Some(w.id.as_str()))),
    }))
}

pub async fn rename_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameWalletRequest>,
) -> ApiResult<WalletView> {
    let wallet = state
        .wallets
        .rename_wallet(&id, &req.label)
        .await
        .map_err(wallet_error)?;
    let active = state.wallets.get_active_wallet().await.map_err(wallet_error)?;

    Ok(Json(WalletView::new(&wallet, active.as_ref().map(|w| w.id.as_str()))))
}

/// Delete a wallet; responds with whichever wallet is active afterwards
pub async fn remove_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ActiveWalletResponse> {
    let active = state.wallets.remove_wallet(&id).await.map_err(wallet_error)?;
    Ok(Json(ActiveWalletResponse {
        active: active.as_ref().map(|w| WalletView::new(w, Some(w.id.as_str()))),
    }))
}

pub async fn activate_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ActiveWalletResponse> {
    if !state.wallets.set_active_wallet(&id).await.map_err(wallet_error)? {
        return Err(wallet_error(WalletError::NotFound));
    }
    get_active_wallet(State(state)).await
}

/// Backup file for a wallet; marks it as backed up
pub async fn export_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<WalletExport> {
    let export = state.wallets.export_wallet(&id).await.map_err(wallet_error)?;
    Ok(Json(export))
}

/// Whether to show the backup reminder for the active wallet
pub async fn backup_status(State(state): State<AppState>) -> ApiResult<BackupStatusResponse> {
    let Some(active) = state.wallets.get_active_wallet().await.map_err(wallet_error)? else {
        return Ok(Json(BackupStatusResponse {
            address: None,
            should_remind: false,
        }));
    };

    let should_remind = state
        .reminder
        .should_remind(&state.db, &active)
        .await
        .map_err(storage_error)?;

    Ok(Json(BackupStatusResponse {
        address: Some(active.public_key),
        should_remind,
    }))
}

/// Hide the reminder for the active wallet until the server restarts
pub async fn dismiss_backup_reminder(State(state): State<AppState>) -> ApiResult<BackupStatusResponse> {
    let active = state
        .wallets
        .get_active_wallet()
        .await
        .map_err(wallet_error)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, WalletError::NoActiveWallet.to_string()))?;

    state.reminder.dismiss(&active.public_key).await;

    Ok(Json(BackupStatusResponse {
        address: Some(active.public_key),
        should_remind: false,
    }))
}
