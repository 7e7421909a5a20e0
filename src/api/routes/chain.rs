//! Balance, transfer and history endpoints for the active wallet

use crate::api::error::{address_error, amount_error, chain_error, wallet_error, ApiError, ApiResult};
use crate::api::server::AppState;
use crate::chain::TransferReceipt;
use crate::format::{lamports_to_sol, lamports_to_sol_decimal, parse_sol_amount};
use crate::types::{Pubkey, TransactionSummary, LAMPORTS_PER_SOL};
use crate::wallet::{WalletError, WalletKeypair, WalletManager};
use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    /// Defaults to the active wallet
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub lamports: u64,
    pub sol: f64,
    /// Exact SOL amount as a decimal string
    pub sol_exact: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct AirdropRequest {
    /// SOL amount as entered, default 1
    pub amount: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AirdropResponse {
    pub signature: String,
    pub lamports: u64,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub to: String,
    /// SOL amount as entered
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct FeeQuery {
    pub to: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeeResponse {
    pub lamports: u64,
    pub sol: f64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

async fn active_keypair(wallets: &WalletManager) -> Result<WalletKeypair, ApiError> {
    wallets
        .get_active_keypair()
        .await
        .map_err(wallet_error)?
        .ok_or_else(|| wallet_error(WalletError::NoActiveWallet))
}

async fn resolve_address(state: &AppState, address: Option<&str>) -> Result<Pubkey, ApiError> {
    match address {
        Some(addr) => addr.parse().map_err(address_error),
        None => Ok(active_keypair(&state.wallets).await?.pubkey()),
    }
}

pub async fn get_balance(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> ApiResult<BalanceResponse> {
    let address = resolve_address(&state, query.address.as_deref()).await?;
    let lamports = state.chain.get_balance(&address).await.map_err(chain_error)?;

    Ok(Json(BalanceResponse {
        address: address.to_string(),
        lamports,
        sol: lamports_to_sol(lamports),
        sol_exact: lamports_to_sol_decimal(lamports),
    }))
}

pub async fn request_airdrop(
    State(state): State<AppState>,
    body: Option<Json<AirdropRequest>>,
) -> ApiResult<AirdropResponse> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let lamports = match req.amount.as_deref() {
        Some(amount) => parse_sol_amount(amount).map_err(amount_error)?,
        None => LAMPORTS_PER_SOL,
    };

    let address = active_keypair(&state.wallets).await?.pubkey();
    let signature = state
        .chain
        .request_airdrop(&address, lamports)
        .await
        .map_err(chain_error)?;

    Ok(Json(AirdropResponse {
        signature: signature.to_string(),
        lamports,
    }))
}

pub async fn send_sol(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> ApiResult<TransferReceipt> {
    let to: Pubkey = req.to.parse().map_err(address_error)?;
    let lamports = parse_sol_amount(&req.amount).map_err(amount_error)?;
    let keypair = active_keypair(&state.wallets).await?;

    let receipt = state
        .chain
        .send_sol(&keypair, &to, lamports)
        .await
        .map_err(chain_error)?;
    Ok(Json(receipt))
}

/// Move the entire balance, minus the fee, to the null address
pub async fn clear_wallet(State(state): State<AppState>) -> ApiResult<TransferReceipt> {
    let keypair = active_keypair(&state.wallets).await?;
    let receipt = state
        .chain
        .transfer_all_to_null(&keypair)
        .await
        .map_err(chain_error)?;
    Ok(Json(receipt))
}

/// Fee for a transfer from the active wallet
pub async fn estimate_fee(
    State(state): State<AppState>,
    Query(query): Query<FeeQuery>,
) -> ApiResult<FeeResponse> {
    let from = active_keypair(&state.wallets).await?.pubkey();
    let to = match query.to.as_deref() {
        Some(addr) if !addr.is_empty() => addr.parse().map_err(address_error)?,
        _ => Pubkey::NULL,
    };
    let lamports = match query.amount.as_deref() {
        Some(amount) if !amount.is_empty() => parse_sol_amount(amount).map_err(amount_error)?,
        _ => 0,
    };

    let fee = state
        .chain
        .estimate_transfer_fee(&from, &to, lamports)
        .await
        .map_err(chain_error)?;

    Ok(Json(FeeResponse {
        lamports: fee,
        sol: lamports_to_sol(fee),
    }))
}

/// Enriched recent history of the active wallet
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<TransactionSummary>> {
    let address = active_keypair(&state.wallets).await?.pubkey();
    let limit = query.limit.unwrap_or(state.config.history_limit).clamp(1, 100);

    let rows = state
        .chain
        .get_transaction_details(&address, limit)
        .await
        .map_err(chain_error)?;
    Ok(Json(rows))
}
