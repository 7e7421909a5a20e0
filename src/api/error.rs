//! Error responses shared by the route handlers

use crate::chain::ChainError;
use crate::format::AmountError;
use crate::types::ParseKeyError;
use crate::wallet::WalletError;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// What every handler returns on failure
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn wallet_error(err: WalletError) -> ApiError {
    let status = match &err {
        WalletError::NotFound | WalletError::NoActiveWallet => StatusCode::NOT_FOUND,
        WalletError::AlreadyExists => StatusCode::CONFLICT,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => {
            error!("[API] Wallet storage error: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err.to_string())
}

pub fn chain_error(err: ChainError) -> ApiError {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    error_response(status, err.to_string())
}

pub fn storage_error(err: anyhow::Error) -> ApiError {
    error!("[API] Storage error: {:#}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", err))
}

pub fn address_error(err: ParseKeyError) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, format!("Invalid address: {}", err))
}

pub fn amount_error(err: AmountError) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, err.to_string())
}
