//! Solana RPC error differentiation
//!
//! Parses JSON-RPC error objects and HTTP failures into structured types
//! for retries and user-facing messages.

use std::fmt;

/// Structured RPC error types
#[derive(Debug, Clone, PartialEq)]
pub enum RpcError {
    /// HTTP 429 or a rate-limit message from the provider
    RateLimited { retry_after_secs: Option<u64> },
    /// Node is behind or unavailable (-32005, HTTP 503)
    NodeUnhealthy,
    /// The blockhash used by the transaction is unknown to the node
    BlockhashNotFound,
    /// The blockhash expired before the transaction confirmed
    BlockhashExpired,
    /// Payer cannot cover amount plus fee
    InsufficientFunds,
    /// Malformed request (bad address, bad encoding)
    InvalidParams(String),
    /// The transaction landed but failed on chain
    TransactionFailed(String),
    /// Gave up waiting for confirmation
    Timeout,
    /// Network/connection error (timeout, DNS, etc.)
    NetworkError(String),
    /// The response could not be decoded
    InvalidResponse(String),
    /// Anything else, with the JSON-RPC code (or HTTP status)
    Unknown { code: i64, message: String },
}

impl RpcError {
    /// Classify a JSON-RPC `error` object
    pub fn from_rpc_error(code: i64, message: &str) -> Self {
        let msg_lower = message.to_lowercase();

        if msg_lower.contains("rate limit") || msg_lower.contains("too many requests") {
            return RpcError::RateLimited { retry_after_secs: None };
        }

        if code == -32005 || msg_lower.contains("node is unhealthy") || msg_lower.contains("node is behind") {
            return RpcError::NodeUnhealthy;
        }

        if msg_lower.contains("blockhash not found") {
            return RpcError::BlockhashNotFound;
        }

        if msg_lower.contains("insufficient funds")
            || msg_lower.contains("insufficient lamports")
            || msg_lower.contains("no record of a prior credit")
        {
            return RpcError::InsufficientFunds;
        }

        if code == -32602 || msg_lower.contains("invalid param") {
            return RpcError::InvalidParams(message.to_string());
        }

        RpcError::Unknown {
            code,
            message: message.to_string(),
        }
    }

    /// Classify a non-2xx HTTP response. `retry_after` is the raw header value;
    /// only the delay-seconds form is understood.
    pub fn from_http_status(status: u16, retry_after: Option<&str>, body: &str) -> Self {
        match status {
            429 => RpcError::RateLimited {
                retry_after_secs: retry_after.and_then(|v| v.trim().parse().ok()),
            },
            502..=504 => RpcError::NodeUnhealthy,
            _ => RpcError::Unknown {
                code: status as i64,
                message: body.to_string(),
            },
        }
    }

    /// Parse a network/reqwest error
    pub fn from_network_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            RpcError::NetworkError("Request timed out".to_string())
        } else if err.is_connect() {
            RpcError::NetworkError("Connection failed".to_string())
        } else if err.is_decode() {
            RpcError::InvalidResponse(err.to_string())
        } else {
            RpcError::NetworkError(err.to_string())
        }
    }

    /// Whether this error is worth retrying with exponential backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RpcError::RateLimited { .. } | RpcError::NodeUnhealthy | RpcError::NetworkError(_)
        )
    }

    /// Human-readable error message
    pub fn user_message(&self) -> String {
        match self {
            RpcError::RateLimited { .. } => "Too many requests. Please wait a moment and try again.".to_string(),
            RpcError::NodeUnhealthy => "The RPC node is unavailable or behind. Try again shortly.".to_string(),
            RpcError::BlockhashNotFound => "Blockhash not found. Please retry the transaction.".to_string(),
            RpcError::BlockhashExpired => "Transaction expired before it was confirmed.".to_string(),
            RpcError::InsufficientFunds => "Insufficient SOL to cover the amount and network fee.".to_string(),
            RpcError::InvalidParams(msg) => format!("Invalid request: {}", msg),
            RpcError::TransactionFailed(msg) => format!("Transaction failed: {}", msg),
            RpcError::Timeout => "Timed out waiting for confirmation.".to_string(),
            RpcError::NetworkError(msg) => format!("Network error: {}. Is the RPC endpoint reachable?", msg),
            RpcError::InvalidResponse(msg) => format!("Unexpected RPC response: {}", msg),
            RpcError::Unknown { code, message } => format!("RPC error {}: {}", code, message),
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for RpcError {}
