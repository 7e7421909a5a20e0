//! Errors surfaced by registry operations

use super::keypair::KeypairError;

/// Registry failures. The `Display` text is what users see.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet must have publicKey and secretKey")]
    MissingKeys,

    #[error("Wallet already exists")]
    AlreadyExists,

    #[error("Wallet not found")]
    NotFound,

    #[error("Public key does not match secret key")]
    KeyMismatch,

    #[error("Invalid wallet data format")]
    InvalidFormat,

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(#[from] KeypairError),

    #[error("Label must be 1-{max} characters")]
    InvalidLabel { max: usize },

    #[error("No active wallet")]
    NoActiveWallet,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    #[error("Failed to encode wallet data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalletError {
    /// Whether the caller sent something wrong, as opposed to storage trouble
    pub fn is_client_error(&self) -> bool {
        !matches!(self, WalletError::Storage(_) | WalletError::Serialization(_))
    }
}
