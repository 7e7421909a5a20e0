//! Solana RPC access
//!
//! JSON-RPC client, failure classification, retry and the transfer
//! transaction encoding.

mod client;
mod error;
mod retry;
pub mod transaction;

#[cfg(test)]
pub(crate) use client::mock;
pub use client::{
    EncodedTransaction, LatestBlockhash, LoadedAddresses, RpcClient, SignatureInfo, SignatureStatus,
    TransactionMeta, UiMessage, UiTransaction,
};
pub use error::RpcError;
pub use retry::RetryConfig;
pub use transaction::{system_transfer, Message, Transaction};
