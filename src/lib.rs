//! Solana Demo Wallet Library
//!
//! A wallet for Solana test networks that keeps several keypairs in a local
//! SQLite store and talks to a JSON-RPC node:
//!
//! 1. **Wallet registry**: create, import, export, rename, delete and switch
//!    between wallets, with migration from the old single-wallet format.
//!
//! 2. **Chain operations**: balance, airdrop, SOL transfers, fee estimates
//!    and a transaction history enriched with direction, amount and status.

pub mod api;
pub mod chain;
pub mod config;
pub mod db;
pub mod format;
pub mod price;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use chain::{ChainError, ChainService, TransferReceipt};
pub use config::Config;
pub use db::Database;
pub use price::PriceFeed;
pub use rpc::{RpcClient, RpcError};
pub use types::{Pubkey, Signature, TransactionSummary, TxStatus, TxType, WalletRecord};
pub use wallet::{WalletError, WalletKeypair, WalletManager};
