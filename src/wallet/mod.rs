//! Wallet management module
//!
//! Keypairs, the multi-wallet registry and backup tracking.

pub mod backup;
mod error;
mod keypair;
pub mod manager;

pub use backup::BackupReminder;
pub use error::WalletError;
pub use keypair::{KeypairError, WalletKeypair, KEYPAIR_LENGTH};
pub use manager::{ExportedKey, ImportData, NewWallet, WalletExport, WalletManager, WalletUpdate};
