//! Backup tracking and the "download your backup" reminder
//!
//! The single-wallet build kept an address → downloaded map in its own slot.
//! Registry records carry their own `backupDownloaded` flag; both are honoured.

use crate::db::Database;
use crate::types::WalletRecord;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::error;

pub const BACKUP_FLAG_KEY: &str = "solana_wallet_backup_downloaded";

async fn load_flags(db: &Database) -> Result<Option<HashMap<String, bool>>> {
    let Some(data) = db.get_item(BACKUP_FLAG_KEY).await? else {
        return Ok(Some(HashMap::new()));
    };
    match serde_json::from_str(&data) {
        Ok(map) => Ok(Some(map)),
        Err(e) => {
            error!("[Backup] Failed to read backup flags: {}", e);
            Ok(None)
        }
    }
}

/// Whether a backup was recorded for `address` in the legacy map
pub async fn has_backup_downloaded(db: &Database, address: &str) -> Result<bool> {
    if address.is_empty() {
        return Ok(false);
    }
    Ok(load_flags(db)
        .await?
        .and_then(|flags| flags.get(address).copied())
        .unwrap_or(false))
}

/// Record that `address` was backed up
pub async fn set_backup_downloaded(db: &Database, address: &str) -> Result<()> {
    if address.is_empty() {
        return Ok(());
    }
    let Some(mut flags) = load_flags(db).await? else {
        return Ok(());
    };
    flags.insert(address.to_string(), true);
    db.set_item(BACKUP_FLAG_KEY, &serde_json::to_string(&flags)?).await
}

/// Forget the flag for a removed wallet
pub async fn clear_backup_flag(db: &Database, address: &str) -> Result<()> {
    if address.is_empty() || db.get_item(BACKUP_FLAG_KEY).await?.is_none() {
        return Ok(());
    }
    let Some(mut flags) = load_flags(db).await? else {
        return Ok(());
    };
    if flags.remove(address).is_some() {
        db.set_item(BACKUP_FLAG_KEY, &serde_json::to_string(&flags)?).await?;
    }
    Ok(())
}

/// Decides whether to nag about an un-downloaded backup.
///
/// Dismissals only last for the life of the process.
#[derive(Debug, Default)]
pub struct BackupReminder {
    dismissed: RwLock<HashSet<String>>,
}

impl BackupReminder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn should_remind(&self, db: &Database, wallet: &WalletRecord) -> Result<bool> {
        if wallet.public_key.is_empty() || wallet.backup_downloaded {
            return Ok(false);
        }
        if self.dismissed.read().await.contains(&wallet.public_key) {
            return Ok(false);
        }
        Ok(!has_backup_downloaded(db, &wallet.public_key).await?)
    }

    pub async fn dismiss(&self, address: &str) {
        if address.is_empty() {
            return;
        }
        self.dismissed.write().await.insert(address.to_string());
    }
}
