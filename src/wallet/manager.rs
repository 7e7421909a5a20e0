//! Multi-wallet registry
//!
//! Wallet records live as one JSON array in the `solana_wallets` slot and the
//! active wallet id in `solana_active_wallet_id`. A wallet saved by the
//! single-wallet build (`solana_wallet_secret`) is migrated on first read.

use super::backup;
use super::error::WalletError;
use super::keypair::WalletKeypair;
use crate::db::Database;
use crate::types::WalletRecord;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const WALLETS_STORAGE_KEY: &str = "solana_wallets";
pub const ACTIVE_WALLET_KEY: &str = "solana_active_wallet_id";
pub const LEGACY_STORAGE_KEY: &str = "solana_wallet_secret";

/// Longest label the rename dialog accepts
pub const MAX_LABEL_LEN: usize = 50;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `wallet_{unix_ms}_{9 base36 chars}`
fn generate_wallet_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("wallet_{}_{}", Utc::now().timestamp_millis(), suffix)
}

fn validate_label(label: &str) -> Result<String, WalletError> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_LABEL_LEN {
        return Err(WalletError::InvalidLabel { max: MAX_LABEL_LEN });
    }
    Ok(trimmed.to_string())
}

/// Input for [`WalletManager::add_wallet`]
#[derive(Debug, Clone, Default)]
pub struct NewWallet {
    pub public_key: String,
    pub secret_key: Vec<u8>,
    pub label: Option<String>,
}

/// Partial update merged into a stored record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdate {
    pub label: Option<String>,
    pub backup_downloaded: Option<bool>,
}

/// Data accepted by import: a bare secret key array (old `wallet.json`)
/// or the `{ publicKey, secretKey }` export format.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImportData {
    SecretKey(Vec<u8>),
    #[serde(rename_all = "camelCase")]
    Exported {
        public_key: String,
        secret_key: Vec<u8>,
    },
}

impl ImportData {
    /// Parse the text of a wallet file
    pub fn parse(text: &str) -> Result<Self, WalletError> {
        serde_json::from_str(text).map_err(|_| WalletError::InvalidFormat)
    }
}

/// Body of an exported wallet file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedKey {
    pub public_key: String,
    pub secret_key: Vec<u8>,
}

/// A wallet export ready to be written out
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletExport {
    /// Suggested file name, `wallet_{label or id}.json`
    pub file_name: String,
    /// Pretty-printed JSON
    pub contents: String,
}

/// Registry of wallets held in the key-value store
pub struct WalletManager {
    db: Arc<Database>,
    /// Serializes read-modify-write cycles on the registry slot
    lock: Mutex<()>,
}

impl WalletManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            lock: Mutex::new(()),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Migrate a legacy single wallet into the registry.
    ///
    /// Returns the created record, or `None` when there was nothing to migrate.
    /// A corrupt legacy value is logged and left alone.
    pub async fn migrate_legacy_wallet(&self) -> Result<Option<WalletRecord>, WalletError> {
        let _guard = self.lock.lock().await;
        self.migrate_legacy().await
    }

    async fn migrate_legacy(&self) -> Result<Option<WalletRecord>, WalletError> {
        let Some(legacy) = self.db.get_item(LEGACY_STORAGE_KEY).await? else {
            return Ok(None);
        };

        // Already migrated, drop the leftover
        if self.db.get_item(WALLETS_STORAGE_KEY).await?.is_some() {
            self.db.remove_item(LEGACY_STORAGE_KEY).await?;
            return Ok(None);
        }

        let keypair = match serde_json::from_str::<Vec<u8>>(&legacy)
            .map_err(|_| WalletError::InvalidFormat)
            .and_then(|bytes| Ok(WalletKeypair::from_secret_key(&bytes)?))
        {
            Ok(keypair) => keypair,
            Err(e) => {
                error!("[WalletManager] Migration failed: {}", e);
                return Ok(None);
            }
        };

        let wallet = WalletRecord {
            id: generate_wallet_id(),
            public_key: keypair.pubkey().to_string(),
            secret_key: keypair.secret_key_bytes().to_vec(),
            label: "Wallet 1".to_string(),
            backup_downloaded: false,
            created_at: Utc::now().timestamp_millis(),
        };

        self.save_wallets(std::slice::from_ref(&wallet)).await?;
        self.db.set_item(ACTIVE_WALLET_KEY, &wallet.id).await?;
        self.db.remove_item(LEGACY_STORAGE_KEY).await?;

        info!("[WalletManager] Migrated legacy wallet to multi-wallet format");
        Ok(Some(wallet))
    }

    /// All wallets in insertion order
    pub async fn get_wallets(&self) -> Result<Vec<WalletRecord>, WalletError> {
        let _guard = self.lock.lock().await;
        self.load_wallets().await
    }

    async fn load_wallets(&self) -> Result<Vec<WalletRecord>, WalletError> {
        self.migrate_legacy().await?;

        let Some(data) = self.db.get_item(WALLETS_STORAGE_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<WalletRecord>>(&data) {
            Ok(wallets) => Ok(wallets),
            Err(e) => {
                error!("[WalletManager] Failed to get wallets: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn save_wallets(&self, wallets: &[WalletRecord]) -> Result<(), WalletError> {
        let json = serde_json::to_string(wallets)?;
        self.db.set_item(WALLETS_STORAGE_KEY, &json).await?;
        Ok(())
    }

    /// The active wallet. Falls back to (and persists) the first wallet
    /// when no id is stored or the stored id is stale.
    pub async fn get_active_wallet(&self) -> Result<Option<WalletRecord>, WalletError> {
        let _guard = self.lock.lock().await;
        self.active_wallet().await
    }

    async fn active_wallet(&self) -> Result<Option<WalletRecord>, WalletError> {
        let wallets = self.load_wallets().await?;
        let Some(first) = wallets.first() else {
            return Ok(None);
        };

        if let Some(active_id) = self.db.get_item(ACTIVE_WALLET_KEY).await? {
            if let Some(wallet) = wallets.iter().find(|w| w.id == active_id) {
                return Ok(Some(wallet.clone()));
            }
        }

        self.db.set_item(ACTIVE_WALLET_KEY, &first.id).await?;
        Ok(Some(first.clone()))
    }

    /// Make a wallet active. Returns `false` (and logs) for unknown ids.
    pub async fn set_active_wallet(&self, wallet_id: &str) -> Result<bool, WalletError> {
        let _guard = self.lock.lock().await;
        self.set_active(wallet_id).await
    }

    async fn set_active(&self, wallet_id: &str) -> Result<bool, WalletError> {
        let wallets = self.load_wallets().await?;
        if !wallets.iter().any(|w| w.id == wallet_id) {
            warn!("[WalletManager] Wallet not found: {}", wallet_id);
            return Ok(false);
        }

        self.db.set_item(ACTIVE_WALLET_KEY, wallet_id).await?;
        Ok(true)
    }

    /// Rebuild the keypair for a record; `None` if the stored key is unusable
    pub fn get_keypair_from_wallet(wallet: &WalletRecord) -> Option<WalletKeypair> {
        if wallet.secret_key.is_empty() {
            return None;
        }
        match WalletKeypair::from_secret_key(&wallet.secret_key) {
            Ok(keypair) => Some(keypair),
            Err(e) => {
                error!("[WalletManager] Failed to create keypair: {}", e);
                None
            }
        }
    }

    pub async fn get_active_keypair(&self) -> Result<Option<WalletKeypair>, WalletError> {
        Ok(self
            .get_active_wallet()
            .await?
            .and_then(|w| Self::get_keypair_from_wallet(&w)))
    }

    /// Add a wallet. The first wallet added becomes active.
    pub async fn add_wallet(&self, data: NewWallet) -> Result<WalletRecord, WalletError> {
        let _guard = self.lock.lock().await;
        self.add(data).await.inspect_err(|e| {
            error!("[WalletManager] Failed to add wallet: {}", e);
        })
    }

    async fn add(&self, data: NewWallet) -> Result<WalletRecord, WalletError> {
        if data.public_key.is_empty() || data.secret_key.is_empty() {
            return Err(WalletError::MissingKeys);
        }

        let keypair = WalletKeypair::from_secret_key(&data.secret_key)?;
        if keypair.pubkey().to_string() != data.public_key {
            return Err(WalletError::KeyMismatch);
        }

        let mut wallets = self.load_wallets().await?;
        if wallets.iter().any(|w| w.public_key == data.public_key) {
            return Err(WalletError::AlreadyExists);
        }

        // Imported labels are kept as found; only renames are length-checked
        let label = match data.label.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => label.to_string(),
            None => format!("Wallet {}", wallets.len() + 1),
        };

        let wallet = WalletRecord {
            id: generate_wallet_id(),
            public_key: data.public_key,
            secret_key: data.secret_key,
            label,
            backup_downloaded: false,
            created_at: Utc::now().timestamp_millis(),
        };

        wallets.push(wallet.clone());
        self.save_wallets(&wallets).await?;

        if wallets.len() == 1 {
            self.set_active(&wallet.id).await?;
        }

        info!("[WalletManager] Added wallet {} ({})", wallet.label, wallet.public_key);
        Ok(wallet)
    }

    /// Generate a fresh keypair and add it
    pub async fn create_wallet(&self, label: Option<String>) -> Result<WalletRecord, WalletError> {
        let keypair = WalletKeypair::generate();
        self.add_wallet(NewWallet {
            public_key: keypair.pubkey().to_string(),
            secret_key: keypair.secret_key_bytes().to_vec(),
            label,
        })
        .await
    }

    /// Merge `updates` into the stored record
    pub async fn update_wallet(
        &self,
        wallet_id: &str,
        updates: WalletUpdate,
    ) -> Result<WalletRecord, WalletError> {
        let _guard = self.lock.lock().await;
        self.update(wallet_id, updates).await
    }

    async fn update(&self, wallet_id: &str, updates: WalletUpdate) -> Result<WalletRecord, WalletError> {
        let mut wallets = self.load_wallets().await?;
        let wallet = wallets
            .iter_mut()
            .find(|w| w.id == wallet_id)
            .ok_or(WalletError::NotFound)?;

        if let Some(label) = updates.label {
            wallet.label = label;
        }
        if let Some(flag) = updates.backup_downloaded {
            wallet.backup_downloaded = flag;
        }
        let updated = wallet.clone();

        self.save_wallets(&wallets).await?;
        Ok(updated)
    }

    /// Rename after trimming; blank or over-long labels are rejected
    pub async fn rename_wallet(&self, wallet_id: &str, label: &str) -> Result<WalletRecord, WalletError> {
        let label = validate_label(label)?;
        self.update_wallet(
            wallet_id,
            WalletUpdate {
                label: Some(label),
                ..Default::default()
            },
        )
        .await
    }

    /// Remove a wallet.
    ///
    /// Returns the wallet that is active afterwards: the first remaining one
    /// if the removed wallet was active, `None` when the registry is now empty.
    pub async fn remove_wallet(&self, wallet_id: &str) -> Result<Option<WalletRecord>, WalletError> {
        let _guard = self.lock.lock().await;

        let wallets = self.load_wallets().await?;
        let active = self.active_wallet().await?;

        let removed = wallets
            .iter()
            .find(|w| w.id == wallet_id)
            .cloned()
            .ok_or(WalletError::NotFound)?;

        let remaining: Vec<WalletRecord> = wallets.into_iter().filter(|w| w.id != wallet_id).collect();

        backup::clear_backup_flag(&self.db, &removed.public_key).await?;
        info!("[WalletManager] Removed wallet {} ({})", removed.label, removed.public_key);

        let Some(next) = remaining.first().cloned() else {
            self.db.remove_item(WALLETS_STORAGE_KEY).await?;
            self.db.remove_item(ACTIVE_WALLET_KEY).await?;
            return Ok(None);
        };

        self.save_wallets(&remaining).await?;

        if active.as_ref().map(|w| w.id.as_str()) == Some(wallet_id) {
            self.set_active(&next.id).await?;
            return Ok(Some(next));
        }

        Ok(active)
    }

    /// Produce the backup file for a wallet and mark it as backed up
    pub async fn export_wallet(&self, wallet_id: &str) -> Result<WalletExport, WalletError> {
        let _guard = self.lock.lock().await;

        let wallets = self.load_wallets().await?;
        let wallet = wallets
            .iter()
            .find(|w| w.id == wallet_id)
            .ok_or(WalletError::NotFound)?;

        let contents = serde_json::to_string_pretty(&ExportedKey {
            public_key: wallet.public_key.clone(),
            secret_key: wallet.secret_key.clone(),
        })?;

        let stem = if wallet.label.is_empty() { &wallet.id } else { &wallet.label };
        let file_name = format!("wallet_{}.json", stem.replace(['/', '\\'], "_"));

        self.update(
            wallet_id,
            WalletUpdate {
                backup_downloaded: Some(true),
                ..Default::default()
            },
        )
        .await?;

        Ok(WalletExport { file_name, contents })
    }

    /// Import from either supported file format
    pub async fn import_wallet(
        &self,
        data: ImportData,
        label: Option<String>,
    ) -> Result<WalletRecord, WalletError> {
        let result = match data {
            ImportData::SecretKey(secret_key) => WalletKeypair::from_secret_key(&secret_key)
                .map_err(WalletError::from)
                .map(|keypair| NewWallet {
                    public_key: keypair.pubkey().to_string(),
                    secret_key,
                    label,
                }),
            ImportData::Exported { public_key, secret_key } => {
                WalletKeypair::from_secret_key(&secret_key)
                    .map_err(WalletError::from)
                    .and_then(|keypair| {
                        if keypair.pubkey().to_string() != public_key {
                            return Err(WalletError::KeyMismatch);
                        }
                        Ok(NewWallet {
                            public_key,
                            secret_key,
                            label,
                        })
                    })
            }
        };

        match result {
            Ok(new_wallet) => self.add_wallet(new_wallet).await,
            Err(e) => {
                error!("[WalletManager] Failed to import wallet: {}", e);
                Err(e)
            }
        }
    }
}
