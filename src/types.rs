//! Core types for the demo wallet

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lamports in one SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Fee assumed when the node cannot price a message (one signature)
pub const DEFAULT_FEE_LAMPORTS: u64 = 5_000;

/// Smallest transfer the send form accepts (0.0001 SOL)
pub const MIN_SEND_LAMPORTS: u64 = 100_000;

/// A 32-byte ed25519 public key, shown in base58
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
    /// `11111111111111111111111111111111`, the system program. Used as the burn target.
    pub const NULL: Pubkey = Pubkey([0u8; 32]);

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self)
    }
}

/// Reasons a base58 key or signature failed to parse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseKeyError {
    #[error("invalid base58 string")]
    InvalidBase58,
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

fn decode_base58<const N: usize>(s: &str) -> Result<[u8; N], ParseKeyError> {
    let bytes = bs58::decode(s.trim())
        .into_vec()
        .map_err(|_| ParseKeyError::InvalidBase58)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ParseKeyError::WrongLength { expected: N, actual })
}

impl FromStr for Pubkey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58::<32>(s).map(Pubkey)
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 32-byte blockhash, shown in base58
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Blockhash(pub [u8; 32]);

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({})", self)
    }
}

impl FromStr for Blockhash {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58::<32>(s).map(Blockhash)
    }
}

/// A 64-byte transaction signature, shown in base58
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl FromStr for Signature {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58::<64>(s).map(Signature)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A wallet as persisted in the `solana_wallets` slot.
///
/// Field names match the JSON the browser build wrote, so existing
/// registries load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub id: String,
    /// Base58 address
    pub public_key: String,
    /// 64 bytes: 32-byte seed followed by the public key
    pub secret_key: Vec<u8>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub backup_downloaded: bool,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub created_at: i64,
}

impl WalletRecord {
    /// Label for display, falling back when the stored one is blank
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            "Unnamed Wallet"
        } else {
            &self.label
        }
    }
}

/// Direction of a transaction relative to the viewing wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    Send,
    Receive,
    Other,
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxType::Send => write!(f, "Send"),
            TxType::Receive => write!(f, "Receive"),
            TxType::Other => write!(f, "Other"),
        }
    }
}

/// Settlement status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Confirmed,
    Pending,
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Confirmed => write!(f, "Confirmed"),
            TxStatus::Pending => write!(f, "Pending"),
            TxStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// A history row enriched from the raw transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub signature: String,
    pub short_sig: String,
    pub tx_type: TxType,
    /// Net amount moved, excluding the fee
    pub amount_lamports: u64,
    pub amount_sol: f64,
    pub fee_lamports: u64,
    pub status: TxStatus,
    pub slot: Option<u64>,
    /// Unix seconds
    pub block_time: Option<i64>,
    pub timestamp: String,
    pub relative_time: String,
    /// The other side of the transfer, if one could be identified
    pub counterparty: Option<String>,
}
