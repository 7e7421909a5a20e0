//! Solana JSON-RPC 2.0 client

use super::error::RpcError;
use super::retry::RetryConfig;
use super::transaction::{Message, Transaction};
use crate::config::Config;
use crate::types::{Blockhash, Pubkey, Signature};
use anyhow::{Context, Result};
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Default interval between signature status polls
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// `{ context, value }` wrapper used by most account/fee methods
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

/// Result of `getLatestBlockhash`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Blockhash,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLatestBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

/// One entry of `getSignatureStatuses`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    #[serde(default)]
    pub confirmations: Option<u64>,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

/// One entry of `getSignaturesForAddress`, newest first
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

/// `getTransaction` with `json` encoding
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedTransaction {
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    pub transaction: UiTransaction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
    /// Address-table lookups of v0 transactions
    #[serde(default)]
    pub loaded_addresses: Option<LoadedAddresses>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadedAddresses {
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub readonly: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiTransaction {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: UiMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub account_keys: Vec<String>,
}

impl EncodedTransaction {
    /// Static keys followed by loaded writable then readonly keys,
    /// matching the index order of `preBalances`/`postBalances`
    pub fn account_keys(&self) -> Vec<String> {
        let mut keys = self.transaction.message.account_keys.clone();
        if let Some(loaded) = self.meta.as_ref().and_then(|m| m.loaded_addresses.as_ref()) {
            keys.extend(loaded.writable.iter().cloned());
            keys.extend(loaded.readonly.iter().cloned());
        }
        keys
    }
}

fn commitment_rank(level: &str) -> u8 {
    match level {
        "processed" => 0,
        "confirmed" => 1,
        "finalized" => 2,
        _ => 1,
    }
}

/// JSON-RPC client bound to one endpoint and commitment
pub struct RpcClient {
    client: Client,
    url: String,
    commitment: String,
    send_max_retries: u32,
    confirm_timeout: Duration,
    poll_interval: Duration,
    retry: RetryConfig,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: config.rpc_url.clone(),
            commitment: config.commitment.clone(),
            send_max_retries: config.send_max_retries,
            confirm_timeout: Duration::from_secs(config.confirm_timeout_seconds),
            poll_interval: CONFIRM_POLL_INTERVAL,
            retry: RetryConfig::default(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Override backoff for read calls
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the status poll interval used while confirming
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Single attempt, no retry
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        self.request(method, self.next_request_id(), &params).await
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, id: u64, params: &Value) -> Result<T, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("[RPC] {} #{}", method, id);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::from_network_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let text = response.text().await.unwrap_or_default();
            return Err(RpcError::from_http_status(status.as_u16(), retry_after.as_deref(), &text));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        if let Some(err) = envelope.error {
            return Err(RpcError::from_rpc_error(err.code, &err.message));
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .map_err(|e| RpcError::InvalidResponse(format!("{}: {}", method, e)))
    }

    /// Read-only call, resent on the `RetryConfig` schedule. Each attempt gets a fresh id.
    async fn call_with_retry<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let mut failures = 0;

        loop {
            let id = self.next_request_id();
            let err = match self.request(method, id, &params).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            failures += 1;

            match self.retry.delay_after(failures, &err) {
                Some(wait) => {
                    debug!(
                        "[RPC] {} #{} failed ({}), retry {}/{} in {}ms",
                        method,
                        id,
                        err,
                        failures,
                        self.retry.max_retries,
                        wait.as_millis()
                    );
                    sleep(wait).await;
                }
                None => {
                    if err.is_retryable() {
                        warn!("[RPC] {} #{} gave up after {} attempts: {}", method, id, failures, err);
                    }
                    return Err(err);
                }
            }
        }
    }

    fn commitment_config(&self) -> Value {
        json!({ "commitment": self.commitment })
    }

    /// Balance in lamports
    pub async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
        let res: WithContext<u64> = self
            .call_with_retry("getBalance", json!([address.to_string(), self.commitment_config()]))
            .await?;
        Ok(res.value)
    }

    /// Ask a test validator or devnet faucet for lamports
    pub async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature, RpcError> {
        let sig: String = self
            .call("requestAirdrop", json!([address.to_string(), lamports, self.commitment_config()]))
            .await?;
        parse_signature(&sig)
    }

    pub async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, RpcError> {
        let res: WithContext<RawLatestBlockhash> = self
            .call_with_retry("getLatestBlockhash", json!([self.commitment_config()]))
            .await?;
        let blockhash = res
            .value
            .blockhash
            .parse()
            .map_err(|e| RpcError::InvalidResponse(format!("blockhash: {}", e)))?;
        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height: res.value.last_valid_block_height,
        })
    }

    /// Fee for a compiled message; `None` when the node no longer knows its blockhash
    pub async fn get_fee_for_message(&self, message: &Message) -> Result<Option<u64>, RpcError> {
        let res: WithContext<Option<u64>> = self
            .call_with_retry("getFeeForMessage", json!([message.to_base64(), self.commitment_config()]))
            .await?;
        Ok(res.value)
    }

    /// Submit a signed transaction. Not retried here; the node retries up to `maxRetries`.
    pub async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let sig: String = self
            .call(
                "sendTransaction",
                json!([
                    transaction.to_base64(),
                    {
                        "encoding": "base64",
                        "preflightCommitment": self.commitment,
                        "maxRetries": self.send_max_retries,
                    }
                ]),
            )
            .await?;
        parse_signature(&sig)
    }

    pub async fn get_signature_statuses(&self, signatures: &[String]) -> Result<Vec<Option<SignatureStatus>>, RpcError> {
        let res: WithContext<Vec<Option<SignatureStatus>>> = self
            .call_with_retry(
                "getSignatureStatuses",
                json!([signatures, { "searchTransactionHistory": true }]),
            )
            .await?;
        Ok(res.value)
    }

    pub async fn get_block_height(&self) -> Result<u64, RpcError> {
        self.call_with_retry("getBlockHeight", json!([self.commitment_config()]))
            .await
    }

    /// Most recent signatures touching `address`, newest first
    pub async fn get_signatures_for_address(&self, address: &Pubkey, limit: usize) -> Result<Vec<SignatureInfo>, RpcError> {
        self.call_with_retry(
            "getSignaturesForAddress",
            json!([address.to_string(), { "limit": limit, "commitment": self.commitment }]),
        )
        .await
    }

    /// `None` when the node has no record of the signature yet
    pub async fn get_transaction(&self, signature: &str) -> Result<Option<EncodedTransaction>, RpcError> {
        self.call_with_retry(
            "getTransaction",
            json!([
                signature,
                {
                    "encoding": "json",
                    "commitment": self.commitment,
                    "maxSupportedTransactionVersion": 0,
                }
            ]),
        )
        .await
    }

    /// Poll until the signature reaches the configured commitment.
    ///
    /// Fails with `BlockhashExpired` once the chain passes
    /// `last_valid_block_height`, and with `Timeout` after the configured wait.
    pub async fn confirm_transaction(&self, signature: &Signature, last_valid_block_height: u64) -> Result<(), RpcError> {
        let deadline = Instant::now() + self.confirm_timeout;
        let target = commitment_rank(&self.commitment);
        let sig = signature.to_string();

        loop {
            let statuses = self.get_signature_statuses(std::slice::from_ref(&sig)).await?;

            if let Some(Some(status)) = statuses.first() {
                if let Some(err) = &status.err {
                    warn!("[RPC] Transaction {} failed: {}", sig, err);
                    return Err(RpcError::TransactionFailed(err.to_string()));
                }
                let reached = status
                    .confirmation_status
                    .as_deref()
                    .map(commitment_rank)
                    .unwrap_or(0);
                if reached >= target {
                    info!("[RPC] Transaction {} confirmed at slot {}", sig, status.slot);
                    return Ok(());
                }
            }

            let height = self.get_block_height().await?;
            if height > last_valid_block_height {
                return Err(RpcError::BlockhashExpired);
            }

            if Instant::now() >= deadline {
                return Err(RpcError::Timeout);
            }

            sleep(self.poll_interval).await;
        }
    }
}

fn parse_signature(s: &str) -> Result<Signature, RpcError> {
    s.parse()
        .map_err(|e| RpcError::InvalidResponse(format!("signature {}: {}", s, e)))
}
