//! Wallet operations against the chain
//!
//! Balance, airdrop, transfers, fee estimation and enriched history on top
//! of [`RpcClient`].

use crate::format::{format_relative_timestamp, format_sol, format_timestamp, lamports_to_sol, short_signature};
use crate::rpc::{system_transfer, EncodedTransaction, Message, RpcClient, RpcError, SignatureInfo, Transaction};
use crate::types::{
    Blockhash, Pubkey, Signature, TransactionSummary, TxStatus, TxType, DEFAULT_FEE_LAMPORTS, MIN_SEND_LAMPORTS,
};
use crate::wallet::WalletKeypair;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Failures of wallet-level chain operations
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// An RPC step of `operation` failed
    #[error("{operation} failed: {source}")]
    Rpc {
        operation: &'static str,
        #[source]
        source: RpcError,
    },
    #[error("Minimum amount is {}", sol(.minimum))]
    AmountTooSmall { minimum: u64 },
    #[error("Insufficient balance: need {} (amount + fee), have {}", sol(.needed), sol(.available))]
    InsufficientBalance { needed: u64, available: u64 },
    #[error("Nothing to clear")]
    NothingToClear,
}

impl ChainError {
    /// Caused by the request rather than the node
    pub fn is_client_error(&self) -> bool {
        match self {
            ChainError::Rpc { source, .. } => matches!(
                source,
                RpcError::InsufficientFunds | RpcError::InvalidParams(_)
            ),
            _ => true,
        }
    }
}

fn sol(lamports: &u64) -> String {
    format_sol(*lamports)
}

fn failed(operation: &'static str) -> impl FnOnce(RpcError) -> ChainError {
    move |source| ChainError::Rpc { operation, source }
}

/// A submitted and confirmed transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub signature: String,
    pub lamports: u64,
    pub fee_lamports: u64,
}

/// Chain operations for one RPC endpoint
pub struct ChainService {
    rpc: Arc<RpcClient>,
    zone: Option<Tz>,
}

impl ChainService {
    pub fn new(rpc: Arc<RpcClient>, zone: Option<Tz>) -> Self {
        Self { rpc, zone }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Balance in lamports
    pub async fn get_balance(&self, address: &Pubkey) -> Result<u64, ChainError> {
        self.rpc.get_balance(address).await.map_err(failed("getBalance"))
    }

    /// Airdrop and wait for confirmation
    pub async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature, ChainError> {
        let op = "requestAirdrop";
        let signature = self.rpc.request_airdrop(address, lamports).await.map_err(failed(op))?;
        let latest = self.rpc.get_latest_blockhash().await.map_err(failed(op))?;

        self.rpc
            .confirm_transaction(&signature, latest.last_valid_block_height)
            .await
            .map_err(failed(op))?;

        info!("[Chain] Airdropped {} to {}", format_sol(lamports), address);
        Ok(signature)
    }

    fn transfer_message(from: &Pubkey, to: &Pubkey, lamports: u64, blockhash: Blockhash) -> Message {
        Message::new(&[system_transfer(from, to, lamports)], from, blockhash)
    }

    async fn fee_for(&self, op: &'static str, message: &Message) -> Result<u64, ChainError> {
        let fee = self.rpc.get_fee_for_message(message).await.map_err(failed(op))?;
        Ok(fee.unwrap_or_else(|| {
            debug!("[Chain] Node returned no fee, assuming {}", DEFAULT_FEE_LAMPORTS);
            DEFAULT_FEE_LAMPORTS
        }))
    }

    /// Network fee for a transfer, priced against the latest blockhash
    pub async fn estimate_transfer_fee(&self, from: &Pubkey, to: &Pubkey, lamports: u64) -> Result<u64, ChainError> {
        let op = "estimateTransferFee";
        let latest = self.rpc.get_latest_blockhash().await.map_err(failed(op))?;
        let message = Self::transfer_message(from, to, lamports, latest.blockhash);
        self.fee_for(op, &message).await
    }

    /// Sign, submit and confirm a prepared message
    async fn submit(
        &self,
        op: &'static str,
        payer: &WalletKeypair,
        message: Message,
        last_valid_block_height: u64,
    ) -> Result<Signature, ChainError> {
        let transaction = Transaction::new_signed(message, payer);
        let signature = self.rpc.send_transaction(&transaction).await.map_err(failed(op))?;

        debug!("[Chain] Submitted {}", signature);

        self.rpc
            .confirm_transaction(&signature, last_valid_block_height)
            .await
            .map_err(failed(op))?;

        Ok(signature)
    }

    /// Transfer `lamports` from the keypair's account to `to`
    pub async fn send_sol(&self, from: &WalletKeypair, to: &Pubkey, lamports: u64) -> Result<TransferReceipt, ChainError> {
        let op = "sendSol";
        if lamports < MIN_SEND_LAMPORTS {
            return Err(ChainError::AmountTooSmall {
                minimum: MIN_SEND_LAMPORTS,
            });
        }

        let payer = from.pubkey();
        let balance = self.rpc.get_balance(&payer).await.map_err(failed(op))?;

        let latest = self.rpc.get_latest_blockhash().await.map_err(failed(op))?;
        let message = Self::transfer_message(&payer, to, lamports, latest.blockhash);
        let fee = self.fee_for(op, &message).await?;

        let needed = lamports.saturating_add(fee);
        if balance < needed {
            return Err(ChainError::InsufficientBalance {
                needed,
                available: balance,
            });
        }

        let signature = self.submit(op, from, message, latest.last_valid_block_height).await?;
        info!("[Chain] Sent {} from {} to {} ({})", format_sol(lamports), payer, to, signature);

        Ok(TransferReceipt {
            signature: signature.to_string(),
            lamports,
            fee_lamports: fee,
        })
    }

    /// Send the whole balance, minus the fee, to the null address
    pub async fn transfer_all_to_null(&self, from: &WalletKeypair) -> Result<TransferReceipt, ChainError> {
        let op = "transferAllToNull";
        let payer = from.pubkey();
        let balance = self.rpc.get_balance(&payer).await.map_err(failed(op))?;
        if balance == 0 {
            return Err(ChainError::NothingToClear);
        }

        let latest = self.rpc.get_latest_blockhash().await.map_err(failed(op))?;
        let probe = Self::transfer_message(&payer, &Pubkey::NULL, balance, latest.blockhash);
        let fee = self.fee_for(op, &probe).await?;

        let amount = balance.saturating_sub(fee);
        if amount == 0 {
            return Err(ChainError::NothingToClear);
        }

        let message = Self::transfer_message(&payer, &Pubkey::NULL, amount, latest.blockhash);
        let signature = self.submit(op, from, message, latest.last_valid_block_height).await?;
        info!("[Chain] Cleared {} from {} ({})", format_sol(amount), payer, signature);

        Ok(TransferReceipt {
            signature: signature.to_string(),
            lamports: amount,
            fee_lamports: fee,
        })
    }

    /// Most recent signatures for the address, newest first
    pub async fn get_recent_transactions(&self, address: &Pubkey, limit: usize) -> Result<Vec<String>, ChainError> {
        let infos = self
            .rpc
            .get_signatures_for_address(address, limit)
            .await
            .map_err(failed("getRecentTransactions"))?;
        Ok(infos.into_iter().map(|info| info.signature).collect())
    }

    /// Recent history with direction, amount, fee and status worked out.
    ///
    /// Only the signature listing is fatal. A transaction that cannot be
    /// fetched is shown like one the node has not indexed yet.
    pub async fn get_transaction_details(&self, address: &Pubkey, limit: usize) -> Result<Vec<TransactionSummary>, ChainError> {
        let infos = self
            .rpc
            .get_signatures_for_address(address, limit)
            .await
            .map_err(failed("getTransactionDetails"))?;

        let fetches = infos.iter().map(|info| async move {
            match self.rpc.get_transaction(&info.signature).await {
                Ok(tx) => tx,
                Err(e) => {
                    warn!("[Chain] getTransaction {} failed: {}", info.signature, e);
                    None
                }
            }
        });
        let transactions = join_all(fetches).await;

        let owner = address.to_string();
        let now = Utc::now();
        Ok(infos
            .iter()
            .zip(transactions.iter())
            .map(|(info, tx)| summarize_transaction(&owner, info, tx.as_ref(), now, self.zone))
            .collect())
    }
}

/// Work out what a transaction meant for `owner`.
///
/// The owner's balance change (with the fee added back when it paid) gives
/// the direction and amount. The counterparty is the account whose balance
/// moved the most the other way.
pub fn summarize_transaction(
    owner: &str,
    info: &SignatureInfo,
    tx: Option<&EncodedTransaction>,
    now: DateTime<Utc>,
    zone: Option<Tz>,
) -> TransactionSummary {
    let block_time = tx.and_then(|t| t.block_time).or(info.block_time);
    let slot = tx.map(|t| t.slot).or(Some(info.slot));

    let mut summary = TransactionSummary {
        signature: info.signature.clone(),
        short_sig: short_signature(&info.signature),
        tx_type: TxType::Other,
        amount_lamports: 0,
        amount_sol: 0.0,
        fee_lamports: 0,
        status: if info.err.is_some() { TxStatus::Failed } else { TxStatus::Pending },
        slot,
        block_time,
        timestamp: format_timestamp(block_time, zone),
        relative_time: format_relative_timestamp(block_time, now, zone),
        counterparty: None,
    };

    let Some(tx) = tx else {
        return summary;
    };
    let Some(meta) = tx.meta.as_ref() else {
        return summary;
    };

    summary.fee_lamports = meta.fee;
    summary.status = if meta.err.is_some() || info.err.is_some() {
        TxStatus::Failed
    } else if info.confirmation_status.as_deref() == Some("processed") {
        TxStatus::Pending
    } else {
        TxStatus::Confirmed
    };

    let keys = tx.account_keys();
    let deltas: Vec<i128> = meta
        .pre_balances
        .iter()
        .zip(meta.post_balances.iter())
        .enumerate()
        .map(|(i, (pre, post))| {
            let fee_back = if i == 0 { meta.fee as i128 } else { 0 };
            *post as i128 - *pre as i128 + fee_back
        })
        .collect();

    let Some(owner_index) = keys.iter().position(|k| k == owner) else {
        return summary;
    };
    let Some(&net) = deltas.get(owner_index) else {
        return summary;
    };

    summary.tx_type = match net.signum() {
        -1 => TxType::Send,
        1 => TxType::Receive,
        _ => TxType::Other,
    };
    summary.amount_lamports = net.unsigned_abs().min(u64::MAX as u128) as u64;
    summary.amount_sol = lamports_to_sol(summary.amount_lamports);

    if net != 0 {
        summary.counterparty = deltas
            .iter()
            .enumerate()
            .filter(|(i, d)| *i != owner_index && d.signum() == -net.signum())
            .max_by_key(|(_, d)| d.unsigned_abs())
            .and_then(|(i, _)| keys.get(i).cloned());
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rpc::mock::{self, with_context};
    use crate::rpc::RetryConfig;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;

    fn alice() -> String {
        Pubkey([1; 32]).to_string()
    }

    fn bob() -> String {
        Pubkey([2; 32]).to_string()
    }

    fn chain_for(url: String) -> ChainService {
        let config = Config {
            rpc_url: url,
            confirm_timeout_seconds: 2,
            ..Config::default()
        };
        let rpc = RpcClient::new(&config)
            .unwrap()
            .with_retry_config(RetryConfig::none())
            .with_poll_interval(Duration::from_millis(10));
        ChainService::new(Arc::new(rpc), Some(chrono_tz::UTC))
    }

    /// Node that accepts any transfer and confirms it immediately
    fn happy_node(
        balance: u64,
        fee: Value,
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
    ) -> impl Fn(&str, &Value) -> Result<Value, (i64, String)> + Send + Sync + 'static {
        move |method, params| match method {
            "getBalance" => Ok(with_context(json!(balance))),
            "getLatestBlockhash" => Ok(with_context(json!({
                "blockhash": "11111111111111111111111111111111",
                "lastValidBlockHeight": 500
            }))),
            "getFeeForMessage" => Ok(with_context(fee.clone())),
            "sendTransaction" => {
                let wire = BASE64.decode(params[0].as_str().unwrap()).unwrap();
                let sig = bs58::encode(&wire[1..65]).into_string();
                sent.lock().unwrap().push(wire);
                Ok(json!(sig))
            }
            "getSignatureStatuses" => Ok(with_context(json!([{
                "slot": 9, "confirmations": 1, "err": null, "confirmationStatus": "confirmed"
            }]))),
            "getBlockHeight" => Ok(json!(100)),
            other => Err((-32601, format!("Method not found: {}", other))),
        }
    }

    fn info(signature: &str) -> SignatureInfo {
        SignatureInfo {
            signature: signature.to_string(),
            slot: 77,
            err: None,
            memo: None,
            block_time: Some(1_763_223_660),
            confirmation_status: Some("finalized".to_string()),
        }
    }

    fn transfer_tx(keys: &[String], pre: &[u64], post: &[u64], fee: u64, err: Value) -> EncodedTransaction {
        serde_json::from_value(json!({
            "slot": 77,
            "blockTime": 1_763_223_660,
            "meta": { "err": err, "fee": fee, "preBalances": pre, "postBalances": post },
            "transaction": { "signatures": ["sig"], "message": { "accountKeys": keys } }
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_763_223_660 + 120, 0).unwrap()
    }

    #[test]
    fn test_summarize_send() {
        let tx = transfer_tx(
            &[alice(), bob(), Pubkey::NULL.to_string()],
            &[2_000_000_000, 0, 1],
            &[999_995_000, 1_000_000_000, 1],
            5000,
            Value::Null,
        );
        let row = summarize_transaction(&alice(), &info("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW"), Some(&tx), now(), Some(chrono_tz::UTC));

        assert_eq!(row.tx_type, TxType::Send);
        assert_eq!(row.amount_lamports, 1_000_000_000);
        assert_eq!(row.fee_lamports, 5000);
        assert_eq!(row.status, TxStatus::Confirmed);
        assert_eq!(row.counterparty.as_deref(), Some(bob().as_str()));
        assert_eq!(row.timestamp, "15 Nov 2025, 04:21 PM");
        assert_eq!(row.relative_time, "2 min ago");
        assert_eq!(row.short_sig, "5VERv8NM…diSZkQUW");
    }

    #[test]
    fn test_summarize_receive() {
        let tx = transfer_tx(
            &[bob(), alice(), Pubkey::NULL.to_string()],
            &[5_000_000_000, 10],
            &[4_499_995_000, 500_000_010],
            5000,
            Value::Null,
        );
        let row = summarize_transaction(&alice(), &info("sig"), Some(&tx), now(), None);

        assert_eq!(row.tx_type, TxType::Receive);
        assert_eq!(row.amount_lamports, 500_000_000);
        assert_eq!(row.amount_sol, 0.5);
        assert_eq!(row.counterparty.as_deref(), Some(bob().as_str()));
    }

    #[test]
    fn test_summarize_failed() {
        let tx = transfer_tx(
            &[alice(), bob()],
            &[1_000_000, 0],
            &[995_000, 0],
            5000,
            json!({ "InstructionError": [0, { "Custom": 1 }] }),
        );
        let row = summarize_transaction(&alice(), &info("sig"), Some(&tx), now(), None);

        assert_eq!(row.status, TxStatus::Failed);
        assert_eq!(row.tx_type, TxType::Other);
        assert_eq!(row.fee_lamports, 5000);
        assert_eq!(row.counterparty, None);
    }

    #[test]
    fn test_summarize_missing_transaction_is_pending() {
        let mut sig_info = info("sig");
        sig_info.block_time = None;
        let row = summarize_transaction(&alice(), &sig_info, None, now(), None);

        assert_eq!(row.status, TxStatus::Pending);
        assert_eq!(row.tx_type, TxType::Other);
        assert_eq!(row.timestamp, "—");
        assert_eq!(row.slot, Some(77));
    }

    #[test]
    fn test_summarize_processed_is_pending() {
        let tx = transfer_tx(&[bob(), alice()], &[10_000_000, 0], &[4_995_000, 5_000_000], 5000, Value::Null);
        let mut sig_info = info("sig");
        sig_info.confirmation_status = Some("processed".to_string());
        let row = summarize_transaction(&alice(), &sig_info, Some(&tx), now(), None);
        assert_eq!(row.status, TxStatus::Pending);
        assert_eq!(row.tx_type, TxType::Receive);
    }

    #[tokio::test]
    async fn test_send_below_minimum_rejected() {
        let url = mock::spawn(|_, _| Err((-32601, "unused".to_string()))).await;
        let err = chain_for(url)
            .send_sol(&WalletKeypair::generate(), &Pubkey::NULL, 99_999)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::AmountTooSmall { minimum: 100_000 }));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_send_insufficient_balance() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let url = mock::spawn(happy_node(1_000_000, json!(5000), sent.clone())).await;

        let err = chain_for(url)
            .send_sol(&WalletKeypair::generate(), &Pubkey([2; 32]), 1_000_000)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::InsufficientBalance { needed: 1_005_000, available: 1_000_000 }
        ));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_sol_submits_signed_transfer() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let url = mock::spawn(happy_node(2_000_000_000, json!(5000), sent.clone())).await;
        let keypair = WalletKeypair::generate();
        let to = Pubkey([2; 32]);

        let receipt = chain_for(url).send_sol(&keypair, &to, 1_000_000_000).await.unwrap();
        assert_eq!(receipt.lamports, 1_000_000_000);
        assert_eq!(receipt.fee_lamports, 5000);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let wire = &sent[0];
        assert_eq!(bs58::encode(&wire[1..65]).into_string(), receipt.signature);
        // header follows the signature
        assert_eq!(&wire[65..68], &[1, 0, 1]);
        assert_eq!(&wire[69..101], keypair.pubkey().as_bytes());
        assert_eq!(&wire[wire.len() - 8..], &1_000_000_000u64.to_le_bytes());
    }

    #[tokio::test]
    async fn test_fee_falls_back_when_node_returns_null() {
        let url = mock::spawn(happy_node(0, Value::Null, Arc::default())).await;
        let fee = chain_for(url)
            .estimate_transfer_fee(&Pubkey([1; 32]), &Pubkey([2; 32]), 1)
            .await
            .unwrap();
        assert_eq!(fee, DEFAULT_FEE_LAMPORTS);
    }

    #[tokio::test]
    async fn test_clear_sends_balance_minus_fee_to_null() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let url = mock::spawn(happy_node(1_000_000, json!(5000), sent.clone())).await;

        let receipt = chain_for(url)
            .transfer_all_to_null(&WalletKeypair::generate())
            .await
            .unwrap();
        assert_eq!(receipt.lamports, 995_000);

        let sent = sent.lock().unwrap();
        let wire = &sent[0];
        // the null address doubles as the program id
        assert_eq!(&wire[65..68], &[1, 0, 0]);
        assert_eq!(&wire[wire.len() - 8..], &995_000u64.to_le_bytes());
    }

    #[tokio::test]
    async fn test_clear_empty_wallet() {
        let url = mock::spawn(happy_node(0, json!(5000), Arc::default())).await;
        let err = chain_for(url)
            .transfer_all_to_null(&WalletKeypair::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::NothingToClear));
        assert_eq!(err.to_string(), "Nothing to clear");
    }

    #[tokio::test]
    async fn test_errors_name_the_operation() {
        let url = mock::spawn(|_, _| Err((-32005, "Node is unhealthy".to_string()))).await;
        let err = chain_for(url).get_balance(&Pubkey::NULL).await.unwrap_err();
        assert!(err.to_string().starts_with("getBalance failed: "));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_transaction_details() {
        let (alice_key, bob_key) = (alice(), bob());
        let url = mock::spawn(move |method, params| match method {
            "getSignaturesForAddress" => Ok(json!([
                { "signature": "known", "slot": 77, "err": null, "blockTime": 1_763_223_660, "confirmationStatus": "finalized" },
                { "signature": "unknown", "slot": 78, "err": null, "blockTime": null, "confirmationStatus": "processed" }
            ])),
            "getTransaction" if params[0] == "known" => Ok(json!({
                "slot": 77,
                "blockTime": 1_763_223_660,
                "meta": { "err": null, "fee": 5000, "preBalances": [3_000_000_000u64, 0], "postBalances": [1_999_995_000u64, 1_000_000_000u64] },
                "transaction": { "signatures": ["known"], "message": { "accountKeys": [alice_key, bob_key] } }
            })),
            "getTransaction" => Ok(Value::Null),
            other => Err((-32601, format!("Method not found: {}", other))),
        })
        .await;

        let rows = chain_for(url)
            .get_transaction_details(&Pubkey([1; 32]), 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tx_type, TxType::Send);
        assert_eq!(rows[0].amount_lamports, 1_000_000_000);
        assert_eq!(rows[1].signature, "unknown");
        assert_eq!(rows[1].status, TxStatus::Pending);
    }

    #[tokio::test]
    async fn test_recent_transactions_passes_limit() {
        let url = mock::spawn(|method, params| match method {
            "getSignaturesForAddress" if params[1]["limit"] == 2 => Ok(json!([
                { "signature": "newest", "slot": 9, "err": null, "blockTime": null },
                { "signature": "older", "slot": 8, "err": null, "blockTime": null }
            ])),
            other => Err((-32601, format!("Method not found: {}", other))),
        })
        .await;

        let sigs = chain_for(url)
            .get_recent_transactions(&Pubkey::NULL, 2)
            .await
            .unwrap();
        assert_eq!(sigs, vec!["newest".to_string(), "older".to_string()]);
    }

    #[tokio::test]
    async fn test_request_airdrop_waits_for_confirmation() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();
        let airdrop_sig = Signature([7; 64]).to_string();
        let returned_sig = airdrop_sig.clone();
        let url = mock::spawn(move |method, params| {
            calls_clone.lock().unwrap().push(method.to_string());
            match method {
                "requestAirdrop" if params[1] == 2_000_000_000u64 => Ok(json!(returned_sig)),
                "getLatestBlockhash" => Ok(with_context(json!({
                    "blockhash": "11111111111111111111111111111111",
                    "lastValidBlockHeight": 500
                }))),
                "getSignatureStatuses" => Ok(with_context(json!([{
                    "slot": 9, "confirmations": 1, "err": null, "confirmationStatus": "confirmed"
                }]))),
                other => Err((-32601, format!("Method not found: {}", other))),
            }
        })
        .await;

        let signature = chain_for(url)
            .request_airdrop(&Pubkey([1; 32]), 2_000_000_000)
            .await
            .unwrap();
        assert_eq!(signature.to_string(), airdrop_sig);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["requestAirdrop", "getLatestBlockhash", "getSignatureStatuses"]
        );
    }

    #[tokio::test]
    async fn test_airdrop_refused_by_faucet() {
        let url = mock::spawn(|_, _| Err((-32600, "airdrop request failed".to_string()))).await;
        let err = chain_for(url)
            .request_airdrop(&Pubkey([1; 32]), 1_000_000_000)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("requestAirdrop failed: "));
    }

    #[tokio::test]
    async fn test_transfer_errors_name_the_wallet_operation() {
        let url = mock::spawn(|method, _| match method {
            "getBalance" => Ok(with_context(json!(5_000_000_000u64))),
            "getLatestBlockhash" => Ok(with_context(json!({
                "blockhash": "11111111111111111111111111111111",
                "lastValidBlockHeight": 500
            }))),
            "getFeeForMessage" => Ok(with_context(json!(5000))),
            "sendTransaction" => Err((-32002, "Transaction simulation failed: Blockhash not found".to_string())),
            other => Err((-32601, format!("Method not found: {}", other))),
        })
        .await;
        let chain = chain_for(url);
        let keypair = WalletKeypair::generate();

        let err = chain
            .send_sol(&keypair, &Pubkey([2; 32]), 1_000_000_000)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::Rpc {
                operation: "sendSol",
                source: RpcError::BlockhashNotFound
            }
        ));
        assert!(err.to_string().starts_with("sendSol failed: "));

        let err = chain.transfer_all_to_null(&keypair).await.unwrap_err();
        assert!(err.to_string().starts_with("transferAllToNull failed: "));
    }

    #[tokio::test]
    async fn test_unfetchable_transaction_is_pending_row() {
        let alice_key = alice();
        let url = mock::spawn(move |method, params| match method {
            "getSignaturesForAddress" => Ok(json!([
                { "signature": "good", "slot": 77, "err": null, "blockTime": 1_763_223_660, "confirmationStatus": "finalized" },
                { "signature": "broken", "slot": 76, "err": null, "blockTime": 1_763_223_600, "confirmationStatus": "finalized" }
            ])),
            "getTransaction" if params[0] == "good" => Ok(json!({
                "slot": 77,
                "blockTime": 1_763_223_660,
                "meta": { "err": null, "fee": 5000, "preBalances": [0u64, 10_000_000u64], "postBalances": [1_000_000u64, 8_995_000u64] },
                "transaction": { "signatures": ["good"], "message": { "accountKeys": [Pubkey([9; 32]).to_string(), alice_key] } }
            })),
            "getTransaction" => Err((-32603, "Internal error".to_string())),
            other => Err((-32601, format!("Method not found: {}", other))),
        })
        .await;

        let rows = chain_for(url)
            .get_transaction_details(&Pubkey([1; 32]), 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, TxStatus::Confirmed);
        assert_eq!(rows[1].signature, "broken");
        assert_eq!(rows[1].status, TxStatus::Pending);
    }

    #[tokio::test]
    async fn test_history_listing_failure_is_an_error() {
        let url = mock::spawn(|_, _| Err((-32603, "Internal error".to_string()))).await;
        let err = chain_for(url)
            .get_transaction_details(&Pubkey([1; 32]), 10)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("getTransactionDetails failed: "));
    }
}
