//! Configuration management for the demo wallet

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;

/// Wallet configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Solana JSON-RPC endpoint (a local test validator by default)
    pub rpc_url: String,

    /// Commitment used for reads and confirmations
    pub commitment: String,

    /// Path to SQLite database holding the wallet registry
    pub database_path: String,

    /// `maxRetries` passed to `sendTransaction`
    pub send_max_retries: u32,

    /// How long to wait for a submitted transaction to confirm
    pub confirm_timeout_seconds: u64,

    /// Default page size for transaction history
    pub history_limit: usize,

    /// Price feed settings
    pub price: PriceConfig,

    /// Time zone used when formatting timestamps; `None` means the machine's local zone
    pub display_timezone: Option<Tz>,

    /// Bind address for the HTTP API
    pub server_host: String,
    pub server_port: u16,
}

#[derive(Debug, Clone)]
pub struct PriceConfig {
    /// CoinGecko-compatible API base URL
    pub api_url: String,
    /// Coin id on the price API
    pub coin_id: String,
    /// Quote currency (lowercase, e.g. `inr`)
    pub currency: String,
    /// Price used when the feed is unreachable
    pub fallback_price: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coingecko.com/api/v3".to_string(),
            coin_id: "solana".to_string(),
            currency: "inr".to_string(),
            fallback_price: 20_000.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8899".to_string(),
            commitment: "confirmed".to_string(),
            database_path: "wallet.db".to_string(),
            send_max_retries: 3,
            confirm_timeout_seconds: 60,
            history_limit: 10,
            price: PriceConfig::default(),
            display_timezone: None,
            server_host: "127.0.0.1".to_string(),
            server_port: 3001,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let rpc_url = env::var("SOLANA_RPC_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.rpc_url);

        let commitment = env::var("SOLANA_COMMITMENT")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.commitment);

        if !matches!(commitment.as_str(), "processed" | "confirmed" | "finalized") {
            anyhow::bail!("SOLANA_COMMITMENT must be processed, confirmed or finalized (got {})", commitment);
        }

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or(defaults.database_path);

        let send_max_retries = env::var("SEND_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.send_max_retries);

        let confirm_timeout_seconds = env::var("CONFIRM_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.confirm_timeout_seconds);

        let history_limit = env::var("HISTORY_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.history_limit);

        let price = PriceConfig {
            api_url: env::var("PRICE_API_URL").unwrap_or(defaults.price.api_url),
            coin_id: env::var("PRICE_COIN_ID").unwrap_or(defaults.price.coin_id),
            currency: env::var("PRICE_CURRENCY")
                .map(|v| v.to_lowercase())
                .unwrap_or(defaults.price.currency),
            fallback_price: env::var("PRICE_FALLBACK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.price.fallback_price),
        };

        let display_timezone = match env::var("DISPLAY_TIMEZONE").ok().filter(|s| !s.is_empty()) {
            Some(name) => Some(
                name.parse::<Tz>()
                    .map_err(|e| anyhow::anyhow!("{}", e))
                    .with_context(|| format!("Unknown DISPLAY_TIMEZONE '{}'", name))?,
            ),
            None => None,
        };

        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.server_port);

        Ok(Self {
            rpc_url,
            commitment,
            database_path,
            send_max_retries,
            confirm_timeout_seconds,
            history_limit,
            price,
            display_timezone,
            server_host,
            server_port,
        })
    }

    /// Whether the RPC endpoint points at a local validator (airdrops only work there or on devnet/testnet)
    pub fn is_local_validator(&self) -> bool {
        self.rpc_url.contains("localhost") || self.rpc_url.contains("127.0.0.1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_validator() {
        let config = Config::default();
        assert_eq!(config.rpc_url, "http://localhost:8899");
        assert_eq!(config.commitment, "confirmed");
        assert_eq!(config.send_max_retries, 3);
        assert!(config.is_local_validator());
    }

    #[test]
    fn test_remote_rpc_is_not_local() {
        let config = Config {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            ..Default::default()
        };
        assert!(!config.is_local_validator());
    }
}
