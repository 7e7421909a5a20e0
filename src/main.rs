//! Solana Demo Wallet CLI
//!
//! Manage local test wallets and move SOL on a local validator or devnet.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use solana_demo_wallet::chain::ChainService;
use solana_demo_wallet::format::{
    format_fiat, format_relative_timestamp, format_sol, lamports_to_sol, parse_sol_amount, shorten_address,
};
use solana_demo_wallet::price::{format_change, PriceFeed};
use solana_demo_wallet::rpc::RpcClient;
use solana_demo_wallet::types::{Pubkey, TxStatus, TxType, WalletRecord, LAMPORTS_PER_SOL};
use solana_demo_wallet::wallet::{BackupReminder, ImportData, WalletKeypair, WalletManager};
use solana_demo_wallet::{Config, Database};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "solana-wallet")]
#[command(about = "Demo wallet for Solana test networks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List wallets (the active one is starred)
    List,

    /// Create a new wallet
    New {
        /// Display name (defaults to "Wallet N")
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Import a wallet file (secret key array or exported JSON)
    Import {
        file: PathBuf,

        #[arg(short, long)]
        label: Option<String>,
    },

    /// Write a wallet's backup file
    Export {
        /// Wallet id, address, label or list position
        wallet: String,

        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Rename a wallet
    Rename { wallet: String, label: String },

    /// Delete a wallet from this machine
    Remove { wallet: String },

    /// Switch the active wallet
    Use { wallet: String },

    /// Show a balance (active wallet unless an address is given)
    Balance {
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Request test SOL for the active wallet
    Airdrop {
        #[arg(default_value = "1")]
        amount: String,
    },

    /// Send SOL from the active wallet
    Send { to: String, amount: String },

    /// Burn the active wallet's whole balance to the null address
    Clear {
        /// Confirm the transfer
        #[arg(long)]
        yes: bool,
    },

    /// Estimate the network fee for a transfer
    Fee {
        #[arg(default_value = "11111111111111111111111111111111")]
        to: String,

        #[arg(default_value = "0")]
        amount: String,
    },

    /// Show recent transactions of the active wallet
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the SOL price and 24h change
    Price,

    /// Show whether the active wallet still needs a backup
    BackupStatus,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let db = Arc::new(Database::new(&config.database_path).await?);
    let wallets = WalletManager::new(db.clone());

    if let Some(migrated) = wallets.migrate_legacy_wallet().await? {
        println!("{} Migrated legacy wallet {}", "✓".green(), migrated.public_key);
    }

    match cli.command {
        Commands::List => list_wallets(&wallets).await?,
        Commands::New { label } => new_wallet(&wallets, label).await?,
        Commands::Import { file, label } => import_wallet(&wallets, &file, label).await?,
        Commands::Export { wallet, out } => export_wallet(&wallets, &wallet, &out).await?,
        Commands::Rename { wallet, label } => {
            let target = find_wallet(&wallets, &wallet).await?;
            let renamed = wallets.rename_wallet(&target.id, &label).await?;
            println!("{} Renamed to {}", "✓".green(), renamed.label.bold());
        }
        Commands::Remove { wallet } => remove_wallet(&wallets, &wallet).await?,
        Commands::Use { wallet } => {
            let target = find_wallet(&wallets, &wallet).await?;
            wallets.set_active_wallet(&target.id).await?;
            println!("{} Active wallet: {} ({})", "✓".green(), target.display_label().bold(), target.public_key);
        }
        Commands::Balance { address } => show_balance(&config, &wallets, address).await?,
        Commands::Airdrop { amount } => airdrop(&config, &wallets, &amount).await?,
        Commands::Send { to, amount } => send(&config, &wallets, &to, &amount).await?,
        Commands::Clear { yes } => clear(&config, &wallets, yes).await?,
        Commands::Fee { to, amount } => fee(&config, &wallets, &to, &amount).await?,
        Commands::History { limit } => history(&config, &wallets, limit).await?,
        Commands::Price => price(&config).await?,
        Commands::BackupStatus => backup_status(&db, &wallets).await?,
    }

    Ok(())
}

fn chain_service(config: &Config) -> Result<ChainService> {
    let rpc = RpcClient::new(config)?;
    Ok(ChainService::new(Arc::new(rpc), config.display_timezone))
}

async fn active_keypair(wallets: &WalletManager) -> Result<WalletKeypair> {
    wallets
        .get_active_keypair()
        .await?
        .context("No active wallet. Create one with `solana-wallet new`.")
}

/// Match by id, address, label (case-insensitive) or 1-based list position
async fn find_wallet(wallets: &WalletManager, selector: &str) -> Result<WalletRecord> {
    let all = wallets.get_wallets().await?;

    if let Ok(position) = selector.parse::<usize>() {
        if let Some(wallet) = position.checked_sub(1).and_then(|i| all.get(i)) {
            return Ok(wallet.clone());
        }
    }

    all.into_iter()
        .find(|w| w.id == selector || w.public_key == selector || w.label.eq_ignore_ascii_case(selector))
        .with_context(|| format!("No wallet matches '{}'", selector))
}

async fn list_wallets(wallets: &WalletManager) -> Result<()> {
    let all = wallets.get_wallets().await?;
    if all.is_empty() {
        println!("No wallets yet. Create one with `solana-wallet new`.");
        return Ok(());
    }

    let active_id = wallets.get_active_wallet().await?.map(|w| w.id);

    println!("\n{}", "=".repeat(70));
    println!("  WALLETS");
    println!("{}\n", "=".repeat(70));

    for (i, wallet) in all.iter().enumerate() {
        let is_active = active_id.as_deref() == Some(wallet.id.as_str());
        let marker = if is_active { "*".green().bold() } else { " ".normal() };
        let backup = if wallet.backup_downloaded {
            "backed up".green()
        } else {
            "no backup".yellow()
        };
        println!(
            "{} {:>2}. {:<24} {}  {}",
            marker,
            i + 1,
            wallet.display_label(),
            wallet.public_key,
            backup
        );
    }
    println!();

    Ok(())
}

async fn new_wallet(wallets: &WalletManager, label: Option<String>) -> Result<()> {
    let wallet = wallets.create_wallet(label).await?;
    println!("{} Created {}", "✓".green(), wallet.display_label().bold());
    println!("  Address: {}", wallet.public_key);
    println!(
        "  {}",
        "Back it up with `solana-wallet export` before funding it.".yellow()
    );
    Ok(())
}

async fn import_wallet(wallets: &WalletManager, file: &Path, label: Option<String>) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let data = ImportData::parse(&text)?;
    let wallet = wallets.import_wallet(data, label).await?;

    println!("{} Imported {} ({})", "✓".green(), wallet.display_label().bold(), wallet.public_key);
    Ok(())
}

async fn export_wallet(wallets: &WalletManager, selector: &str, out: &Path) -> Result<()> {
    let target = find_wallet(wallets, selector).await?;
    let export = wallets.export_wallet(&target.id).await?;

    let path = out.join(&export.file_name);
    tokio::fs::write(&path, export.contents.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} Saved backup to {}", "✓".green(), path.display());
    println!("  {}", "Anyone with this file controls the wallet.".yellow());
    Ok(())
}

async fn remove_wallet(wallets: &WalletManager, selector: &str) -> Result<()> {
    let target = find_wallet(wallets, selector).await?;
    let active = wallets.remove_wallet(&target.id).await?;

    println!("{} Removed {}", "✓".green(), target.display_label());
    match active {
        Some(wallet) => println!("  Active wallet: {}", wallet.display_label().bold()),
        None => println!("  No wallets left"),
    }
    Ok(())
}

async fn show_balance(config: &Config, wallets: &WalletManager, address: Option<String>) -> Result<()> {
    let address: Pubkey = match address {
        Some(addr) => addr.parse().context("Invalid address")?,
        None => active_keypair(wallets).await?.pubkey(),
    };

    let chain = chain_service(config)?;
    let lamports = chain.get_balance(&address).await?;

    let feed = PriceFeed::new(config.price.clone())?;
    let fiat = lamports_to_sol(lamports) * feed.price_or_fallback().await;

    println!("{}", shorten_address(&address.to_string()).dimmed());
    println!("{}", format_sol(lamports).bold());
    println!("{}", format_fiat(fiat, feed.currency()).dimmed());
    Ok(())
}

async fn airdrop(config: &Config, wallets: &WalletManager, amount: &str) -> Result<()> {
    let lamports = parse_sol_amount(amount)?;
    let address = active_keypair(wallets).await?.pubkey();

    if !config.is_local_validator() && lamports > 2 * LAMPORTS_PER_SOL {
        println!("{}", "Public faucets usually cap airdrops at 2 SOL.".yellow());
    }

    let chain = chain_service(config)?;
    println!("Requesting {}...", format_sol(lamports));
    let signature = chain.request_airdrop(&address, lamports).await?;

    println!("{} Airdrop confirmed", "✓".green());
    println!("  Signature: {}", signature);
    Ok(())
}

async fn send(config: &Config, wallets: &WalletManager, to: &str, amount: &str) -> Result<()> {
    let to: Pubkey = to.parse().context("Invalid recipient address")?;
    let lamports = parse_sol_amount(amount)?;
    let keypair = active_keypair(wallets).await?;

    let chain = chain_service(config)?;
    let fee = chain.estimate_transfer_fee(&keypair.pubkey(), &to, lamports).await?;
    println!(
        "Sending {} to {} (fee {})...",
        format_sol(lamports),
        shorten_address(&to.to_string()),
        format_sol(fee)
    );

    let receipt = chain.send_sol(&keypair, &to, lamports).await?;

    println!("{} Transaction confirmed", "✓".green());
    println!("  Signature: {}", receipt.signature);
    Ok(())
}

async fn clear(config: &Config, wallets: &WalletManager, yes: bool) -> Result<()> {
    let keypair = active_keypair(wallets).await?;

    if !yes {
        println!(
            "{}",
            "This sends the entire balance to the null address and cannot be undone.".red()
        );
        println!("Re-run with --yes to continue.");
        return Ok(());
    }

    let chain = chain_service(config)?;
    let receipt = chain.transfer_all_to_null(&keypair).await?;

    println!("{} Cleared {}", "✓".green(), format_sol(receipt.lamports));
    println!("  Signature: {}", receipt.signature);
    Ok(())
}

async fn fee(config: &Config, wallets: &WalletManager, to: &str, amount: &str) -> Result<()> {
    let to: Pubkey = to.parse().context("Invalid recipient address")?;
    let lamports = if amount.trim() == "0" { 0 } else { parse_sol_amount(amount)? };
    let from = active_keypair(wallets).await?.pubkey();

    let chain = chain_service(config)?;
    let fee = chain.estimate_transfer_fee(&from, &to, lamports).await?;

    println!("Estimated fee: {} ({} lamports)", format_sol(fee).bold(), fee);
    if lamports > 0 {
        println!("Total: {}", format_sol(lamports.saturating_add(fee)));
    }
    Ok(())
}

async fn history(config: &Config, wallets: &WalletManager, limit: Option<usize>) -> Result<()> {
    let address = active_keypair(wallets).await?.pubkey();
    let limit = limit.unwrap_or(config.history_limit);

    let chain = chain_service(config)?;
    let rows = chain.get_transaction_details(&address, limit).await?;
    debug!("Fetched {} transactions", rows.len());

    if rows.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    println!("\n{}", "=".repeat(90));
    println!("  RECENT TRANSACTIONS - {}", shorten_address(&address.to_string()));
    println!("{}\n", "=".repeat(90));

    let now = Utc::now();
    for row in &rows {
        let kind = match row.tx_type {
            TxType::Send => "Send   ".red(),
            TxType::Receive => "Receive".green(),
            TxType::Other => "Other  ".normal(),
        };
        let status = match row.status {
            TxStatus::Confirmed => row.status.to_string().green(),
            TxStatus::Pending => row.status.to_string().yellow(),
            TxStatus::Failed => row.status.to_string().red(),
        };
        let counterparty = row
            .counterparty
            .as_deref()
            .map(shorten_address)
            .unwrap_or_else(|| "—".to_string());

        println!(
            "{} {:>16}  {:<11} {:<20} {:<12} {}",
            kind,
            format_sol(row.amount_lamports),
            counterparty,
            row.short_sig,
            format_relative_timestamp(row.block_time, now, config.display_timezone),
            status
        );
    }
    println!();

    Ok(())
}

async fn price(config: &Config) -> Result<()> {
    let feed = PriceFeed::new(config.price.clone())?;
    let quote = feed.fetch_quote().await?;

    let change = format_change(quote.change_24h);
    let change = if quote.change_24h >= 0.0 { change.green() } else { change.red() };

    println!("SOL  {}  {} (24h)", format_fiat(quote.price, &quote.currency).bold(), change);

    if let Ok(points) = feed.fetch_sparkline().await {
        if let (Some(low), Some(high)) = (
            points.iter().copied().reduce(f64::min),
            points.iter().copied().reduce(f64::max),
        ) {
            println!(
                "     24h range {} - {}",
                format_fiat(low, &quote.currency),
                format_fiat(high, &quote.currency)
            );
        }
    }
    Ok(())
}

async fn backup_status(db: &Database, wallets: &WalletManager) -> Result<()> {
    let Some(active) = wallets.get_active_wallet().await? else {
        println!("No active wallet.");
        return Ok(());
    };

    let reminder = BackupReminder::new();
    if reminder.should_remind(db, &active).await? {
        println!(
            "{} {} has not been backed up. Run `solana-wallet export {}`.",
            "!".yellow().bold(),
            active.display_label(),
            active.id
        );
    } else {
        println!("{} {} is backed up", "✓".green(), active.display_label());
    }
    Ok(())
}
