//! coldsat — command-line interface for the coldsat wallet engine.
//!
//! Generates mnemonics, creates and opens encrypted wallet files, queries
//! balances and sends transactions through an Esplora server.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use coldsat_core::traits::BlockchainGateway;
use coldsat_core::units::{parse_btc, parse_sats, sats_to_btc_string, sats_to_display};
use coldsat_esplora::EsploraGateway;
use coldsat_wallet::{SendRequest, Wallet, WalletError, mnemonic, parse_network, password};
use tracing::debug;

use crate::config::Config;

/// Single-address native-segwit Bitcoin wallet.
#[derive(Parser)]
#[command(name = "coldsat")]
#[command(version, about = "Single-address native-segwit Bitcoin wallet")]
struct Cli {
    /// Network: mainnet, testnet, signet or regtest (env COLDSAT_NETWORK).
    #[arg(long, global = true)]
    network: Option<String>,

    /// Esplora API base URL (env COLDSAT_ESPLORA_URL).
    #[arg(long, global = true)]
    esplora_url: Option<String>,

    /// Reject mnemonics with unknown words or a bad checksum.
    #[arg(long, global = true)]
    strict_mnemonic: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new 24-word mnemonic.
    Mnemonic,
    /// Print the BIP-39 English word list.
    Words(WordsArgs),
    /// Create and save a new encrypted wallet file.
    Create(CreateArgs),
    /// Decrypt a wallet file and show its contents.
    Check(CheckArgs),
    /// Decrypt a wallet file and show its address and private key.
    Open(FileArgs),
    /// Show the balance of an address.
    Balance(BalanceArgs),
    /// Send bitcoin from a wallet file.
    Send(SendArgs),
    /// Check a password against the wallet password policy.
    Password,
}

#[derive(Args)]
struct WordsArgs {
    /// Only print words starting with this prefix.
    #[arg(short, long)]
    prefix: Option<String>,
}

#[derive(Args)]
struct CreateArgs {
    /// Wallet name, also used for the file name.
    #[arg(short, long)]
    name: String,

    /// Directory to save into (env COLDSAT_WALLET_DIR, default ~/coldsat-wallets).
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Save even if the password fails the policy.
    #[arg(long)]
    allow_weak_password: bool,
}

#[derive(Args)]
struct FileArgs {
    /// Path to the wallet file.
    file: PathBuf,
}

#[derive(Args)]
struct CheckArgs {
    /// Path to the wallet file.
    file: PathBuf,

    /// Print the full record as JSON, including the mnemonic and private key.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BalanceArgs {
    /// Address to query.
    address: String,
}

#[derive(Args)]
struct SendArgs {
    /// Path to the wallet file.
    #[arg(short, long)]
    wallet: PathBuf,

    /// Recipient address.
    #[arg(short, long)]
    to: String,

    /// Amount in BTC, e.g. 0.0015.
    #[arg(short, long, value_parser = btc_amount, conflicts_with = "sats", required_unless_present = "sats")]
    amount: Option<u64>,

    /// Amount in satoshis.
    #[arg(long, value_parser = sat_amount)]
    sats: Option<u64>,

    /// Total fee in satoshis, developer share included.
    #[arg(short, long, value_parser = sat_amount)]
    fee: u64,

    /// Beneficiary address for a share of the fee.
    #[arg(long, requires = "developer_fee")]
    developer_address: Option<String>,

    /// Beneficiary share of the fee in satoshis.
    #[arg(long, value_parser = sat_amount, requires = "developer_address")]
    developer_fee: Option<u64>,

    /// Build and sign but do not broadcast. Prints the raw transaction.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging("warn", cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<WalletError>() {
                Some(we) => eprintln!("error [{}]: {e:#}", we.code()),
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(network) = &cli.network {
        config.network = parse_network(network)?;
        if cli.esplora_url.is_none() && std::env::var_os("COLDSAT_ESPLORA_URL").is_none() {
            config.esplora_url = config::default_esplora_url(config.network).to_string();
        }
    }
    if let Some(url) = cli.esplora_url {
        config.esplora_url = url;
    }
    if cli.strict_mnemonic {
        config.strict_mnemonic = true;
    }
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Mnemonic => cmd_mnemonic(),
        Commands::Words(args) => cmd_words(args),
        Commands::Create(args) => cmd_create(&config, args),
        Commands::Check(args) => cmd_check(args),
        Commands::Open(args) => cmd_open(&config, args),
        Commands::Balance(args) => cmd_balance(&config, args),
        Commands::Send(args) => cmd_send(&config, args),
        Commands::Password => cmd_password(),
    }
}

fn cmd_mnemonic() -> Result<()> {
    println!("{}", mnemonic::generate()?);
    Ok(())
}

fn cmd_words(args: WordsArgs) -> Result<()> {
    let prefix = args.prefix.unwrap_or_default();
    for word in mnemonic::word_list().iter().filter(|w| w.starts_with(&prefix)) {
        println!("{word}");
    }
    Ok(())
}

fn cmd_create(config: &Config, args: CreateArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| config.wallet_dir.clone());

    let entered = prompt_secret("Mnemonic (leave empty to generate a new one)")?;
    let generated = entered.trim().is_empty();
    let phrase = if generated { mnemonic::generate()? } else { entered };
    let passphrase = prompt_secret("BIP-39 passphrase (optional)")?;

    let password = prompt_secret("Wallet password")?;
    let report = password::assess(&password);
    if !report.is_valid() {
        for issue in &report.issues {
            eprintln!("  password {issue}");
        }
        if !args.allow_weak_password {
            bail!("password rejected ({}); use --allow-weak-password to save anyway", report.strength);
        }
    }
    if password != prompt_secret("Confirm password")? {
        bail!("passwords do not match");
    }

    let wallet = Wallet::create(&args.name, &phrase, &passphrase, &config.engine())?;
    let path = wallet
        .save(&dir, &password)
        .with_context(|| format!("failed to save wallet into {}", dir.display()))?;

    println!("\n=== WALLET CREATED ===");
    println!("Network: {}", config.network);
    println!("Address: {}", wallet.address());
    println!("Path:    {}", wallet.record().path);
    println!("File:    {}", path.display());
    if generated {
        println!("\nMNEMONIC (BACK THIS UP, 24 WORDS):");
        println!("  {phrase}");
        println!("\nWARNING: this phrase will NOT be shown again.");
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let password = prompt_secret("Wallet password")?;
    let record = Wallet::check(&args.file, &password)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }
    println!("Name:       {}", record.name);
    println!("Address:    {}", record.address);
    println!("Public key: {}", record.public_key);
    println!("Path:       {}", record.path);
    println!("Created:    {}", record.created_at);
    println!("Passphrase: {}", if record.passphrase.is_empty() { "no" } else { "yes" });
    Ok(())
}

fn cmd_open(config: &Config, args: FileArgs) -> Result<()> {
    let password = prompt_secret("Wallet password")?;
    let wallet = Wallet::open(&args.file, &password, config.network)?;
    println!("Address: {}", wallet.address());
    println!("WIF:     {}", wallet.wif());
    Ok(())
}

fn cmd_balance(config: &Config, args: BalanceArgs) -> Result<()> {
    let gateway = gateway(config)?;
    let utxos = gateway.list_utxos(&args.address).map_err(WalletError::from)?;
    let balance = coldsat_core::types::AddressBalance::from_utxos(&utxos);

    println!("Address:     {}", args.address);
    println!("Confirmed:   {}", sats_to_display(balance.confirmed));
    println!("Unconfirmed: {}", sats_to_display(balance.unconfirmed));
    println!("Total:       {} BTC", sats_to_btc_string(balance.total()));
    println!("UTXOs:       {} confirmed", balance.confirmed_utxos);
    Ok(())
}

fn cmd_send(config: &Config, args: SendArgs) -> Result<()> {
    let amount = args
        .amount
        .or(args.sats)
        .context("either --amount or --sats is required")?;

    let mut request = SendRequest::new(&args.to, amount, args.fee);
    if let (Some(address), Some(fee)) = (&args.developer_address, args.developer_fee) {
        request = request.with_fee_split(address, fee);
    }
    // Fail fast before asking for a password.
    request.validate(config.network)?;

    let password = prompt_secret("Wallet password")?;
    let wallet = Wallet::open(&args.wallet, &password, config.network)?;
    let gateway = gateway(config)?;

    if args.dry_run {
        let signed = wallet.build_and_sign(&gateway, &request)?;
        println!("\n=== SIGNED (NOT BROADCAST) ===");
        print_summary(&args.to, amount, signed.miner_fee, signed.developer_fee, signed.change, signed.inputs.len());
        println!("TxID:   {}", signed.txid);
        println!("Raw:    {}", signed.raw_hex);
        return Ok(());
    }

    let receipt = wallet.send(&gateway, &request)?;
    let signed = &receipt.signed;
    println!("\n=== TRANSACTION SENT ===");
    print_summary(&args.to, amount, signed.miner_fee, signed.developer_fee, signed.change, signed.inputs.len());
    println!("TxID:   {}", receipt.txid);
    Ok(())
}

fn cmd_password() -> Result<()> {
    let password = prompt_secret("Password to check")?;
    let report = password::assess(&password);
    println!("Strength: {} ({}/{})", report.strength, report.score, password::MAX_SCORE);
    for issue in &report.issues {
        println!("  [{}] {issue}", issue.code());
    }
    if report.is_valid() {
        println!("Meets the wallet password policy.");
    }
    Ok(())
}

fn print_summary(to: &str, amount: u64, miner_fee: u64, developer_fee: u64, change: u64, inputs: usize) {
    println!("To:     {to}");
    println!("Amount: {}", sats_to_display(amount));
    println!("Fee:    {}", sats_to_display(miner_fee));
    if developer_fee > 0 {
        println!("Dev:    {}", sats_to_display(developer_fee));
    }
    if change > 0 {
        println!("Change: {}", sats_to_display(change));
    }
    println!("Inputs: {inputs}");
}

fn gateway(config: &Config) -> Result<EsploraGateway> {
    EsploraGateway::new(&config.esplora_url, config.timeout)
        .map_err(WalletError::from)
        .context("failed to create HTTP client")
}

/// Prompt without echo.
fn prompt_secret(prompt: &str) -> Result<String> {
    rpassword::prompt_password(format!("{prompt}: ")).context("failed to read from terminal")
}

fn btc_amount(s: &str) -> std::result::Result<u64, String> {
    parse_btc(s).ok_or_else(|| format!("{s:?} is not a BTC amount with at most 8 decimals"))
}

fn sat_amount(s: &str) -> std::result::Result<u64, String> {
    parse_sats(s).ok_or_else(|| format!("{s:?} is not a whole number of satoshis"))
}

/// Initialize tracing with `RUST_LOG`, falling back to `default_level`.
fn init_logging(default_level: &str, json: bool) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
