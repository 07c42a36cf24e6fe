//! CLI configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bitcoin::Network;
use coldsat_wallet::{EngineConfig, parse_network};

#[derive(Clone, Debug)]
pub struct Config {
    /// Network addresses and keys are encoded for.
    pub network: Network,
    /// Reject mnemonics that fail BIP-39 word or checksum validation.
    pub strict_mnemonic: bool,
    /// Directory new wallet files are written to.
    pub wallet_dir: PathBuf,
    /// Esplora API base URL.
    pub esplora_url: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let network = match lookup("COLDSAT_NETWORK") {
            Some(s) => parse_network(&s).context("COLDSAT_NETWORK")?,
            None => Network::Bitcoin,
        };

        let strict_mnemonic = match lookup("COLDSAT_STRICT_MNEMONIC") {
            Some(s) => parse_bool(&s).context("COLDSAT_STRICT_MNEMONIC must be true or false")?,
            None => false,
        };

        let wallet_dir = lookup("COLDSAT_WALLET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_wallet_dir);

        let esplora_url =
            lookup("COLDSAT_ESPLORA_URL").unwrap_or_else(|| default_esplora_url(network).to_string());

        let timeout_secs: u64 = lookup("COLDSAT_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("COLDSAT_TIMEOUT_SECS must be a positive integer")?;
        anyhow::ensure!(timeout_secs > 0, "COLDSAT_TIMEOUT_SECS must be a positive integer");

        Ok(Config {
            network,
            strict_mnemonic,
            wallet_dir,
            esplora_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            network: self.network,
            strict_mnemonic_validation: self.strict_mnemonic,
        }
    }
}

fn default_wallet_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coldsat-wallets")
}

/// Public Esplora instance for `network`. Regtest assumes a local electrs.
pub fn default_esplora_url(network: Network) -> &'static str {
    match network {
        Network::Testnet => coldsat_esplora::TESTNET_URL,
        Network::Signet => coldsat_esplora::SIGNET_URL,
        Network::Regtest => "http://127.0.0.1:3002",
        _ => coldsat_esplora::MAINNET_URL,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
