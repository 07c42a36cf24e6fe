//! Engine settings supplied by the host.

use std::str::FromStr;

use bitcoin::Network;

use crate::error::WalletError;

/// Parameters the engine receives instead of inspecting the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Network addresses and WIF keys are encoded for.
    pub network: Network,
    /// Reject mnemonics with unknown words or a bad checksum.
    ///
    /// Off by default: any phrase yields a wallet, as in the companion format.
    pub strict_mnemonic_validation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            strict_mnemonic_validation: false,
        }
    }
}

/// Parse a network name: `mainnet`/`bitcoin`, `testnet`, `signet`, `regtest`.
pub fn parse_network(s: &str) -> Result<Network, WalletError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "mainnet" | "main" | "bitcoin" => Ok(Network::Bitcoin),
        other => Network::from_str(other)
            .map_err(|_| WalletError::InvalidInput(format!("unknown network {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lenient_mainnet() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.network, Network::Bitcoin);
        assert!(!cfg.strict_mnemonic_validation);
    }

    #[test]
    fn network_names() {
        assert_eq!(parse_network("mainnet").unwrap(), Network::Bitcoin);
        assert_eq!(parse_network("Bitcoin").unwrap(), Network::Bitcoin);
        assert_eq!(parse_network("testnet").unwrap(), Network::Testnet);
        assert_eq!(parse_network("signet").unwrap(), Network::Signet);
        assert_eq!(parse_network(" regtest ").unwrap(), Network::Regtest);
        assert!(parse_network("dogecoin").is_err());
    }
}
