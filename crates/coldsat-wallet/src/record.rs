//! The plaintext wallet record stored inside an encrypted container.

use bitcoin::Network;
use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use coldsat_core::constants::DERIVATION_PATH;

use crate::error::WalletError;
use crate::keys::SpendingKey;

/// Everything needed to restore and spend from a wallet.
///
/// Field names are the companion format's camelCase keys.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub name: String,
    pub mnemonic: String,
    pub passphrase: String,
    pub address: String,
    pub public_key: String,
    #[serde(rename = "privateKeyWIF")]
    pub private_key_wif: String,
    pub path: String,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl WalletRecord {
    /// Derive a record from a mnemonic, stamped with the current local time.
    pub fn derive(
        name: &str,
        mnemonic: &str,
        passphrase: &str,
        network: Network,
        strict_mnemonic: bool,
    ) -> Result<Self, WalletError> {
        let key = SpendingKey::from_mnemonic(mnemonic, passphrase, network, strict_mnemonic)?;
        Ok(Self {
            name: name.to_string(),
            mnemonic: mnemonic.to_string(),
            passphrase: passphrase.to_string(),
            address: key.address().to_string(),
            public_key: key.public_key_hex(),
            private_key_wif: key.wif(),
            path: DERIVATION_PATH.to_string(),
            created_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    /// The spending key held by this record, checked against its address.
    pub fn spending_key(&self, network: Network) -> Result<SpendingKey, WalletError> {
        let key = SpendingKey::from_wif(&self.private_key_wif, network)?;
        if key.address().to_string() != self.address {
            return Err(WalletError::KeyMismatch(format!(
                "private key controls {}, record says {}",
                key.address(),
                self.address
            )));
        }
        Ok(key)
    }
}

impl std::fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRecord")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("path", &self.path)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
