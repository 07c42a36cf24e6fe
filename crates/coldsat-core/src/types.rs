//! Data carried between the wallet engine and a blockchain gateway.

use serde::{Deserialize, Serialize};

/// An unspent output owned by the wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Funding transaction id in display (big-endian hex) order.
    pub txid: String,
    /// Output index within the funding transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
    /// Whether the funding transaction is mined.
    pub confirmed: bool,
}

impl Utxo {
    pub fn new(txid: impl Into<String>, vout: u32, value: u64, confirmed: bool) -> Self {
        Self {
            txid: txid.into(),
            vout,
            value,
            confirmed,
        }
    }
}

/// Script and value of the output a UTXO was created by.
///
/// Needed to compute a segwit signature hash for the input spending it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousOutput {
    pub script_pubkey: Vec<u8>,
    pub value: u64,
}

/// Balance summary of one address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBalance {
    /// Sum of confirmed UTXOs in satoshis.
    pub confirmed: u64,
    /// Sum of unconfirmed UTXOs in satoshis.
    pub unconfirmed: u64,
    /// Number of confirmed (spendable) UTXOs.
    pub confirmed_utxos: usize,
}

impl AddressBalance {
    /// Summarize a UTXO listing that includes both confirmed and mempool outputs.
    pub fn from_utxos(utxos: &[Utxo]) -> Self {
        utxos.iter().fold(Self::default(), |mut acc, u| {
            if u.confirmed {
                acc.confirmed = acc.confirmed.saturating_add(u.value);
                acc.confirmed_utxos += 1;
            } else {
                acc.unconfirmed = acc.unconfirmed.saturating_add(u.value);
            }
            acc
        })
    }

    pub fn total(&self) -> u64 {
        self.confirmed.saturating_add(self.unconfirmed)
    }
}
