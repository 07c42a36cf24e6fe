//! Greedy largest-first coin selection.
//!
//! Confirmed UTXOs are sorted by value descending and taken until their sum
//! covers the target. This is not change-minimizing or privacy-aware.

use coldsat_core::types::Utxo;

use crate::error::WalletError;

/// Result of coin selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
    /// Selected UTXOs in spend order (largest first).
    pub selected: Vec<Utxo>,
    /// Sum of selected values in sats.
    pub total: u64,
}

pub struct CoinSelector;

impl CoinSelector {
    /// Select confirmed UTXOs whose sum is at least `target`.
    ///
    /// Unconfirmed entries are ignored. Fails with [`WalletError::NoFunds`]
    /// on an empty set and [`WalletError::InsufficientFunds`] when all
    /// confirmed value is not enough.
    pub fn select(utxos: &[Utxo], target: u64) -> Result<CoinSelection, WalletError> {
        if utxos.is_empty() {
            return Err(WalletError::NoFunds);
        }

        let mut candidates: Vec<&Utxo> = utxos.iter().filter(|u| u.confirmed).collect();
        // Stable: equal values keep provider order.
        candidates.sort_by(|a, b| b.value.cmp(&a.value));

        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for utxo in candidates {
            selected.push(utxo.clone());
            total = total.saturating_add(utxo.value);
            if total >= target {
                return Ok(CoinSelection { selected, total });
            }
        }

        Err(WalletError::InsufficientFunds {
            needed: target,
            available: total,
        })
    }
}
