//! Unsigned transaction assembly.
//!
//! Outputs are always laid out as:
//! 1. payment to the recipient
//! 2. beneficiary share of the fee, when the fee is split
//! 3. change back to the wallet, only when it is at least the dust threshold
//!
//! Sub-dust change is left to the miner.

use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use tracing::warn;

use coldsat_core::constants::DUST_THRESHOLD;
use coldsat_core::error::GatewayError;
use coldsat_core::types::Utxo;

use crate::coin_selection::CoinSelection;
use crate::error::WalletError;
use crate::policy::SendPlan;

/// A transaction with empty witnesses, plus the accounting behind it.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub tx: Transaction,
    /// Spent UTXOs, index-aligned with `tx.input`.
    pub inputs: Vec<Utxo>,
    /// Sum of input values.
    pub total_in: u64,
    /// Change paid back to the wallet, 0 if none.
    pub change: u64,
    /// Sub-dust change absorbed into the miner fee.
    pub forfeited: u64,
}

impl UnsignedTransaction {
    /// Implicit miner fee: inputs minus outputs.
    pub fn miner_fee(&self) -> u64 {
        let out: u64 = self.tx.output.iter().map(|o| o.value.to_sat()).sum();
        self.total_in.saturating_sub(out)
    }
}

pub struct TransactionBuilder;

impl TransactionBuilder {
    /// Lay out inputs and outputs for a validated plan.
    ///
    /// `change_script` is the wallet's own output script.
    pub fn build(
        plan: &SendPlan,
        selection: &CoinSelection,
        change_script: ScriptBuf,
    ) -> Result<UnsignedTransaction, WalletError> {
        let input = selection
            .selected
            .iter()
            .map(|utxo| -> Result<TxIn, WalletError> {
                // Txid parsing takes display (reversed) hex and stores wire order.
                let txid = Txid::from_str(&utxo.txid).map_err(|e| {
                    GatewayError::Malformed(format!("txid {:?}: {e}", utxo.txid))
                })?;
                Ok(TxIn {
                    previous_output: OutPoint {
                        txid,
                        vout: utxo.vout,
                    },
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::new(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let change = selection
            .total
            .checked_sub(plan.amount)
            .and_then(|v| v.checked_sub(plan.developer_fee()))
            .and_then(|v| v.checked_sub(plan.miner_fee))
            .ok_or(WalletError::InsufficientFunds {
                needed: plan.target(),
                available: selection.total,
            })?;

        let mut output = vec![TxOut {
            value: Amount::from_sat(plan.amount),
            script_pubkey: plan.recipient.script_pubkey(),
        }];
        if let Some((address, fee)) = &plan.developer {
            output.push(TxOut {
                value: Amount::from_sat(*fee),
                script_pubkey: address.script_pubkey(),
            });
        }

        let (change, forfeited) = if change >= DUST_THRESHOLD {
            output.push(TxOut {
                value: Amount::from_sat(change),
                script_pubkey: change_script,
            });
            (change, 0)
        } else {
            if change > 0 {
                warn!(change, "change below dust threshold left to the miner");
            }
            (0, change)
        };

        Ok(UnsignedTransaction {
            tx: Transaction {
                version: Version::ONE,
                lock_time: LockTime::ZERO,
                input,
                output,
            },
            inputs: selection.selected.clone(),
            total_in: selection.total,
            change,
            forfeited,
        })
    }
}
