//! BIP-143 signing of P2WPKH inputs.

use bitcoin::ecdsa;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1, SignOnly};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Amount, ScriptBuf, Transaction, Witness};

use coldsat_core::types::PreviousOutput;

use crate::error::WalletError;
use crate::keys::SpendingKey;

/// Signs inputs that spend outputs paying to one key.
pub struct InputSigner {
    secp: Secp256k1<SignOnly>,
    key: SpendingKey,
    own_script: ScriptBuf,
}

impl InputSigner {
    pub fn new(key: &SpendingKey) -> Self {
        Self {
            secp: Secp256k1::signing_only(),
            own_script: key.script_pubkey(),
            key: key.clone(),
        }
    }

    /// Sign input `index` with SIGHASH_ALL and set its witness to
    /// `[DER signature || 0x01, compressed pubkey]`.
    ///
    /// The segwit sighash ignores other inputs' witnesses, so inputs can be
    /// signed one at a time in any state of the transaction.
    pub fn sign_input(
        &self,
        tx: &mut Transaction,
        index: usize,
        prevout: &PreviousOutput,
    ) -> Result<(), WalletError> {
        let fail = |reason: String| WalletError::Signing { input: index, reason };

        if index >= tx.input.len() {
            return Err(fail(format!("transaction has {} inputs", tx.input.len())));
        }
        let script = ScriptBuf::from_bytes(prevout.script_pubkey.clone());
        if script != self.own_script {
            return Err(fail(format!(
                "previous output script {} does not pay to {}",
                script.to_hex_string(),
                self.key.address()
            )));
        }

        let sighash = SighashCache::new(&*tx)
            .p2wpkh_signature_hash(index, &script, Amount::from_sat(prevout.value), EcdsaSighashType::All)
            .map_err(|e| fail(e.to_string()))?;
        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = ecdsa::Signature::sighash_all(
            self.secp.sign_ecdsa(&msg, &self.key.private_key().inner),
        );

        tx.input[index].witness = Witness::from_slice(&[
            signature.to_vec(),
            self.key.public_key().to_bytes().to_vec(),
        ]);
        Ok(())
    }
}
