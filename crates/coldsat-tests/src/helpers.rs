//! Shared fixtures and an in-memory blockchain gateway.

use std::collections::HashMap;
use std::sync::Mutex;

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Amount, Network, ScriptBuf, Transaction, ecdsa};
use coldsat_core::error::GatewayError;
use coldsat_core::traits::BlockchainGateway;
use coldsat_core::types::{PreviousOutput, Utxo};
use coldsat_wallet::{EngineConfig, KdfParams, SpendingKey, Wallet};

/// BIP-39 test mnemonic.
pub const ABANDON: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";

/// BIP-84 vector for [`ABANDON`], `m/84'/0'/0'/0/0`.
pub const ABANDON_ADDRESS: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";
pub const ABANDON_PUBKEY: &str = "0330d54fd0dd420a6e5f8d3624f5f3482cae350f79d5f0753bf5beef9c2d91af3c";
pub const ABANDON_WIF: &str = "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d";

/// BIP-173 P2WPKH example address, used as the payee.
pub const RECIPIENT: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

/// Few PBKDF2 rounds so container tests stay fast.
pub fn fast_kdf() -> KdfParams {
    KdfParams {
        iterations: 1_000,
        ..KdfParams::default()
    }
}

/// Mainnet wallet for [`ABANDON`] with an empty passphrase.
pub fn test_wallet() -> Wallet {
    Wallet::create("test wallet", ABANDON, "", &EngineConfig::default())
        .expect("test mnemonic derives")
}

/// A second mainnet address, for fee split beneficiaries.
pub fn developer_address() -> String {
    SpendingKey::from_mnemonic(ABANDON, "developer", Network::Bitcoin, false)
        .expect("test mnemonic derives")
        .address()
        .to_string()
}

/// Display-order txid made of one repeated byte.
pub fn txid(byte: u8) -> String {
    hex::encode([byte; 32])
}

/// Gateway serving a fixed UTXO set and recording broadcasts.
pub struct MockGateway {
    script: Vec<u8>,
    utxos: Vec<Utxo>,
    outputs: HashMap<(String, u32), PreviousOutput>,
    listing_error: Option<GatewayError>,
    broadcast_error: Option<GatewayError>,
    broadcasts: Mutex<Vec<String>>,
}

impl MockGateway {
    /// Empty gateway whose outputs pay to `wallet`'s address.
    pub fn for_wallet(wallet: &Wallet) -> Self {
        Self {
            script: wallet.address().script_pubkey().to_bytes(),
            utxos: Vec::new(),
            outputs: HashMap::new(),
            listing_error: None,
            broadcast_error: None,
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    /// Add a UTXO with a fresh txid.
    pub fn with_utxo(mut self, value: u64, confirmed: bool) -> Self {
        let id = txid(self.utxos.len() as u8 + 1);
        self.outputs.insert(
            (id.clone(), 0),
            PreviousOutput {
                script_pubkey: self.script.clone(),
                value,
            },
        );
        self.utxos.push(Utxo::new(id, 0, value, confirmed));
        self
    }

    pub fn with_utxos(self, values: &[(u64, bool)]) -> Self {
        values
            .iter()
            .fold(self, |gw, (value, confirmed)| gw.with_utxo(*value, *confirmed))
    }

    /// Refuse every broadcast with `message`.
    pub fn rejecting(mut self, message: &str) -> Self {
        self.broadcast_error = Some(GatewayError::Rejected(message.to_string()));
        self
    }

    /// Fail every UTXO listing with `error`.
    pub fn failing_listing(mut self, error: GatewayError) -> Self {
        self.listing_error = Some(error);
        self
    }

    /// Raw hex of every transaction submitted so far.
    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }
}

impl BlockchainGateway for MockGateway {
    fn list_utxos(&self, _address: &str) -> Result<Vec<Utxo>, GatewayError> {
        match &self.listing_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.utxos.clone()),
        }
    }

    fn previous_output(&self, txid: &str, vout: u32) -> Result<PreviousOutput, GatewayError> {
        self.outputs
            .get(&(txid.to_string(), vout))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("{txid}:{vout}")))
    }

    fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError> {
        self.broadcasts.lock().unwrap().push(raw_tx_hex.to_string());
        if let Some(e) = &self.broadcast_error {
            return Err(e.clone());
        }
        Ok(decode_tx(raw_tx_hex).compute_txid().to_string())
    }
}

/// Consensus-decode a hex transaction.
pub fn decode_tx(raw_hex: &str) -> Transaction {
    let bytes = hex::decode(raw_hex).expect("hex transaction");
    bitcoin::consensus::deserialize(&bytes).expect("consensus-valid transaction")
}

/// Check every input's witness against a BIP-143 sighash over `prevout_values`.
///
/// Panics on the first input that does not verify.
pub fn assert_witnesses_verify(tx: &Transaction, script: &ScriptBuf, prevout_values: &[u64]) {
    let secp = Secp256k1::verification_only();
    assert_eq!(tx.input.len(), prevout_values.len());
    for (i, value) in prevout_values.iter().enumerate() {
        let witness = &tx.input[i].witness;
        assert_eq!(witness.len(), 2, "input {i} witness items");
        let sig = ecdsa::Signature::from_slice(&witness[0]).expect("DER signature with sighash byte");
        assert_eq!(sig.sighash_type, EcdsaSighashType::All);
        let pubkey = bitcoin::secp256k1::PublicKey::from_slice(&witness[1]).expect("compressed pubkey");

        let sighash = SighashCache::new(tx)
            .p2wpkh_signature_hash(i, script, Amount::from_sat(*value), EcdsaSighashType::All)
            .expect("sighash");
        let msg = Message::from_digest(sighash.to_byte_array());
        secp.verify_ecdsa(&msg, &sig.signature, &pubkey)
            .unwrap_or_else(|e| panic!("input {i} signature: {e}"));
    }
}
