//! Wallet composition: derivation, persistence, balance and sending.
//!
//! A [`Wallet`] owns one record and the key it holds. Every chain access
//! goes through a [`BlockchainGateway`] passed per call; the wallet keeps no
//! UTXO state or transaction history between calls.

use std::fmt;
use std::path::{Path, PathBuf};

use bitcoin::consensus::encode::serialize_hex;
use bitcoin::{Address, Network, Transaction, Txid};
use tracing::{debug, info, warn};

use coldsat_core::error::GatewayError;
use coldsat_core::traits::BlockchainGateway;
use coldsat_core::types::{AddressBalance, Utxo};

use crate::builder::TransactionBuilder;
use crate::coin_selection::CoinSelector;
use crate::config::EngineConfig;
use crate::container::{self, KdfParams};
use crate::error::WalletError;
use crate::keys::SpendingKey;
use crate::policy::SendRequest;
use crate::record::WalletRecord;
use crate::signer::InputSigner;
use crate::storage;

/// Progress of a single send. Any stage may end in an error; nothing resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStage {
    Validating,
    FetchingUtxos,
    Selecting,
    Assembling,
    Signing,
    Serializing,
    Broadcasting,
    Done,
}

impl fmt::Display for SendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validating => "validating",
            Self::FetchingUtxos => "fetching-utxos",
            Self::Selecting => "selecting",
            Self::Assembling => "assembling",
            Self::Signing => "signing",
            Self::Serializing => "serializing",
            Self::Broadcasting => "broadcasting",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// A fully witnessed transaction that has not been broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub tx: Transaction,
    /// Consensus serialization, hex encoded.
    pub raw_hex: String,
    pub txid: Txid,
    /// Spent UTXOs in input order.
    pub inputs: Vec<Utxo>,
    /// Change returned to the wallet, 0 if none.
    pub change: u64,
    /// Inputs minus outputs, including any forfeited sub-dust change.
    pub miner_fee: u64,
    pub developer_fee: u64,
}

/// Outcome of a broadcast send.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// Transaction id as reported by the provider.
    pub txid: String,
    pub signed: SignedTransaction,
}

/// A single-address wallet.
pub struct Wallet {
    record: WalletRecord,
    key: SpendingKey,
    network: Network,
}

impl Wallet {
    /// Derive a new wallet from a mnemonic.
    pub fn create(
        name: &str,
        mnemonic: &str,
        passphrase: &str,
        config: &EngineConfig,
    ) -> Result<Self, WalletError> {
        if name.trim().is_empty() {
            return Err(WalletError::InvalidInput("wallet name is empty".into()));
        }
        if mnemonic.trim().is_empty() {
            return Err(WalletError::InvalidInput("mnemonic is empty".into()));
        }
        let record = WalletRecord::derive(
            name,
            mnemonic,
            passphrase,
            config.network,
            config.strict_mnemonic_validation,
        )?;
        Self::from_record(record, config.network)
    }

    /// Wrap a decrypted record, checking its key against its address.
    pub fn from_record(record: WalletRecord, network: Network) -> Result<Self, WalletError> {
        let key = record.spending_key(network)?;
        Ok(Self {
            record,
            key,
            network,
        })
    }

    /// Encrypt and write to a new file under `dir`. Returns the file path.
    pub fn save(&self, dir: &Path, password: &str) -> Result<PathBuf, WalletError> {
        self.save_with(dir, password, &KdfParams::default())
    }

    /// [`Wallet::save`] with explicit key-stretching parameters.
    pub fn save_with(
        &self,
        dir: &Path,
        password: &str,
        params: &KdfParams,
    ) -> Result<PathBuf, WalletError> {
        if password.is_empty() {
            return Err(WalletError::InvalidInput("password is empty".into()));
        }
        let json = container::encrypt_with(&self.record, password, params)?;
        storage::save_new(dir, &self.record.name, &json)
    }

    /// Decrypt a wallet file and return its full record.
    pub fn check(path: &Path, password: &str) -> Result<WalletRecord, WalletError> {
        let bytes = storage::load(path)?;
        container::decrypt(&bytes, password)
    }

    /// Decrypt a wallet file into a wallet ready to sign.
    pub fn open(path: &Path, password: &str, network: Network) -> Result<Self, WalletError> {
        let record = Self::check(path, password)?;
        debug!(address = %record.address, "wallet opened");
        Self::from_record(record, network)
    }

    pub fn record(&self) -> &WalletRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn address(&self) -> &Address {
        self.key.address()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Private key in Wallet-Import-Format.
    pub fn wif(&self) -> String {
        self.key.wif()
    }

    /// Confirmed and unconfirmed balance of the wallet address.
    pub fn balance(&self, gateway: &dyn BlockchainGateway) -> Result<AddressBalance, WalletError> {
        let utxos = gateway.list_utxos(&self.address().to_string())?;
        Ok(AddressBalance::from_utxos(&utxos))
    }

    /// Validate, select, assemble and sign, without broadcasting.
    pub fn build_and_sign(
        &self,
        gateway: &dyn BlockchainGateway,
        request: &SendRequest,
    ) -> Result<SignedTransaction, WalletError> {
        enter(SendStage::Validating);
        let plan = request.validate(self.network)?;

        enter(SendStage::FetchingUtxos);
        let utxos = gateway.list_confirmed_utxos(&self.address().to_string())?;
        if utxos.is_empty() {
            return Err(WalletError::NoFunds);
        }

        enter(SendStage::Selecting);
        let selection = CoinSelector::select(&utxos, plan.target())?;
        debug!(inputs = selection.selected.len(), total = selection.total, target = plan.target(), "inputs selected");

        enter(SendStage::Assembling);
        let mut unsigned = TransactionBuilder::build(&plan, &selection, self.key.script_pubkey())?;

        enter(SendStage::Signing);
        let signer = InputSigner::new(&self.key);
        for (index, utxo) in unsigned.inputs.iter().enumerate() {
            let prevout = gateway.previous_output(&utxo.txid, utxo.vout)?;
            if prevout.value != utxo.value {
                return Err(GatewayError::Malformed(format!(
                    "{}:{} listed with {} sats but its output holds {}",
                    utxo.txid, utxo.vout, utxo.value, prevout.value
                ))
                .into());
            }
            signer.sign_input(&mut unsigned.tx, index, &prevout)?;
        }

        enter(SendStage::Serializing);
        let raw_hex = serialize_hex(&unsigned.tx);
        let txid = unsigned.tx.compute_txid();
        let miner_fee = unsigned.miner_fee();

        Ok(SignedTransaction {
            raw_hex,
            txid,
            inputs: unsigned.inputs,
            change: unsigned.change,
            miner_fee,
            developer_fee: plan.developer_fee(),
            tx: unsigned.tx,
        })
    }

    /// Build, sign and broadcast a payment.
    ///
    /// A provider refusal becomes [`WalletError::Broadcast`] carrying the
    /// provider's message unchanged. Nothing is retried.
    pub fn send(
        &self,
        gateway: &dyn BlockchainGateway,
        request: &SendRequest,
    ) -> Result<SendReceipt, WalletError> {
        let signed = self.build_and_sign(gateway, request)?;

        enter(SendStage::Broadcasting);
        let txid = gateway.broadcast(&signed.raw_hex).map_err(|e| match e {
            GatewayError::Rejected(provider_message) => WalletError::Broadcast { provider_message },
            other => WalletError::Gateway(other),
        })?;
        if txid != signed.txid.to_string() {
            warn!(provider = %txid, local = %signed.txid, "provider reported a different txid");
        }

        enter(SendStage::Done);
        info!(%txid, fee = signed.miner_fee, change = signed.change, "transaction broadcast");
        Ok(SendReceipt { txid, signed })
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("name", &self.record.name)
            .field("address", &self.record.address)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

fn enter(stage: SendStage) {
    debug!(%stage, "send stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use coldsat_core::types::PreviousOutput;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";
    const RECIPIENT: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn fast() -> KdfParams {
        KdfParams {
            iterations: 1_000,
            ..KdfParams::default()
        }
    }

    struct Chain {
        script: Vec<u8>,
        utxos: Vec<Utxo>,
        reply: Result<String, GatewayError>,
        sent: Mutex<Vec<String>>,
    }

    impl BlockchainGateway for Chain {
        fn list_utxos(&self, _address: &str) -> Result<Vec<Utxo>, GatewayError> {
            Ok(self.utxos.clone())
        }

        fn previous_output(&self, txid: &str, vout: u32) -> Result<PreviousOutput, GatewayError> {
            self.utxos
                .iter()
                .find(|u| u.txid == txid && u.vout == vout)
                .map(|u| PreviousOutput {
                    script_pubkey: self.script.clone(),
                    value: u.value,
                })
                .ok_or_else(|| GatewayError::NotFound(format!("{txid}:{vout}")))
        }

        fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError> {
            self.sent.lock().unwrap().push(raw_tx_hex.to_string());
            self.reply.clone()
        }
    }

    fn wallet() -> Wallet {
        Wallet::create("main", ABANDON, "", &EngineConfig::default()).unwrap()
    }

    fn chain(w: &Wallet, values: &[(u64, bool)]) -> Chain {
        Chain {
            script: w.address().script_pubkey().to_bytes(),
            utxos: values
                .iter()
                .enumerate()
                .map(|(i, (v, c))| Utxo::new(hex::encode([i as u8 + 1; 32]), 0, *v, *c))
                .collect(),
            reply: Ok("txid-from-provider".into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn create_rejects_empty_inputs() {
        let cfg = EngineConfig::default();
        assert_eq!(Wallet::create(" ", ABANDON, "", &cfg).unwrap_err().code(), "INVALID_INPUT");
        assert_eq!(Wallet::create("w", "", "", &cfg).unwrap_err().code(), "INVALID_INPUT");
    }

    #[test]
    fn save_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let w = wallet();
        let path = w.save_with(dir.path(), "pw", &fast()).unwrap();
        let opened = Wallet::open(&path, "pw", Network::Bitcoin).unwrap();
        assert_eq!(opened.address(), w.address());
        assert_eq!(opened.wif(), w.wif());
        assert_eq!(Wallet::check(&path, "pw").unwrap(), *w.record());
    }

    #[test]
    fn empty_password_refused_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let err = wallet().save_with(dir.path(), "", &fast()).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn balance_counts_both_kinds() {
        let w = wallet();
        let gw = chain(&w, &[(10_000, true), (4_000, false)]);
        let bal = w.balance(&gw).unwrap();
        assert_eq!(bal.confirmed, 10_000);
        assert_eq!(bal.unconfirmed, 4_000);
        assert_eq!(bal.confirmed_utxos, 1);
    }

    #[test]
    fn send_broadcasts_signed_hex() {
        let w = wallet();
        let gw = chain(&w, &[(100_000, true)]);
        let receipt = w.send(&gw, &SendRequest::new(RECIPIENT, 10_000, 2_000)).unwrap();
        assert_eq!(receipt.txid, "txid-from-provider");
        assert_eq!(gw.sent.lock().unwrap().as_slice(), &[receipt.signed.raw_hex.clone()]);
        assert_eq!(receipt.signed.change, 88_000);
        assert_eq!(receipt.signed.miner_fee, 2_000);
    }

    #[test]
    fn rejection_text_is_passed_through() {
        let w = wallet();
        let mut gw = chain(&w, &[(100_000, true)]);
        gw.reply = Err(GatewayError::Rejected("bad-txns-inputs-missingorspent".into()));
        let err = w.send(&gw, &SendRequest::new(RECIPIENT, 10_000, 2_000)).unwrap_err();
        assert_eq!(
            err,
            WalletError::Broadcast {
                provider_message: "bad-txns-inputs-missingorspent".into()
            }
        );
    }

    #[test]
    fn transport_failure_on_broadcast_is_gateway_error() {
        let w = wallet();
        let mut gw = chain(&w, &[(100_000, true)]);
        gw.reply = Err(GatewayError::Transport("timed out".into()));
        let err = w.send(&gw, &SendRequest::new(RECIPIENT, 10_000, 2_000)).unwrap_err();
        assert_eq!(err.code(), "GATEWAY");
    }

    #[test]
    fn no_confirmed_utxos_is_no_funds() {
        let w = wallet();
        let gw = chain(&w, &[(100_000, false)]);
        let err = w.build_and_sign(&gw, &SendRequest::new(RECIPIENT, 10_000, 2_000)).unwrap_err();
        assert_eq!(err, WalletError::NoFunds);
    }

    #[test]
    fn validation_happens_before_any_fetch() {
        let w = wallet();
        let gw = chain(&w, &[]);
        let err = w.send(&gw, &SendRequest::new(RECIPIENT, 10_000, 1_999)).unwrap_err();
        assert_eq!(err.code(), "FEE_TOO_LOW");
        assert!(gw.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn prevout_value_mismatch_is_gateway_error() {
        struct Lying(Chain);
        impl BlockchainGateway for Lying {
            fn list_utxos(&self, a: &str) -> Result<Vec<Utxo>, GatewayError> {
                self.0.list_utxos(a)
            }
            fn previous_output(&self, txid: &str, vout: u32) -> Result<PreviousOutput, GatewayError> {
                let mut p = self.0.previous_output(txid, vout)?;
                p.value += 1;
                Ok(p)
            }
            fn broadcast(&self, raw: &str) -> Result<String, GatewayError> {
                self.0.broadcast(raw)
            }
        }
        let w = wallet();
        let gw = Lying(chain(&w, &[(100_000, true)]));
        let err = w.build_and_sign(&gw, &SendRequest::new(RECIPIENT, 10_000, 2_000)).unwrap_err();
        assert_eq!(err.code(), "GATEWAY");
    }

    #[test]
    fn stage_names() {
        assert_eq!(SendStage::FetchingUtxos.to_string(), "fetching-utxos");
        assert_eq!(SendStage::Done.to_string(), "done");
    }
}
