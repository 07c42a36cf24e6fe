//! # coldsat-wallet — single-address native-segwit wallet.
//!
//! Derives one BIP-84 key from a mnemonic, persists it in a
//! password-encrypted container that other implementations can read, and
//! builds, signs and broadcasts P2WPKH transactions with an optional fee
//! split between the miner and a beneficiary.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` and the fixed validation codes
//! - [`mnemonic`] — BIP-39 generation and seed stretching
//! - [`keys`] — `Seed`, `SpendingKey`, BIP-32 path walk
//! - [`record`] — plaintext `WalletRecord`
//! - [`encryption`] — PBKDF2 key stretching and AES-256-CBC
//! - [`container`] — versioned JSON wallet container
//! - [`storage`] — collision-free wallet files
//! - [`coin_selection`] — largest-first confirmed UTXO selection
//! - [`policy`] — send request validation
//! - [`builder`] — unsigned transaction layout
//! - [`signer`] — BIP-143 input signing
//! - [`password`] — password strength policy
//! - [`config`] — `EngineConfig`
//! - [`wallet`] — high-level wallet composition

pub mod builder;
pub mod coin_selection;
pub mod config;
pub mod container;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod password;
pub mod policy;
pub mod record;
pub mod signer;
pub mod storage;
pub mod wallet;

pub use builder::{TransactionBuilder, UnsignedTransaction};
pub use coin_selection::{CoinSelection, CoinSelector};
pub use config::{EngineConfig, parse_network};
pub use container::{Container, KdfParams};
pub use error::{ValidationCode, WalletError};
pub use keys::{Seed, SpendingKey};
pub use password::{PasswordIssue, PasswordReport, Strength};
pub use policy::{FeeSplit, SendPlan, SendRequest};
pub use record::WalletRecord;
pub use signer::InputSigner;
pub use wallet::{SendReceipt, SendStage, SignedTransaction, Wallet};
