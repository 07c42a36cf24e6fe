//! # coldsat-core
//! Foundation types, constants and traits shared by the coldsat wallet engine.
//!
//! # Modules
//!
//! - [`constants`]: Fee bounds, dust threshold, key-stretching and container parameters
//! - [`error`]: Gateway error type
//! - [`traits`]: The [`traits::BlockchainGateway`] contract consumed by the wallet
//! - [`types`]: UTXOs, previous outputs and address balances
//! - [`units`]: Satoshi/BTC conversion and formatting

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
pub mod units;
