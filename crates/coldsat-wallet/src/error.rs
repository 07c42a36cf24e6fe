//! Wallet error types.
//!
//! Every variant has a stable machine code ([`WalletError::code`]) next to its
//! English `Display` message, so a host can localize without parsing text.

use std::fmt;

use coldsat_core::error::GatewayError;
use thiserror::Error;

/// Input-validation failures of a send request, checked before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationCode {
    RecipientAddressEmpty,
    AmountNotPositive,
    FeeTooLow,
    FeeTooHigh,
    MinerFeeTooLow,
    MinerFeeTooHigh,
    DeveloperFeeInvalid,
    DeveloperFeeTooHigh,
    DeveloperAddressEmpty,
    AmountTooSmall,
    InvalidRecipientAddress,
    InvalidDeveloperAddress,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecipientAddressEmpty => "RECIPIENT_ADDRESS_EMPTY",
            Self::AmountNotPositive => "AMOUNT_NOT_POSITIVE",
            Self::FeeTooLow => "FEE_TOO_LOW",
            Self::FeeTooHigh => "FEE_TOO_HIGH",
            Self::MinerFeeTooLow => "MINER_FEE_TOO_LOW",
            Self::MinerFeeTooHigh => "MINER_FEE_TOO_HIGH",
            Self::DeveloperFeeInvalid => "DEVELOPER_FEE_INVALID",
            Self::DeveloperFeeTooHigh => "DEVELOPER_FEE_TOO_HIGH",
            Self::DeveloperAddressEmpty => "DEVELOPER_ADDRESS_EMPTY",
            Self::AmountTooSmall => "AMOUNT_TOO_SMALL",
            Self::InvalidRecipientAddress => "INVALID_RECIPIENT_ADDRESS",
            Self::InvalidDeveloperAddress => "INVALID_DEVELOPER_ADDRESS",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::RecipientAddressEmpty => "recipient address is empty",
            Self::AmountNotPositive => "amount must be greater than zero",
            Self::FeeTooLow => "total fee is below 2000 sats",
            Self::FeeTooHigh => "total fee is above 50000 sats",
            Self::MinerFeeTooLow => "miner fee is below 1000 sats",
            Self::MinerFeeTooHigh => "miner fee is above 50000 sats",
            Self::DeveloperFeeInvalid => "developer fee must be greater than zero",
            Self::DeveloperFeeTooHigh => "developer fee is above 10000 sats",
            Self::DeveloperAddressEmpty => "developer address is empty",
            Self::AmountTooSmall => "amount is below the 546 sat dust threshold",
            Self::InvalidRecipientAddress => "recipient address is not a valid address for this network",
            Self::InvalidDeveloperAddress => "developer address is not a valid address for this network",
        };
        f.write_str(msg)
    }
}

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// A BIP-32 step produced an invalid key. Depth 0 is the master key.
    #[error("key derivation failed at depth {depth}: {reason}")]
    KeyDerivation { depth: usize, reason: String },

    /// The OS random source could not be read.
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    /// Mnemonic rejected under strict validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Container or decoded payload is malformed.
    #[error("malformed wallet file: {0}")]
    Format(String),

    /// Container declares a version other than the one supported.
    #[error("unsupported wallet file version: {0}")]
    UnsupportedVersion(String),

    /// Decryption produced invalid padding or unparseable plaintext.
    #[error("wrong password or corrupted wallet file")]
    BadPassword,

    /// Plaintext checksum does not match the stored one.
    #[error("wallet checksum mismatch")]
    Integrity,

    /// A send request failed input validation.
    #[error("{0}")]
    Validation(ValidationCode),

    /// Confirmed UTXOs do not cover amount plus fee.
    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds {
        /// Amount plus total fee, in sats.
        needed: u64,
        /// Sum of confirmed UTXOs, in sats.
        available: u64,
    },

    /// The address has no confirmed UTXOs at all.
    #[error("no confirmed funds available")]
    NoFunds,

    /// Provider failure while fetching chain data.
    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),

    /// The provider refused the transaction.
    #[error("broadcast rejected: {provider_message}")]
    Broadcast { provider_message: String },

    /// An input could not be signed.
    #[error("signing input {input}: {reason}")]
    Signing { input: usize, reason: String },

    /// Stored private key does not belong to the stored address.
    #[error("key mismatch: {0}")]
    KeyMismatch(String),

    /// A required argument was empty or unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl WalletError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::KeyDerivation { .. } => "KEY_DERIVATION",
            Self::EntropyUnavailable(_) => "ENTROPY_UNAVAILABLE",
            Self::InvalidMnemonic(_) => "INVALID_MNEMONIC",
            Self::Format(_) => "FORMAT",
            Self::UnsupportedVersion(_) => "UNSUPPORTED_VERSION",
            Self::BadPassword => "BAD_PASSWORD",
            Self::Integrity => "INTEGRITY",
            Self::Validation(code) => code.as_str(),
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::NoFunds => "NO_FUNDS",
            Self::Gateway(_) => "GATEWAY",
            Self::Broadcast { .. } => "BROADCAST",
            Self::Signing { .. } => "SIGNING",
            Self::KeyMismatch(_) => "KEY_MISMATCH",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Io(_) => "IO",
        }
    }

    /// The validation code, if this is a validation failure.
    pub fn validation_code(&self) -> Option<ValidationCode> {
        match self {
            Self::Validation(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
