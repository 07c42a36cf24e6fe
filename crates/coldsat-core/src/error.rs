//! Error types shared across coldsat crates.
use thiserror::Error;

/// Failure reported by a [`crate::traits::BlockchainGateway`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failure: connection refused, timeout, TLS.
    #[error("transport: {0}")]
    Transport(String),

    /// The provider answered with an unexpected HTTP status.
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider's response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The requested transaction or output does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The provider refused a broadcast. Holds the provider's text verbatim.
    #[error("{0}")]
    Rejected(String),
}
