//! Contract between the wallet engine and a blockchain data provider.

use crate::error::GatewayError;
use crate::types::{PreviousOutput, Utxo};

/// Read access to the chain plus transaction broadcast.
///
/// The engine consumes this trait; it never implements transport itself.
/// All calls block the calling thread. Implementations should bound every
/// request with a timeout and report it as [`GatewayError::Transport`].
/// Nothing is retried by the engine.
pub trait BlockchainGateway: Send + Sync {
    /// Every unspent output paying to `address`, mined or not.
    fn list_utxos(&self, address: &str) -> Result<Vec<Utxo>, GatewayError>;

    /// Mined unspent outputs paying to `address`. The only outputs a send may spend.
    fn list_confirmed_utxos(&self, address: &str) -> Result<Vec<Utxo>, GatewayError> {
        Ok(self
            .list_utxos(address)?
            .into_iter()
            .filter(|u| u.confirmed)
            .collect())
    }

    /// Script and value of output `vout` of transaction `txid`.
    fn previous_output(&self, txid: &str, vout: u32) -> Result<PreviousOutput, GatewayError>;

    /// Submit a hex-encoded signed transaction. Returns the provider's txid.
    ///
    /// A refusal must be reported as [`GatewayError::Rejected`] with the
    /// provider's message unaltered.
    fn broadcast(&self, raw_tx_hex: &str) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Utxo>);

    impl BlockchainGateway for Fixed {
        fn list_utxos(&self, _address: &str) -> Result<Vec<Utxo>, GatewayError> {
            Ok(self.0.clone())
        }

        fn previous_output(&self, txid: &str, _vout: u32) -> Result<PreviousOutput, GatewayError> {
            Err(GatewayError::NotFound(txid.to_string()))
        }

        fn broadcast(&self, _raw_tx_hex: &str) -> Result<String, GatewayError> {
            Err(GatewayError::Rejected("unsupported".into()))
        }
    }

    #[test]
    fn confirmed_listing_drops_mempool_outputs() {
        let gw = Fixed(vec![
            Utxo::new("a1", 0, 1_000, true),
            Utxo::new("b2", 0, 9_000, false),
        ]);
        let confirmed = gw.list_confirmed_utxos("bc1q").unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].txid, "a1");
    }

    #[test]
    fn gateway_is_object_safe() {
        let gw: Box<dyn BlockchainGateway> = Box::new(Fixed(Vec::new()));
        assert!(gw.list_confirmed_utxos("bc1q").unwrap().is_empty());
    }
}
