//! Send request validation: fee bounds, fee split and dust.
//!
//! Checks run in a fixed order and the first failure wins. All of them happen
//! before any network access.

use std::str::FromStr;

use bitcoin::{Address, Network};

use coldsat_core::constants::{
    DUST_THRESHOLD, MAX_DEVELOPER_FEE, MAX_MINER_FEE, MAX_TOTAL_FEE, MIN_MINER_FEE, MIN_TOTAL_FEE,
};

use crate::error::{ValidationCode, WalletError};

/// A share of the total fee paid to a beneficiary instead of the miner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSplit {
    pub developer_address: String,
    /// Sats carved out of the total fee.
    pub developer_fee: u64,
}

/// What the caller asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub recipient: String,
    /// Sats delivered to the recipient.
    pub amount: u64,
    /// Everything the send costs on top of `amount`, developer share included.
    pub total_fee: u64,
    pub fee_split: Option<FeeSplit>,
}

/// A request that passed validation, with parsed addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPlan {
    pub recipient: Address,
    pub amount: u64,
    pub total_fee: u64,
    /// `(beneficiary, sats)` when the fee is split.
    pub developer: Option<(Address, u64)>,
    /// `total_fee` minus the developer share.
    pub miner_fee: u64,
}

impl SendPlan {
    /// Confirmed value the inputs must cover.
    pub fn target(&self) -> u64 {
        self.amount.saturating_add(self.total_fee)
    }

    pub fn developer_fee(&self) -> u64 {
        self.developer.as_ref().map_or(0, |(_, fee)| *fee)
    }
}

impl SendRequest {
    pub fn new(recipient: impl Into<String>, amount: u64, total_fee: u64) -> Self {
        Self {
            recipient: recipient.into(),
            amount,
            total_fee,
            fee_split: None,
        }
    }

    pub fn with_fee_split(mut self, developer_address: impl Into<String>, developer_fee: u64) -> Self {
        self.fee_split = Some(FeeSplit {
            developer_address: developer_address.into(),
            developer_fee,
        });
        self
    }

    /// Run every check and parse addresses for `network`.
    pub fn validate(&self, network: Network) -> Result<SendPlan, WalletError> {
        use ValidationCode::*;
        let fail = |code| Err(WalletError::Validation(code));

        if self.recipient.is_empty() {
            return fail(RecipientAddressEmpty);
        }
        if self.amount == 0 {
            return fail(AmountNotPositive);
        }
        if self.total_fee < MIN_TOTAL_FEE {
            return fail(FeeTooLow);
        }
        if self.total_fee > MAX_TOTAL_FEE {
            return fail(FeeTooHigh);
        }

        let mut miner_fee = self.total_fee;
        if let Some(split) = &self.fee_split {
            match self.total_fee.checked_sub(split.developer_fee) {
                Some(fee) if fee < MIN_MINER_FEE => return fail(MinerFeeTooLow),
                None => return fail(MinerFeeTooLow),
                Some(fee) if fee > MAX_MINER_FEE => return fail(MinerFeeTooHigh),
                Some(fee) => miner_fee = fee,
            }
            if split.developer_fee == 0 {
                return fail(DeveloperFeeInvalid);
            }
            if split.developer_fee > MAX_DEVELOPER_FEE {
                return fail(DeveloperFeeTooHigh);
            }
            if split.developer_address.is_empty() {
                return fail(DeveloperAddressEmpty);
            }
        }

        if self.amount < DUST_THRESHOLD {
            return fail(AmountTooSmall);
        }

        let recipient = parse_address(&self.recipient, network, InvalidRecipientAddress)?;
        let developer = match &self.fee_split {
            Some(split) => Some((
                parse_address(&split.developer_address, network, InvalidDeveloperAddress)?,
                split.developer_fee,
            )),
            None => None,
        };

        Ok(SendPlan {
            recipient,
            amount: self.amount,
            total_fee: self.total_fee,
            developer,
            miner_fee,
        })
    }
}

fn parse_address(s: &str, network: Network, code: ValidationCode) -> Result<Address, WalletError> {
    Address::from_str(s)
        .ok()
        .and_then(|a| a.require_network(network).ok())
        .ok_or(WalletError::Validation(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPIENT: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";
    const DEV: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn code(req: &SendRequest) -> Option<&'static str> {
        req.validate(Network::Bitcoin).err().map(|e| e.code())
    }

    #[test]
    fn fee_bounds_are_inclusive() {
        assert_eq!(code(&SendRequest::new(RECIPIENT, 10_000, 2_000)), None);
        assert_eq!(code(&SendRequest::new(RECIPIENT, 10_000, 50_000)), None);
        assert_eq!(code(&SendRequest::new(RECIPIENT, 10_000, 1_999)), Some("FEE_TOO_LOW"));
        assert_eq!(code(&SendRequest::new(RECIPIENT, 10_000, 50_001)), Some("FEE_TOO_HIGH"));
    }

    #[test]
    fn dust_threshold() {
        assert_eq!(code(&SendRequest::new(RECIPIENT, 545, 2_000)), Some("AMOUNT_TOO_SMALL"));
        assert_eq!(code(&SendRequest::new(RECIPIENT, 546, 2_000)), None);
        assert_eq!(code(&SendRequest::new(RECIPIENT, 0, 2_000)), Some("AMOUNT_NOT_POSITIVE"));
    }

    #[test]
    fn empty_recipient_checked_first() {
        assert_eq!(code(&SendRequest::new("", 0, 0)), Some("RECIPIENT_ADDRESS_EMPTY"));
    }

    #[test]
    fn fee_checked_before_dust() {
        assert_eq!(code(&SendRequest::new(RECIPIENT, 1, 1)), Some("FEE_TOO_LOW"));
    }

    #[test]
    fn fee_split_bounds() {
        let ok = SendRequest::new(RECIPIENT, 10_000, 5_000).with_fee_split(DEV, 2_000);
        let plan = ok.validate(Network::Bitcoin).unwrap();
        assert_eq!(plan.miner_fee, 3_000);
        assert_eq!(plan.developer_fee(), 2_000);
        assert_eq!(plan.target(), 15_000);

        let low_miner = SendRequest::new(RECIPIENT, 10_000, 5_000).with_fee_split(DEV, 4_001);
        assert_eq!(code(&low_miner), Some("MINER_FEE_TOO_LOW"));

        let over_total = SendRequest::new(RECIPIENT, 10_000, 5_000).with_fee_split(DEV, 9_000);
        assert_eq!(code(&over_total), Some("MINER_FEE_TOO_LOW"));

        let zero = SendRequest::new(RECIPIENT, 10_000, 5_000).with_fee_split(DEV, 0);
        assert_eq!(code(&zero), Some("DEVELOPER_FEE_INVALID"));

        let high = SendRequest::new(RECIPIENT, 10_000, 50_000).with_fee_split(DEV, 10_001);
        assert_eq!(code(&high), Some("DEVELOPER_FEE_TOO_HIGH"));

        let max = SendRequest::new(RECIPIENT, 10_000, 50_000).with_fee_split(DEV, 10_000);
        assert_eq!(code(&max), None);

        let no_addr = SendRequest::new(RECIPIENT, 10_000, 5_000).with_fee_split("", 2_000);
        assert_eq!(code(&no_addr), Some("DEVELOPER_ADDRESS_EMPTY"));
    }

    #[test]
    fn miner_fee_floor_is_inclusive() {
        let req = SendRequest::new(RECIPIENT, 10_000, 3_000).with_fee_split(DEV, 2_000);
        assert_eq!(req.validate(Network::Bitcoin).unwrap().miner_fee, 1_000);
    }

    #[test]
    fn addresses_must_parse_for_the_network() {
        assert_eq!(
            code(&SendRequest::new("not-an-address", 10_000, 2_000)),
            Some("INVALID_RECIPIENT_ADDRESS")
        );
        let testnet = crate::keys::SpendingKey::from_mnemonic("zoo", "", Network::Testnet, false)
            .unwrap()
            .address()
            .to_string();
        assert_eq!(
            code(&SendRequest::new(testnet, 10_000, 2_000)),
            Some("INVALID_RECIPIENT_ADDRESS")
        );
        let bad_dev = SendRequest::new(RECIPIENT, 10_000, 5_000).with_fee_split("nope", 2_000);
        assert_eq!(code(&bad_dev), Some("INVALID_DEVELOPER_ADDRESS"));
    }

    #[test]
    fn no_split_means_whole_fee_to_miner() {
        let plan = SendRequest::new(RECIPIENT, 10_000, 4_000)
            .validate(Network::Bitcoin)
            .unwrap();
        assert_eq!(plan.miner_fee, 4_000);
        assert_eq!(plan.developer, None);
    }
}
