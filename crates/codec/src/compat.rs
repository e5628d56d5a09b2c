//! Capability trait for actions that cross the Ethereum wire.

use alloy::primitives::U256;
use meridian_types::Action;

/// Field access an action must expose to be representable as an Ethereum
/// legacy transaction.
///
/// Every accessor is expected to be cheap. The six fields are the complete
/// Ethereum-visible surface of an action; anything else the action carries
/// stays on the native side of the bridge.
pub trait EthCompat {
    /// Sender account nonce.
    fn nonce(&self) -> u64;

    /// Price per gas unit.
    fn gas_price(&self) -> U256;

    /// Maximum gas the action may consume.
    fn gas_limit(&self) -> u64;

    /// Recipient account, bech32-encoded. Empty denotes contract creation.
    fn recipient(&self) -> &str;

    /// Transferred value.
    fn amount(&self) -> U256;

    /// Data payload.
    fn payload(&self) -> &[u8];
}

impl EthCompat for Action {
    fn nonce(&self) -> u64 {
        self.core.nonce
    }

    fn gas_price(&self) -> U256 {
        self.core.gas_price
    }

    fn gas_limit(&self) -> u64 {
        self.core.gas_limit
    }

    fn recipient(&self) -> &str {
        Action::recipient(self)
    }

    fn amount(&self) -> U256 {
        Action::amount(self)
    }

    fn payload(&self) -> &[u8] {
        self.data()
    }
}
