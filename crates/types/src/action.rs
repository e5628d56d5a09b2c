//! The native action model.
//!
//! An action is the ledger's signed instruction. The bridge only ever reads
//! actions (from blocks, the pool, or inbound raw transactions); validation
//! and execution belong to the ledger.

use crate::{constants, NativeAddress};
use alloy::primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Fields common to every action variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCore {
    /// Action format version.
    pub version: u32,
    /// Sender account nonce.
    pub nonce: u64,
    /// Maximum gas the sender allows this action to consume.
    pub gas_limit: u64,
    /// Price per gas unit, in the smallest native denomination.
    pub gas_price: U256,
}

/// The type-specific body of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPayload {
    /// Account-to-account value transfer.
    Transfer {
        /// Transferred amount.
        amount: U256,
        /// Recipient account, bech32-encoded. Never empty.
        recipient: String,
        /// Optional memo bytes carried with the transfer.
        payload: Bytes,
    },
    /// Contract call, or contract creation when `contract` is empty.
    Execution {
        /// Value sent along with the call.
        amount: U256,
        /// Callee contract, bech32-encoded. Empty denotes creation.
        contract: String,
        /// Call input data (or init code for creation).
        data: Bytes,
    },
    /// Staking protocol operation.
    ///
    /// Bridged over the Ethereum wire as a contract call against
    /// [`constants::STAKING_PROTOCOL_ADDRESS`]; the command bytes are the
    /// staking protocol's own encoding and are carried opaquely.
    Staking {
        /// Encoded staking command.
        command: Bytes,
    },
}

/// A native ledger action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Common fields.
    pub core: ActionCore,
    /// Variant-specific body.
    pub payload: ActionPayload,
}

impl Action {
    /// Create an action from its parts.
    pub const fn new(core: ActionCore, payload: ActionPayload) -> Self {
        Self { core, payload }
    }

    /// Sender account nonce.
    pub const fn nonce(&self) -> u64 {
        self.core.nonce
    }

    /// Gas limit.
    pub const fn gas_limit(&self) -> u64 {
        self.core.gas_limit
    }

    /// Gas price.
    pub const fn gas_price(&self) -> U256 {
        self.core.gas_price
    }

    /// Value moved by this action. Zero for staking operations, whose
    /// amounts live inside the command encoding.
    pub const fn amount(&self) -> U256 {
        match &self.payload {
            ActionPayload::Transfer { amount, .. } | ActionPayload::Execution { amount, .. } => {
                *amount
            }
            ActionPayload::Staking { .. } => U256::ZERO,
        }
    }

    /// Recipient account in bech32 form. Empty denotes contract creation.
    pub fn recipient(&self) -> &str {
        match &self.payload {
            ActionPayload::Transfer { recipient, .. } => recipient,
            ActionPayload::Execution { contract, .. } => contract,
            ActionPayload::Staking { .. } => constants::staking_protocol_bech32(),
        }
    }

    /// Variant-specific data bytes.
    pub fn data(&self) -> &[u8] {
        match &self.payload {
            ActionPayload::Transfer { payload, .. } => payload,
            ActionPayload::Execution { data, .. } => data,
            ActionPayload::Staking { command } => command,
        }
    }

    /// True if this is a contract-creation execution.
    pub fn is_creation(&self) -> bool {
        matches!(&self.payload, ActionPayload::Execution { contract, .. } if contract.is_empty())
    }

    /// Gas the ledger charges up front for this action: a flat base plus a
    /// per-byte charge on the variant data. This is the native admission
    /// cost, not the Ethereum-side cost model used by gas estimation.
    pub fn intrinsic_gas(&self) -> u64 {
        let per_byte = constants::TRANSFER_PAYLOAD_GAS.saturating_mul(self.data().len() as u64);
        constants::TRANSFER_BASE_GAS.saturating_add(per_byte)
    }
}

/// A signed action, as stored in blocks and the action pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedAction {
    /// The action body.
    pub action: Action,
    /// The sender recovered from the signature.
    pub sender: NativeAddress,
    /// 65-byte recoverable signature over the action.
    #[serde(with = "sig_hex")]
    pub signature: [u8; 65],
    /// Canonical action hash.
    pub hash: B256,
}

mod sig_hex {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(sig: &[u8; 65], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_prefixed(sig))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[u8; 65], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| de::Error::custom(format!("expected 65 bytes, got {}", b.len())))
    }
}
