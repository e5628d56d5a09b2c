//! Read-only views of ledger data, as returned by the collaborator traits.
//!
//! These are deliberately flat: the ledger owns canonical encodings, the
//! bridge only needs the fields it re-shapes into Ethereum responses.

use crate::{NativeAddress, SealedAction};
use alloy::primitives::{Address, Bloom, Bytes, B256, U256};

/// A sealed block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderView {
    /// Block height.
    pub height: u64,
    /// Block hash.
    pub hash: B256,
    /// Parent block hash.
    pub parent_hash: B256,
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    /// Block producer account.
    pub producer: NativeAddress,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Total gas consumed by the block.
    pub gas_used: u64,
    /// Bloom filter over the block's logs.
    pub logs_bloom: Bloom,
    /// Root of the state after this block.
    pub state_root: B256,
    /// Root over the block's actions.
    pub transactions_root: B256,
    /// Root over the block's receipts.
    pub receipts_root: B256,
}

/// A block with its actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockView {
    /// The header.
    pub header: HeaderView,
    /// Actions in execution order.
    pub actions: Vec<SealedAction>,
}

/// A sealed action located in a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInfo {
    /// The action and its signature.
    pub sealed: SealedAction,
    /// Height of the containing block.
    pub block_height: u64,
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Position within the block.
    pub index: u64,
}

/// An event log emitted during action execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogView {
    /// Emitting contract.
    pub address: NativeAddress,
    /// Indexed topics, at most four.
    pub topics: Vec<B256>,
    /// Unindexed data.
    pub data: Bytes,
    /// Position within the block's log stream.
    pub log_index: u64,
}

/// The execution receipt of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptView {
    /// Hash of the action this receipt belongs to.
    pub action_hash: B256,
    /// `1` on success, `0` on failure.
    pub status: u64,
    /// Gas consumed by this action.
    pub gas_used: u64,
    /// Gas consumed by the block up to and including this action.
    pub cumulative_gas_used: u64,
    /// Address of the created contract, for creation actions.
    pub contract_address: Option<NativeAddress>,
    /// Logs emitted by this action.
    pub logs: Vec<LogView>,
    /// Height of the containing block.
    pub block_height: u64,
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Position of the action within the block.
    pub tx_index: u64,
}

/// A read-only contract call to simulate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    /// Caller account. Defaults to the zero address.
    pub from: Option<Address>,
    /// Callee contract. Absent for creation-style calls.
    pub to: Option<Address>,
    /// Gas budget requested by the caller, if any.
    pub gas: Option<u64>,
    /// Gas price offered, if any.
    pub gas_price: Option<U256>,
    /// Value sent with the call.
    pub value: U256,
    /// Call input data.
    pub data: Bytes,
}

/// The outcome of a simulated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulateOutcome {
    /// The call completed.
    Success {
        /// Returned data.
        return_data: Bytes,
        /// Gas consumed.
        gas_used: u64,
    },
    /// The call reverted.
    Revert {
        /// Human-readable revert reason, possibly empty.
        reason: String,
        /// Raw revert data.
        data: Bytes,
    },
}

impl SimulateOutcome {
    /// True if the call completed without reverting.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A log query against the indexer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// First block height to scan, inclusive.
    pub from: u64,
    /// Last block height to scan, inclusive.
    pub to: u64,
    /// Emitting contracts to match. Empty matches any.
    pub addresses: Vec<Address>,
    /// Positional topic constraints. An empty position matches any topic.
    pub topics: Vec<Vec<B256>>,
}

/// A log record as returned by the indexer, with block and action context
/// attached. Records are ordered by block height, then log index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedLog {
    /// Emitting contract, in Ethereum form.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<B256>,
    /// Unindexed data.
    pub data: Bytes,
    /// Height of the containing block.
    pub block_height: u64,
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Hash of the emitting action.
    pub action_hash: B256,
    /// Position of the emitting action within the block.
    pub tx_index: u64,
    /// Position within the block's log stream.
    pub log_index: u64,
}
