//! Collaborator traits through which the bridge consumes the ledger.
//!
//! The bridge never owns chain state. Everything it serves is read through
//! [`LedgerReader`], submitted through [`ActionPool`], or scanned through
//! [`LogIndexer`]; failures propagate to the caller unretried.

use crate::{
    ActionInfo, BlockView, CallRequest, HeaderView, IndexedLog, LogQuery, NativeAddress,
    ReceiptView, SealedAction, SimulateOutcome,
};
use alloy::primitives::{Bytes, B256, U256};
use async_trait::async_trait;

/// Failure surfaced by the ledger or the indexer.
///
/// Absent data is not an error: lookups return `Ok(None)` (or the account
/// defaults, for state queries) when nothing is found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The backend failed to answer.
    #[error("ledger backend failure: {0}")]
    Backend(String),
}

/// Rejection raised by the action pool on submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The action's nonce is below the account's next nonce.
    #[error("nonce too low")]
    NonceTooLow,
    /// The sender cannot cover value plus maximum fee.
    #[error("insufficient balance")]
    InsufficientBalance,
    /// The gas price is below the ledger's floor.
    #[error("gas price below minimum")]
    Underpriced,
    /// The signature does not verify against the sender.
    #[error("invalid signature")]
    InvalidSignature,
    /// The backend failed to answer.
    #[error("pool backend failure: {0}")]
    Backend(String),
}

/// Read access to sealed chain state.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Current tip height.
    async fn tip_height(&self) -> Result<u64, LedgerError>;

    /// Header at the given height.
    async fn header_by_height(&self, height: u64) -> Result<Option<HeaderView>, LedgerError>;

    /// Header with the given hash.
    async fn header_by_hash(&self, hash: B256) -> Result<Option<HeaderView>, LedgerError>;

    /// Block (with actions) at the given height.
    async fn block_by_height(&self, height: u64) -> Result<Option<BlockView>, LedgerError>;

    /// Block (with actions) with the given hash.
    async fn block_by_hash(&self, hash: B256) -> Result<Option<BlockView>, LedgerError>;

    /// Account balance at the given height. Zero for unknown accounts.
    async fn balance(&self, address: NativeAddress, height: u64) -> Result<U256, LedgerError>;

    /// Account nonce at the given height. Zero for unknown accounts.
    async fn nonce(&self, address: NativeAddress, height: u64) -> Result<u64, LedgerError>;

    /// Deployed bytecode at the given height. Empty for non-contracts.
    async fn code(&self, address: NativeAddress, height: u64) -> Result<Bytes, LedgerError>;

    /// Raw storage slot value at the given height. Zero for unset slots.
    async fn storage_at(
        &self,
        address: NativeAddress,
        slot: B256,
        height: u64,
    ) -> Result<B256, LedgerError>;

    /// Simulate a call against state at the given height, with the given gas
    /// budget. Side-effect free.
    async fn simulate(
        &self,
        call: CallRequest,
        gas_cap: u64,
        height: u64,
    ) -> Result<SimulateOutcome, LedgerError>;

    /// Locate a sealed action by hash.
    async fn action_by_hash(&self, hash: B256) -> Result<Option<ActionInfo>, LedgerError>;

    /// Execution receipt of the action with the given hash.
    async fn receipt_by_hash(&self, hash: B256) -> Result<Option<ReceiptView>, LedgerError>;
}

/// Submission access to the action pool.
#[async_trait]
pub trait ActionPool: Send + Sync {
    /// Admit a signed action for broadcast and inclusion.
    async fn submit(&self, action: SealedAction) -> Result<(), PoolError>;

    /// The pool's view of the account's next nonce, if it tracks pending
    /// actions for the account.
    async fn pending_nonce(&self, address: NativeAddress) -> Result<Option<u64>, PoolError>;
}

/// Range queries over indexed event logs.
#[async_trait]
pub trait LogIndexer: Send + Sync {
    /// All logs matching the query, ordered by block height then log index.
    async fn logs_in_range(&self, query: LogQuery) -> Result<Vec<IndexedLog>, LedgerError>;
}
