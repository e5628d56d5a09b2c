//! Errors for the `eth_` endpoints.

use alloy::{eips::BlockId, primitives::Bytes};
use meridian_cache::CacheError;
use meridian_codec::CodecError;
use meridian_types::{AddressError, LedgerError, PoolError};

/// Errors that can occur while serving `eth_` requests.
///
/// Handlers report these as the JSON-RPC error message via
/// [`EthError::into_string`]; reverts additionally carry structured data and
/// are mapped to a payload by the call endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EthError {
    /// Ledger backend failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// Action pool rejection or failure.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Raw transaction failed to decode or verify.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Cache read or write failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// JSON encoding failure while caching or loading cached state.
    #[error(transparent)]
    Encoding(#[from] serde_json::Error),
    /// Address conversion failure.
    #[error(transparent)]
    Address(#[from] AddressError),
    /// The referenced filter does not exist or has expired.
    #[error("filter not found")]
    FilterNotFound,
    /// A log operation was invoked on a block filter.
    #[error("filter is not a log filter")]
    NotLogFilter,
    /// The referenced block does not exist.
    #[error("header not found for block: {0}")]
    HeaderNotFound(BlockId),
    /// The requested range ends before it starts.
    #[error("invalid block range: end precedes start")]
    InvalidRange,
    /// The requested range spans more blocks than the server allows.
    #[error("block range too wide: limit is {0} blocks")]
    RangeTooWide(u64),
    /// The response would carry more logs than the server allows.
    #[error("query returned more than {0} results")]
    TooManyLogs(usize),
    /// Simulation reverted.
    #[error("execution reverted: {reason}")]
    Revert {
        /// Human-readable revert reason.
        reason: String,
        /// Raw revert data, when the ledger surfaced any.
        data: Bytes,
    },
}

impl EthError {
    /// Turn into a string by value, allows for `.map_err(EthError::into_string)`
    /// to be used.
    pub fn into_string(self) -> String {
        ToString::to_string(&self)
    }
}
