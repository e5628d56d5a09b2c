use alloy::rpc::types::Filter;
use serde::{Deserialize, Serialize};

/// The different kinds of filters that can be installed.
///
/// Pending transaction filters are not supported by the bridge: the pool does
/// not stream admissions, so there is nothing to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum InterestKind {
    /// A log filter with its match criteria.
    Log(Box<Filter>),
    /// A new-blocks filter.
    Block,
}

impl InterestKind {
    /// True if this is a log filter.
    pub(crate) const fn is_log(&self) -> bool {
        matches!(self, Self::Log(_))
    }
}
