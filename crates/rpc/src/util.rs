use meridian_types::constants::{BASE_TX_GAS, CREATION_GAS, TX_DATA_NONZERO_GAS, TX_DATA_ZERO_GAS};
use std::{iter::StepBy, ops::RangeInclusive};

/// Await a spawned handler task that yields a `Result<T, String>`, mapping
/// panics and client disconnects to a string error.
macro_rules! await_jh_option {
    ($h:expr) => {
        match $h.await {
            Ok(Some(res)) => res,
            _ => return Err("task panicked or was cancelled".to_string()),
        }
    };
}
pub(crate) use await_jh_option;

/// Await a spawned handler task that yields a [`ajj::ResponsePayload`],
/// mapping panics and client disconnects to an internal error payload.
macro_rules! await_jh_option_response {
    ($h:expr) => {
        match $h.await {
            Ok(Some(res)) => res,
            _ => {
                return ajj::ResponsePayload::internal_error_message(std::borrow::Cow::Borrowed(
                    "task panicked or was cancelled",
                ))
            }
        }
    };
}
pub(crate) use await_jh_option_response;

/// The intrinsic gas of a call: the amount charged before any execution
/// happens. Base transfer cost, plus per-byte calldata cost, plus the
/// creation surcharge when there is no callee.
pub(crate) fn intrinsic_gas(data: &[u8], is_creation: bool) -> u64 {
    let data_gas: u64 = data
        .iter()
        .map(|b| if *b == 0 { TX_DATA_ZERO_GAS } else { TX_DATA_NONZERO_GAS })
        .sum();
    BASE_TX_GAS + data_gas + if is_creation { CREATION_GAS } else { 0 }
}

/// An iterator that yields _inclusive_ block ranges of a given step size
#[derive(Debug)]
pub(crate) struct BlockRangeInclusiveIter {
    iter: StepBy<RangeInclusive<u64>>,
    step: u64,
    end: u64,
}

impl BlockRangeInclusiveIter {
    pub(crate) fn new(range: RangeInclusive<u64>, step: u64) -> Self {
        Self { end: *range.end(), iter: range.step_by(step as usize + 1), step }
    }
}

impl Iterator for BlockRangeInclusiveIter {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.iter.next()?;
        let end = (start + self.step).min(self.end);
        if start > end {
            return None;
        }
        Some((start, end))
    }
}
