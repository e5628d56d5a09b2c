//! Data model for the Meridian web3 bridge: native addresses, the action
//! model, read-only ledger views, and the collaborator traits the RPC
//! surface is served from.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod action;
pub use action::{Action, ActionCore, ActionPayload, SealedAction};

mod address;
pub use address::{AddressError, NativeAddress, ADDRESS_HRP};

pub mod constants;

mod ledger;
pub use ledger::{ActionPool, LedgerError, LedgerReader, LogIndexer, PoolError};

mod view;
pub use view::{
    ActionInfo, BlockView, CallRequest, HeaderView, IndexedLog, LogQuery, LogView, ReceiptView,
    SimulateOutcome,
};
