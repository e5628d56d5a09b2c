//! Meridian RPC.
//!
//! This crate serves the Ethereum JSON-RPC wire API on top of a Meridian
//! ledger. It does not execute anything itself: every answer is assembled
//! from the [`LedgerReader`], [`ActionPool`], and [`LogIndexer`]
//! collaborators handed to [`RpcCtx::new`], so any node that can implement
//! those three traits can present itself to Ethereum tooling.
//!
//! [`LedgerReader`]: meridian_types::LedgerReader
//! [`ActionPool`]: meridian_types::ActionPool
//! [`LogIndexer`]: meridian_types::LogIndexer
//!
//! ## Usage Example
//!
//! ```rust
//! # use meridian_rpc::RpcCtx;
//! use meridian_rpc::{router, ServeConfig};
//!
//! # pub async fn f(ctx: RpcCtx) -> eyre::Result<()> {
//! let router = meridian_rpc::router().with_state(ctx);
//!
//! let cfg = ServeConfig { http: vec!["localhost:8545".parse()?], cors: None };
//!
//! // Spawn the server on the given addresses, the shutdown guard
//! // will shutdown the server(s) when dropped.
//! let shutdown_guard = cfg.serve(router).await?;
//! # Ok(())
//! # }
//! ```

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

mod config;
pub use config::{RpcConfig, RpcServerGuard, ServeConfig};

mod ctx;
pub use ctx::RpcCtx;

mod eth;
pub use eth::{eth, CallErrorData, EthError};

mod interest;
pub use interest::FilterOutput;

mod net;
pub use net::net;

mod resp;
pub use resp::{BlockTransactions, RpcBlock, RpcReceipt, RpcTransaction};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod util;

mod web3;
pub use web3::web3;

/// Re-exported for convenience
pub use ::ajj;

use ajj::Router;

/// Create a router serving every namespace the bridge speaks.
pub fn router() -> Router<RpcCtx> {
    Router::new().nest("eth", eth()).nest("web3", web3()).nest("net", net())
}
