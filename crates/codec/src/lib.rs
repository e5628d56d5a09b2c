//! Bidirectional codec between Meridian actions and Ethereum legacy
//! transactions.
//!
//! The codec is stateless. It owns the EIP-155 signing hash, the canonical
//! signed-transaction hash, raw-transaction decoding with signer recovery,
//! and the broadcast encoding — everything whose bytes must match what
//! external Ethereum tooling computes on its own.

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

mod compat;
pub use compat::EthCompat;

mod error;
pub use error::CodecError;

mod sig;
pub use sig::{pubkey_to_eth, SIGNATURE_LENGTH};

mod tx;
pub use tx::{decode_raw_tx, encode_signed_tx, signed_hash, to_eth_tx, unsigned_hash, DecodedTx};
