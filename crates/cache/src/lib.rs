//! Expiring key/value storage for the Meridian RPC surface.
//!
//! The [`TtlCache`] is a string-keyed map of opaque byte values in which
//! every entry lives for a fixed per-cache duration after its last write.
//! Reads of expired entries behave as misses, overwrites restart the
//! clock, and an optional JSON mirror file carries unexpired entries
//! across process restarts.
//!
//! Expiry is lazy: nothing is evicted until an expired entry is read, or
//! an optional background sweeper ([`TtlCache::spawn_sweeper`]) visits
//! it. Either way, no caller can observe an expired value.

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

mod cache;
pub use cache::{CacheError, TtlCache};

mod sweep;
