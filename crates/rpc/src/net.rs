//! The `net` namespace, for wallet compatibility.
//!
//! The bridge is not a peer of anything, so these answers are fixed: wallets
//! only use them to sanity-check the endpoint before sending real traffic.
use crate::ctx::RpcCtx;
use alloy::primitives::U64;

/// Instantiate a `net` API router.
pub fn net() -> ajj::Router<RpcCtx> {
    ajj::Router::new()
        .route("version", version)
        .route("listening", listening)
        .route("peerCount", peer_count)
}

/// `net_version` is the chain ID as a decimal string, by convention.
async fn version(ctx: RpcCtx) -> Result<String, ()> {
    Ok(ctx.chain_id().to_string())
}

async fn listening() -> Result<bool, ()> {
    Ok(true)
}

async fn peer_count() -> Result<U64, ()> {
    Ok(U64::ZERO)
}
