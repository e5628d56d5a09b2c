//! Serve the bridge over HTTP against in-memory mock collaborators.
//!
//! Run with `cargo run -p meridian-rpc --example serve --features test-utils`,
//! then point any Ethereum tool at `http://127.0.0.1:8545`:
//!
//! ```text
//! curl -s http://127.0.0.1:8545 -H 'content-type: application/json' \
//!   -d '{"jsonrpc":"2.0","id":1,"method":"eth_blockNumber","params":[]}'
//! ```
use meridian_rpc::{
    test_utils::{test_chain, MockIndexer, MockLedger, MockPool},
    RpcConfig, RpcCtx, ServeConfig,
};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let ctx = RpcCtx::new(
        RpcConfig::default(),
        Arc::new(MockLedger::new(test_chain(8))),
        Arc::new(MockPool::new()),
        Arc::new(MockIndexer::default()),
    )?;

    let router = meridian_rpc::router().with_state(ctx);
    let cfg = ServeConfig { http: vec!["127.0.0.1:8545".parse()?], cors: None };
    let _guard = cfg.serve(router).await?;

    // Hold the guard until interrupted.
    std::future::pending::<()>().await;
    Ok(())
}
