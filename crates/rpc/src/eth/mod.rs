mod endpoints;
use endpoints::*;

mod error;
pub use error::EthError;

mod helpers;
pub use helpers::CallErrorData;

use crate::ctx::RpcCtx;
use alloy::{eips::BlockNumberOrTag, primitives::B256};

/// Instantiate the `eth` API router.
pub fn eth() -> ajj::Router<RpcCtx> {
    ajj::Router::new()
        .route("protocolVersion", protocol_version)
        .route("syncing", syncing)
        .route("mining", mining)
        .route("hashrate", hashrate)
        .route("accounts", accounts)
        .route("blockNumber", block_number)
        .route("chainId", chain_id)
        .route("getBlockByHash", block::<B256>)
        .route("getBlockByNumber", block::<BlockNumberOrTag>)
        .route("getBlockTransactionCountByHash", block_tx_count::<B256>)
        .route("getBlockTransactionCountByNumber", block_tx_count::<BlockNumberOrTag>)
        .route("getTransactionByHash", transaction_by_hash)
        .route("getTransactionByBlockHashAndIndex", transaction_by_block_and_index::<B256>)
        .route(
            "getTransactionByBlockNumberAndIndex",
            transaction_by_block_and_index::<BlockNumberOrTag>,
        )
        .route("getTransactionReceipt", transaction_receipt)
        .route("getBalance", balance)
        .route("getStorageAt", storage_at)
        .route("getTransactionCount", addr_tx_count)
        .route("getCode", code_at)
        .route("call", call)
        .route("estimateGas", estimate_gas)
        .route("gasPrice", gas_price)
        .route("sendRawTransaction", send_raw_transaction)
        .route("getLogs", get_logs)
        .route("newFilter", new_filter)
        .route("newBlockFilter", new_block_filter)
        .route("uninstallFilter", uninstall_filter)
        .route("getFilterChanges", get_filter_changes)
        .route("getFilterLogs", get_filter_logs)
        // ---------------
        //
        // Unsupported methods:
        //
        .route("coinbase", not_supported)
        .route("blobBaseFee", not_supported)
        .route("feeHistory", not_supported)
        .route("maxPriorityFeePerGas", not_supported)
        .route("getUncleCountByBlockHash", not_supported)
        .route("getUncleCountByBlockNumber", not_supported)
        .route("getUncleByBlockHashAndIndex", not_supported)
        .route("getUncleByBlockNumberAndIndex", not_supported)
        .route("getWork", not_supported)
        .route("submitHashrate", not_supported)
        .route("submitWork", not_supported)
        .route("sendTransaction", not_supported)
        .route("sign", not_supported)
        .route("signTransaction", not_supported)
        .route("signTypedData", not_supported)
        .route("getProof", not_supported)
        .route("createAccessList", not_supported)
        .route("newPendingTransactionFilter", not_supported)
}
