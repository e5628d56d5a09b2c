use crate::{
    ctx::RpcCtx,
    eth::{CallErrorData, EthError},
    interest::{FilterId, FilterOutput},
    resp::{RpcBlock, RpcReceipt, RpcTransaction},
    util::{await_jh_option, await_jh_option_response},
};
use ajj::{HandlerCtx, ResponsePayload};
use alloy::{
    eips::BlockId,
    primitives::{Address, Bytes, B256, U256, U64},
    rpc::types::{Filter, Log},
};
use meridian_types::{constants::PROTOCOL_VERSION, CallRequest};
use serde::Deserialize;
use std::borrow::Cow;

/// The transaction object accepted by `eth_call` and `eth_estimateGas`.
///
/// Absent fields default: missing value and data are empty, missing gas means
/// the server's cap. `input` is accepted as an alias for `data`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(super) struct CallObject {
    from: Option<Address>,
    to: Option<Address>,
    gas: Option<U64>,
    gas_price: Option<U256>,
    value: Option<U256>,
    #[serde(alias = "input")]
    data: Option<Bytes>,
}

impl CallObject {
    fn into_request(self) -> CallRequest {
        CallRequest {
            from: self.from,
            to: self.to,
            gas: self.gas.map(|g| g.to::<u64>()),
            gas_price: self.gas_price,
            value: self.value.unwrap_or_default(),
            data: self.data.unwrap_or_default(),
        }
    }
}

/// Args for `eth_estimateGas` and `eth_call`.
#[derive(Debug, Deserialize)]
pub(super) struct TxParams(CallObject, #[serde(default)] Option<BlockId>);

/// Args for `eth_getBlockByHash` and `eth_getBlockByNumber`.
#[derive(Debug, Deserialize)]
pub(super) struct BlockParams<T>(T, #[serde(default)] Option<bool>);

/// Args for `eth_getStorageAt`.
#[derive(Debug, Deserialize)]
pub(super) struct StorageAtArgs(Address, U256, #[serde(default)] Option<BlockId>);

/// Args for `eth_getBalance`, `eth_getTransactionCount`, and `eth_getCode`.
#[derive(Debug, Deserialize)]
pub(super) struct AddrWithBlock(Address, #[serde(default)] Option<BlockId>);

pub(super) async fn not_supported() -> ResponsePayload<(), ()> {
    ResponsePayload::internal_error_message(Cow::Borrowed(
        "Method not supported. The ledger has no equivalent for this part of the Ethereum API.",
    ))
}

pub(super) async fn protocol_version() -> Result<String, ()> {
    Ok(PROTOCOL_VERSION.to_string())
}

/// The bridge serves sealed state only, so from the caller's point of view it
/// is never mid-sync.
pub(super) async fn syncing() -> Result<bool, ()> {
    Ok(false)
}

pub(super) async fn mining() -> Result<bool, ()> {
    Ok(false)
}

pub(super) async fn hashrate() -> Result<U64, ()> {
    Ok(U64::ZERO)
}

/// The bridge holds no keys.
pub(super) async fn accounts() -> Result<Vec<Address>, ()> {
    Ok(Vec::new())
}

pub(super) async fn chain_id(ctx: RpcCtx) -> Result<U64, ()> {
    Ok(U64::from(ctx.chain_id()))
}

pub(super) async fn gas_price(ctx: RpcCtx) -> Result<U256, ()> {
    Ok(ctx.suggest_gas_price())
}

pub(super) async fn block_number(hctx: HandlerCtx, ctx: RpcCtx) -> Result<U64, String> {
    let task = async move { ctx.tip().await.map(U64::from).map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn block<T>(
    hctx: HandlerCtx,
    BlockParams(t, full): BlockParams<T>,
    ctx: RpcCtx,
) -> Result<Option<RpcBlock>, String>
where
    T: Into<BlockId>,
{
    let id = t.into();
    let task = async move {
        ctx.rpc_block(id, full.unwrap_or_default()).await.map_err(EthError::into_string)
    };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn block_tx_count<T>(
    hctx: HandlerCtx,
    (t,): (T,),
    ctx: RpcCtx,
) -> Result<Option<U64>, String>
where
    T: Into<BlockId>,
{
    let id = t.into();
    let task = async move { ctx.tx_count_in(id).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn transaction_by_hash(
    hctx: HandlerCtx,
    (hash,): (B256,),
    ctx: RpcCtx,
) -> Result<Option<RpcTransaction>, String> {
    let task = async move { ctx.rpc_transaction(hash).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn transaction_by_block_and_index<T>(
    hctx: HandlerCtx,
    (t, index): (T, U64),
    ctx: RpcCtx,
) -> Result<Option<RpcTransaction>, String>
where
    T: Into<BlockId>,
{
    let id = t.into();
    let task = async move {
        ctx.rpc_transaction_by_idx(id, index.to::<u64>()).await.map_err(EthError::into_string)
    };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn transaction_receipt(
    hctx: HandlerCtx,
    (hash,): (B256,),
    ctx: RpcCtx,
) -> Result<Option<RpcReceipt>, String> {
    let task = async move { ctx.rpc_receipt(hash).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn balance(
    hctx: HandlerCtx,
    AddrWithBlock(address, block): AddrWithBlock,
    ctx: RpcCtx,
) -> Result<U256, String> {
    let id = block.unwrap_or(BlockId::latest());
    let task = async move { ctx.balance(address, id).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn storage_at(
    hctx: HandlerCtx,
    StorageAtArgs(address, slot, block): StorageAtArgs,
    ctx: RpcCtx,
) -> Result<B256, String> {
    let id = block.unwrap_or(BlockId::latest());
    let task = async move { ctx.storage(address, slot, id).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn addr_tx_count(
    hctx: HandlerCtx,
    AddrWithBlock(address, block): AddrWithBlock,
    ctx: RpcCtx,
) -> Result<U64, String> {
    let id = block.unwrap_or(BlockId::latest());
    let task = async move {
        ctx.nonce_of(address, id).await.map(U64::from).map_err(EthError::into_string)
    };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn code_at(
    hctx: HandlerCtx,
    AddrWithBlock(address, block): AddrWithBlock,
    ctx: RpcCtx,
) -> Result<Bytes, String> {
    let id = block.unwrap_or(BlockId::latest());
    let task = async move { ctx.code_of(address, id).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

/// Wallets expect the raw revert bytes as the error payload when the ledger
/// surfaced any, and the decoded reason otherwise.
fn revert_payload<T>(reason: String, data: Bytes) -> ResponsePayload<T, CallErrorData> {
    let obj =
        if data.is_empty() { CallErrorData::from(reason) } else { CallErrorData::from(data) };
    ResponsePayload::internal_error_with_message_and_obj("execution reverted".into(), obj)
}

pub(super) async fn call(
    hctx: HandlerCtx,
    TxParams(request, block): TxParams,
    ctx: RpcCtx,
) -> ResponsePayload<Bytes, CallErrorData> {
    let id = block.unwrap_or(BlockId::latest());

    let task = async move {
        match ctx.call(request.into_request(), id).await {
            Ok(data) => ResponsePayload::Success(data),
            Err(EthError::Revert { reason, data }) => revert_payload(reason, data),
            Err(err) => ResponsePayload::internal_error_with_message_and_obj(
                "call failed".into(),
                err.into_string().into(),
            ),
        }
    };

    await_jh_option_response!(hctx.spawn_blocking(task))
}

/// Estimate the gas cost of a transaction.
pub(super) async fn estimate_gas(
    hctx: HandlerCtx,
    TxParams(request, block): TxParams,
    ctx: RpcCtx,
) -> ResponsePayload<U64, CallErrorData> {
    let id = block.unwrap_or(BlockId::pending());

    let task = async move {
        match ctx.estimate_gas(request.into_request(), id).await {
            Ok(estimate) => ResponsePayload::Success(U64::from(estimate)),
            Err(EthError::Revert { reason, data }) => revert_payload(reason, data),
            Err(err) => ResponsePayload::internal_error_with_message_and_obj(
                "estimate failed".into(),
                err.into_string().into(),
            ),
        }
    };

    await_jh_option_response!(hctx.spawn_blocking(task))
}

pub(super) async fn send_raw_transaction(
    hctx: HandlerCtx,
    (raw,): (String,),
    ctx: RpcCtx,
) -> Result<B256, String> {
    let task = async move { ctx.submit_raw(&raw).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn get_logs(
    hctx: HandlerCtx,
    (filter,): (Filter,),
    ctx: RpcCtx,
) -> Result<Vec<Log>, String> {
    let task = async move { ctx.logs(&filter).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn new_filter(
    hctx: HandlerCtx,
    (filter,): (Filter,),
    ctx: RpcCtx,
) -> Result<FilterId, String> {
    let task = async move {
        ctx.filters().install_log_filter(filter).await.map_err(EthError::into_string)
    };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn new_block_filter(hctx: HandlerCtx, ctx: RpcCtx) -> Result<FilterId, String> {
    let task =
        async move { ctx.filters().install_block_filter().await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn uninstall_filter(
    hctx: HandlerCtx,
    (id,): (FilterId,),
    ctx: RpcCtx,
) -> Result<bool, String> {
    let task = async move { ctx.filters().uninstall(id).map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn get_filter_changes(
    hctx: HandlerCtx,
    (id,): (FilterId,),
    ctx: RpcCtx,
) -> Result<FilterOutput, String> {
    let task = async move { ctx.filters().poll(id).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}

pub(super) async fn get_filter_logs(
    hctx: HandlerCtx,
    (id,): (FilterId,),
    ctx: RpcCtx,
) -> Result<FilterOutput, String> {
    let task = async move { ctx.filters().poll_as_logs(id).await.map_err(EthError::into_string) };

    await_jh_option!(hctx.spawn_blocking(task))
}
