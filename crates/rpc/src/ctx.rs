use crate::{
    config::RpcConfig,
    eth::EthError,
    interest::{criteria_to_query, FilterManager},
    resp::{log_from_indexed, RpcBlock, RpcReceipt, RpcTransaction},
    util::{intrinsic_gas, BlockRangeInclusiveIter},
};
use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, Bytes, TxKind, B256, U256, U64},
    rpc::types::{Filter, FilterBlockOption, Log},
};
use meridian_cache::{CacheError, TtlCache};
use meridian_codec::decode_raw_tx;
use meridian_types::{
    constants::{ACTION_VERSION, STAKING_PROTOCOL_ADDRESS, SUGGESTED_GAS_PRICE},
    Action, ActionCore, ActionPayload, ActionPool, BlockView, CallRequest, LedgerReader,
    LogIndexer, NativeAddress, SealedAction, SimulateOutcome,
};
use std::{fmt, sync::Arc};
use tracing::{trace, warn};

/// The maximum number of blocks handed to the indexer in one query when
/// serving a range filter.
const MAX_INDEXER_SPAN: u64 = 1_000;

/// RPC context. Holds the ledger collaborators and the caches needed to
/// serve requests.
#[derive(Debug, Clone)]
pub struct RpcCtx {
    inner: Arc<RpcCtxInner>,
}

impl RpcCtx {
    /// Create a new `RpcCtx`, spawning the cache sweepers.
    pub fn new(
        config: RpcConfig,
        ledger: Arc<dyn LedgerReader>,
        pool: Arc<dyn ActionPool>,
        indexer: Arc<dyn LogIndexer>,
    ) -> Result<Self, CacheError> {
        let memo = match &config.memo_path {
            Some(path) => TtlCache::with_persistence(config.memo_ttl, path.clone())?,
            None => TtlCache::new(config.memo_ttl),
        };
        memo.spawn_sweeper(config.memo_ttl);

        let filters = FilterManager::new(
            TtlCache::new(config.filter_ttl),
            ledger.clone(),
            indexer.clone(),
            config.max_blocks_per_filter,
        );

        Ok(Self { inner: Arc::new(RpcCtxInner { config, ledger, pool, indexer, memo, filters }) })
    }
}

impl core::ops::Deref for RpcCtx {
    type Target = RpcCtxInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Inner context for [`RpcCtx`].
pub struct RpcCtxInner {
    config: RpcConfig,
    ledger: Arc<dyn LedgerReader>,
    pool: Arc<dyn ActionPool>,
    indexer: Arc<dyn LogIndexer>,

    /// Formatted blocks and receipts, keyed by hash. Sealed data never
    /// changes, so entries are reusable until they age out.
    memo: TtlCache,

    filters: FilterManager,
}

impl fmt::Debug for RpcCtxInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcCtxInner")
            .field("config", &self.config)
            .field("memo", &self.memo)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl RpcCtxInner {
    /// Access the server configuration.
    pub const fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// The chain ID served over the Ethereum wire.
    pub const fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Access the filter manager.
    pub(crate) const fn filters(&self) -> &FilterManager {
        &self.filters
    }

    /// Current tip height.
    pub async fn tip(&self) -> Result<u64, EthError> {
        self.ledger.tip_height().await.map_err(Into::into)
    }

    /// Resolve a block tag to a concrete height. `pending` resolves to the
    /// tip: the bridge holds no speculative state, so the latest sealed block
    /// is the closest thing to pending state it can serve.
    pub(crate) async fn resolve_number(&self, tag: BlockNumberOrTag) -> Result<u64, EthError> {
        match tag {
            BlockNumberOrTag::Number(height) => Ok(height),
            BlockNumberOrTag::Earliest => Ok(1),
            _ => self.tip().await,
        }
    }

    /// Resolve a block id to a concrete height. Unlike [`Self::hash_for_id`],
    /// a hash the ledger does not know is an error here: state queries need a
    /// height to anchor to and have no way to answer "null".
    pub(crate) async fn resolve_id(&self, id: BlockId) -> Result<u64, EthError> {
        match id {
            BlockId::Number(tag) => self.resolve_number(tag).await,
            BlockId::Hash(hash) => self
                .ledger
                .header_by_hash(hash.block_hash)
                .await?
                .map(|h| h.height)
                .ok_or(EthError::HeaderNotFound(id)),
        }
    }

    /// Resolve a block id to the canonical hash of the block it names.
    async fn hash_for_id(&self, id: BlockId) -> Result<Option<B256>, EthError> {
        match id {
            BlockId::Hash(hash) => Ok(Some(hash.block_hash)),
            BlockId::Number(tag) => {
                let height = self.resolve_number(tag).await?;
                Ok(self.ledger.header_by_height(height).await?.map(|h| h.hash))
            }
        }
    }

    fn memo_get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        serde_json::from_slice(&self.memo.get(key)?).ok()
    }

    /// Best-effort memo write. A failed write costs a rebuild later, never
    /// the request.
    fn memo_put<T: serde::Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(raw) => {
                if let Err(err) = self.memo.set(key, raw) {
                    warn!(%err, key, "failed to cache formatted response");
                }
            }
            Err(err) => warn!(%err, key, "failed to encode formatted response"),
        }
    }

    /// Get a block and format it for the RPC API. `full` selects transaction
    /// objects over hashes.
    pub async fn rpc_block(
        &self,
        id: impl Into<BlockId>,
        full: bool,
    ) -> Result<Option<RpcBlock>, EthError> {
        let Some(hash) = self.hash_for_id(id.into()).await? else {
            return Ok(None);
        };

        let key = format!("block:{hash}:{full}");
        if let Some(block) = self.memo_get(&key) {
            return Ok(Some(block));
        }

        let Some(view) = self.ledger.block_by_hash(hash).await? else {
            return Ok(None);
        };
        let block = RpcBlock::from_view(&view, full, self.chain_id())?;
        self.memo_put(&key, &block);
        Ok(Some(block))
    }

    /// Get the transaction count of a block.
    pub async fn tx_count_in(&self, id: impl Into<BlockId>) -> Result<Option<U64>, EthError> {
        let Some(view) = self.block_for_id(id.into()).await? else {
            return Ok(None);
        };
        Ok(Some(U64::from(view.actions.len())))
    }

    async fn block_for_id(&self, id: BlockId) -> Result<Option<BlockView>, EthError> {
        let Some(hash) = self.hash_for_id(id).await? else {
            return Ok(None);
        };
        self.ledger.block_by_hash(hash).await.map_err(Into::into)
    }

    /// Get a transaction by its hash, and format it for the RPC API.
    pub async fn rpc_transaction(&self, hash: B256) -> Result<Option<RpcTransaction>, EthError> {
        let Some(info) = self.ledger.action_by_hash(hash).await? else {
            return Ok(None);
        };
        RpcTransaction::from_info(&info, self.chain_id()).map(Some).map_err(Into::into)
    }

    /// Get a transaction by block and index, and format it for the RPC API.
    pub async fn rpc_transaction_by_idx(
        &self,
        id: impl Into<BlockId>,
        index: u64,
    ) -> Result<Option<RpcTransaction>, EthError> {
        let Some(view) = self.block_for_id(id.into()).await? else {
            return Ok(None);
        };

        view.actions
            .get(index as usize)
            .map(|sealed| {
                RpcTransaction::from_sealed(
                    sealed,
                    self.chain_id(),
                    view.header.hash,
                    view.header.height,
                    index,
                )
            })
            .transpose()
            .map_err(Into::into)
    }

    /// Get a receipt by its action hash, and format it for the RPC API.
    pub async fn rpc_receipt(&self, hash: B256) -> Result<Option<RpcReceipt>, EthError> {
        let key = format!("receipt:{hash}");
        if let Some(receipt) = self.memo_get(&key) {
            return Ok(Some(receipt));
        }

        let Some(receipt) = self.ledger.receipt_by_hash(hash).await? else {
            trace!(%hash, "receipt not found for action hash");
            return Ok(None);
        };
        let Some(info) = self.ledger.action_by_hash(hash).await? else {
            trace!(%hash, "action not found for receipt hash");
            return Ok(None);
        };

        let formatted = RpcReceipt::from_parts(&receipt, &info)?;
        self.memo_put(&key, &formatted);
        Ok(Some(formatted))
    }

    /// Account balance at the given block.
    pub async fn balance(&self, address: Address, id: BlockId) -> Result<U256, EthError> {
        let height = self.resolve_id(id).await?;
        self.ledger.balance(NativeAddress::from_eth(address), height).await.map_err(Into::into)
    }

    /// Account nonce at the given block. For `pending`, the pool's view wins
    /// when it tracks the account, so wallets assign fresh nonces correctly
    /// while earlier submissions are still waiting for a block.
    pub async fn nonce_of(&self, address: Address, id: BlockId) -> Result<u64, EthError> {
        let native = NativeAddress::from_eth(address);

        if id.is_pending() {
            if let Some(nonce) = self.pool.pending_nonce(native).await? {
                return Ok(nonce);
            }
        }

        let height = self.resolve_id(id).await?;
        self.ledger.nonce(native, height).await.map_err(Into::into)
    }

    /// Deployed code at the given block. Empty for non-contracts.
    pub async fn code_of(&self, address: Address, id: BlockId) -> Result<Bytes, EthError> {
        let height = self.resolve_id(id).await?;
        self.ledger.code(NativeAddress::from_eth(address), height).await.map_err(Into::into)
    }

    /// Raw storage slot value at the given block, zero-padded to 32 bytes.
    pub async fn storage(
        &self,
        address: Address,
        slot: U256,
        id: BlockId,
    ) -> Result<B256, EthError> {
        let height = self.resolve_id(id).await?;
        self.ledger
            .storage_at(NativeAddress::from_eth(address), slot.into(), height)
            .await
            .map_err(Into::into)
    }

    /// Logic for `eth_getLogs`.
    pub async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, EthError> {
        match filter.block_option {
            FilterBlockOption::AtBlockHash(hash) => {
                let header = self
                    .ledger
                    .header_by_hash(hash)
                    .await?
                    .ok_or(EthError::HeaderNotFound(hash.into()))?;
                self.logs_in_range(filter, header.height, header.height).await
            }
            FilterBlockOption::Range { from_block, to_block } => {
                let from = self.resolve_number(from_block.unwrap_or_default()).await?;
                let to = self.resolve_number(to_block.unwrap_or_default()).await?;
                self.logs_in_range(filter, from, to).await
            }
        }
    }

    /// Returns all logs in the given _inclusive_ range that match the filter.
    ///
    /// Returns an error if:
    ///  - the range is backwards or wider than the configured limit
    ///  - the number of matches exceeds the configured limit
    async fn logs_in_range(
        &self,
        filter: &Filter,
        from: u64,
        to: u64,
    ) -> Result<Vec<Log>, EthError> {
        trace!(from, to, ?filter, "finding logs in range");

        if to < from {
            return Err(EthError::InvalidRange);
        }
        let max_blocks = self.config.max_blocks_per_filter;
        if to - from > max_blocks {
            return Err(EthError::RangeTooWide(max_blocks));
        }

        let mut all_logs = Vec::new();
        let max_logs = self.config.max_logs_per_response;
        let is_multi_block = from != to;

        for (start, end) in BlockRangeInclusiveIter::new(from..=to, MAX_INDEXER_SPAN) {
            let records =
                self.indexer.logs_in_range(criteria_to_query(filter, start, end)).await?;
            all_logs.extend(records.iter().map(log_from_indexed));

            // size check but only if range is multiple blocks, so we always
            // return all logs of a single block
            if is_multi_block && all_logs.len() > max_logs {
                return Err(EthError::TooManyLogs(max_logs));
            }
        }

        Ok(all_logs)
    }

    /// Simulate a call against state at the given block and return its
    /// output. Reverts surface as [`EthError::Revert`].
    pub async fn call(&self, call: CallRequest, id: BlockId) -> Result<Bytes, EthError> {
        let height = self.resolve_id(id).await?;
        match self.ledger.simulate(call, self.config.rpc_gas_cap, height).await? {
            SimulateOutcome::Success { return_data, .. } => Ok(return_data),
            SimulateOutcome::Revert { reason, data } => Err(EthError::Revert { reason, data }),
        }
    }

    /// Logic for `eth_estimateGas`: the smallest gas limit under which the
    /// call succeeds, never an underestimate.
    pub async fn estimate_gas(&self, call: CallRequest, id: BlockId) -> Result<u64, EthError> {
        let height = self.resolve_id(id).await?;
        let ceiling = call.gas.map_or(self.config.rpc_gas_cap, |g| g.min(self.config.rpc_gas_cap));
        let floor = intrinsic_gas(&call.data, call.to.is_none());

        // Probe at the ceiling first: a revert there is a real revert, not an
        // out-of-gas artifact.
        let mut probe = call.clone();
        probe.gas = Some(ceiling);
        let gas_used = match self.ledger.simulate(probe, self.config.rpc_gas_cap, height).await? {
            SimulateOutcome::Success { gas_used, .. } => gas_used,
            SimulateOutcome::Revert { reason, data } => {
                return Err(EthError::Revert { reason, data })
            }
        };

        // The consumption report is usually the answer, but it can come in
        // low when the callee's behavior depends on the remaining budget, so
        // verify before trusting it.
        let mut lo = gas_used.max(floor);
        if self.succeeds_with(call.clone(), lo, height).await? {
            return Ok(lo);
        }

        // lo fails, ceiling is known to succeed: bisect for the boundary.
        let mut hi = ceiling;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.succeeds_with(call.clone(), mid, height).await? {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }

    async fn succeeds_with(
        &self,
        mut call: CallRequest,
        gas: u64,
        height: u64,
    ) -> Result<bool, EthError> {
        call.gas = Some(gas);
        Ok(self.ledger.simulate(call, self.config.rpc_gas_cap, height).await?.is_success())
    }

    /// Logic for `eth_sendRawTransaction`: decode the wire transaction back
    /// into a native action and hand it to the pool.
    ///
    /// The recipient decides the action variant: creation and calls against
    /// accounts with code become executions, the staking protocol address
    /// becomes a staking command, and everything else is a plain transfer.
    pub async fn submit_raw(&self, raw: &str) -> Result<B256, EthError> {
        let decoded = decode_raw_tx(raw, self.chain_id())?;
        let sender = NativeAddress::from_eth(decoded.sender());
        let tx = &decoded.tx;

        let payload = match tx.to {
            TxKind::Create => ActionPayload::Execution {
                amount: tx.value,
                contract: String::new(),
                data: tx.input.clone(),
            },
            TxKind::Call(address) if address == STAKING_PROTOCOL_ADDRESS.to_eth() => {
                ActionPayload::Staking { command: tx.input.clone() }
            }
            TxKind::Call(address) => {
                let recipient = NativeAddress::from_eth(address);
                let tip = self.tip().await?;
                if self.ledger.code(recipient, tip).await?.is_empty() {
                    ActionPayload::Transfer {
                        amount: tx.value,
                        recipient: recipient.to_bech32(),
                        payload: tx.input.clone(),
                    }
                } else {
                    ActionPayload::Execution {
                        amount: tx.value,
                        contract: recipient.to_bech32(),
                        data: tx.input.clone(),
                    }
                }
            }
        };

        let action = Action::new(
            ActionCore {
                version: ACTION_VERSION,
                nonce: tx.nonce,
                gas_limit: tx.gas_limit,
                gas_price: U256::from(tx.gas_price),
            },
            payload,
        );
        let sealed =
            SealedAction { action, sender, signature: decoded.signature, hash: decoded.hash };

        self.pool.submit(sealed).await?;
        trace!(hash = %decoded.hash, "action admitted to pool");
        Ok(decoded.hash)
    }

    /// Logic for `eth_gasPrice`. The ledger prices gas by a protocol
    /// constant, not an auction, so no oracle is involved.
    pub fn suggest_gas_price(&self) -> U256 {
        U256::from(SUGGESTED_GAS_PRICE)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{
        test_action_hash, test_block_hash, test_chain, test_log, MockIndexer, MockLedger, MockPool,
    };
    use k256::ecdsa::SigningKey;
    use meridian_codec::encode_signed_tx;
    use meridian_types::constants::{BASE_TX_GAS, MAINNET_CHAIN_ID};

    fn ctx(ledger: MockLedger) -> RpcCtx {
        ctx_with(ledger, MockPool::new(), MockIndexer::default())
    }

    fn ctx_with(ledger: MockLedger, pool: MockPool, indexer: MockIndexer) -> RpcCtx {
        RpcCtx::new(
            RpcConfig::default(),
            Arc::new(ledger),
            Arc::new(pool),
            Arc::new(indexer),
        )
        .unwrap()
    }

    fn signer() -> SigningKey {
        let mut kb = [0u8; 32];
        kb[31] = 1;
        SigningKey::from_slice(&kb).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_account_defaults() {
        let ctx = ctx(MockLedger::new(test_chain(1)));
        let addr = Address::repeat_byte(0x99);

        assert_eq!(ctx.balance(addr, BlockId::latest()).await.unwrap(), U256::ZERO);
        assert_eq!(ctx.nonce_of(addr, BlockId::latest()).await.unwrap(), 0);
        assert!(ctx.code_of(addr, BlockId::latest()).await.unwrap().is_empty());
        assert_eq!(
            ctx.storage(addr, U256::from(7u64), BlockId::latest()).await.unwrap(),
            B256::ZERO
        );
    }

    #[tokio::test]
    async fn test_state_queries_anchor_to_block_hashes() {
        let ctx = ctx(MockLedger::new(test_chain(2)));
        let addr = Address::repeat_byte(0x99);

        assert_eq!(
            ctx.balance(addr, BlockId::from(test_block_hash(1))).await.unwrap(),
            U256::ZERO
        );

        // An unknown hash cannot anchor a state query.
        assert!(matches!(
            ctx.balance(addr, BlockId::from(B256::repeat_byte(0xfd))).await.unwrap_err(),
            EthError::HeaderNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_block_lookup_by_number_and_hash_agree() {
        let ctx = ctx(MockLedger::new(test_chain(3)));

        let by_number = ctx.rpc_block(BlockNumberOrTag::Number(2), false).await.unwrap().unwrap();
        let by_hash = ctx.rpc_block(test_block_hash(2), false).await.unwrap().unwrap();
        assert_eq!(by_number, by_hash);
        assert_eq!(by_number.number, U64::from(2u64));

        // Misses are null, not errors.
        assert!(ctx.rpc_block(BlockNumberOrTag::Number(99), false).await.unwrap().is_none());
        assert!(ctx.rpc_block(B256::repeat_byte(0xff), false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_block_shapes_and_memo_agree() {
        let ctx = ctx(MockLedger::new(test_chain(2)));

        let hashes = ctx.rpc_block(BlockNumberOrTag::Number(2), false).await.unwrap().unwrap();
        let full = ctx.rpc_block(BlockNumberOrTag::Number(2), true).await.unwrap().unwrap();
        assert_eq!(hashes.transactions.len(), full.transactions.len());

        // Second read is served from the memo and must match the first.
        let again = ctx.rpc_block(BlockNumberOrTag::Number(2), true).await.unwrap().unwrap();
        assert_eq!(full, again);
    }

    #[tokio::test]
    async fn test_transaction_lookup() {
        let ctx = ctx(MockLedger::new(test_chain(3)));

        let tx = ctx.rpc_transaction(test_action_hash(2)).await.unwrap().unwrap();
        assert_eq!(tx.block_number, Some(U64::from(2u64)));
        assert_eq!(tx.transaction_index, Some(U64::ZERO));

        let by_idx =
            ctx.rpc_transaction_by_idx(BlockNumberOrTag::Number(2), 0).await.unwrap().unwrap();
        assert_eq!(by_idx, tx);

        assert!(ctx.rpc_transaction(B256::repeat_byte(0x01)).await.unwrap().is_none());
        assert!(ctx.rpc_transaction_by_idx(BlockNumberOrTag::Number(2), 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pending_nonce_prefers_pool() {
        let native = NativeAddress::new([0x44; 20]);
        let ledger = MockLedger::new(test_chain(1)).with_nonce(native, 4);
        let pool = MockPool::new().with_pending_nonce(native, 9);
        let ctx = ctx_with(ledger, pool, MockIndexer::default());

        let addr = native.to_eth();
        assert_eq!(ctx.nonce_of(addr, BlockId::pending()).await.unwrap(), 9);
        assert_eq!(ctx.nonce_of(addr, BlockId::latest()).await.unwrap(), 4);

        // No pool entry: pending falls back to the sealed nonce.
        let other = NativeAddress::new([0x45; 20]).to_eth();
        assert_eq!(ctx.nonce_of(other, BlockId::pending()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_estimate_matches_plain_transfer_cost() {
        let ctx = ctx(MockLedger::new(test_chain(1)));

        let call = CallRequest { to: Some(Address::repeat_byte(0x02)), ..Default::default() };
        assert_eq!(ctx.estimate_gas(call, BlockId::latest()).await.unwrap(), BASE_TX_GAS);
    }

    #[tokio::test]
    async fn test_estimate_searches_when_report_is_low() {
        let ledger =
            MockLedger::new(test_chain(1)).with_gas_floor(30_000).with_reported_gas(24_000);
        let ctx = ctx(ledger);

        let call = CallRequest { to: Some(Address::repeat_byte(0x02)), ..Default::default() };
        assert_eq!(ctx.estimate_gas(call, BlockId::latest()).await.unwrap(), 30_000);
    }

    #[tokio::test]
    async fn test_call_and_estimate_surface_reverts() {
        let ledger = MockLedger::new(test_chain(1)).with_outcome(SimulateOutcome::Revert {
            reason: "no".to_string(),
            data: Bytes::from(vec![0x08, 0xc3, 0x79, 0xa0]),
        });
        let ctx = ctx(ledger);
        let call = CallRequest { to: Some(Address::repeat_byte(0x02)), ..Default::default() };

        assert!(matches!(
            ctx.call(call.clone(), BlockId::latest()).await.unwrap_err(),
            EthError::Revert { reason, .. } if reason == "no"
        ));
        assert!(matches!(
            ctx.estimate_gas(call, BlockId::latest()).await.unwrap_err(),
            EthError::Revert { .. }
        ));
    }

    #[tokio::test]
    async fn test_get_logs_range_limits() {
        let ctx = ctx(MockLedger::new(test_chain(3)));

        let backwards = Filter::new().from_block(3u64).to_block(1u64);
        assert!(matches!(ctx.logs(&backwards).await.unwrap_err(), EthError::InvalidRange));

        let too_wide = Filter::new().from_block(1u64).to_block(1_000_000u64);
        assert!(matches!(ctx.logs(&too_wide).await.unwrap_err(), EthError::RangeTooWide(_)));
    }

    #[tokio::test]
    async fn test_get_logs_by_hash_and_range() {
        let emitter = Address::repeat_byte(0x42);
        let indexer = MockIndexer::new(vec![test_log(2, emitter), test_log(3, emitter)]);
        let ctx = ctx_with(MockLedger::new(test_chain(3)), MockPool::new(), indexer);

        let ranged = Filter::new().address(emitter).from_block(1u64).to_block(3u64);
        assert_eq!(ctx.logs(&ranged).await.unwrap().len(), 2);

        let at_hash = Filter::new().address(emitter).at_block_hash(test_block_hash(2));
        assert_eq!(ctx.logs(&at_hash).await.unwrap().len(), 1);

        let unknown = Filter::new().at_block_hash(B256::repeat_byte(0xfe));
        assert!(matches!(ctx.logs(&unknown).await.unwrap_err(), EthError::HeaderNotFound(_)));
    }

    #[tokio::test]
    async fn test_submit_raw_transfer() {
        let key = signer();
        let sent = crate::test_utils::test_action(7);
        let raw = encode_signed_tx(&sent.action, &key, MAINNET_CHAIN_ID).unwrap();

        let pool = Arc::new(MockPool::new());
        let ctx = RpcCtx::new(
            RpcConfig::default(),
            Arc::new(MockLedger::new(test_chain(1))),
            pool.clone(),
            Arc::new(MockIndexer::default()),
        )
        .unwrap();

        let hash = ctx.submit_raw(&raw).await.unwrap();

        let submitted = pool.submitted();
        assert_eq!(submitted.len(), 1);
        let sealed = &submitted[0];

        assert_eq!(sealed.hash, hash);
        assert_eq!(sealed.action.nonce(), 7);
        assert_eq!(sealed.action.recipient(), NativeAddress::new([0x22; 20]).to_bech32());
        assert!(matches!(sealed.action.payload, ActionPayload::Transfer { .. }));
        // Key 0x...01 controls this well-known address.
        assert_eq!(
            sealed.sender.to_eth(),
            alloy::primitives::address!("7E5F4552091A69125d5DfCb7b8C2659029395Bdf")
        );

        // The rebuilt action re-encodes to the hash the caller was given.
        assert_eq!(
            meridian_codec::signed_hash(&sealed.action, MAINNET_CHAIN_ID, &sealed.signature)
                .unwrap(),
            hash
        );
    }

    #[tokio::test]
    async fn test_submit_raw_routes_by_recipient() {
        let key = signer();
        let contract = NativeAddress::new([0x55; 20]);

        let call = Action::new(
            ActionCore {
                version: 1,
                nonce: 0,
                gas_limit: 100_000,
                gas_price: U256::from(1_000_000_000_000u64),
            },
            ActionPayload::Execution {
                amount: U256::ZERO,
                contract: contract.to_bech32(),
                data: Bytes::from(vec![0xaa, 0xbb]),
            },
        );
        let raw = encode_signed_tx(&call, &key, MAINNET_CHAIN_ID).unwrap();

        let pool = Arc::new(MockPool::new());
        let ledger =
            MockLedger::new(test_chain(1)).with_code(contract, Bytes::from(vec![0x60, 0x80]));
        let ctx = RpcCtx::new(
            RpcConfig::default(),
            Arc::new(ledger),
            pool.clone(),
            Arc::new(MockIndexer::default()),
        )
        .unwrap();

        ctx.submit_raw(&raw).await.unwrap();
        assert!(matches!(
            pool.submitted()[0].action.payload,
            ActionPayload::Execution { ref contract, .. } if !contract.is_empty()
        ));

        // The staking protocol address becomes a staking command.
        let stake = Action::new(
            ActionCore {
                version: 1,
                nonce: 1,
                gas_limit: 100_000,
                gas_price: U256::from(1_000_000_000_000u64),
            },
            ActionPayload::Staking { command: Bytes::from(vec![0x01, 0x02]) },
        );
        let raw = encode_signed_tx(&stake, &key, MAINNET_CHAIN_ID).unwrap();

        ctx.submit_raw(&raw).await.unwrap();
        assert!(matches!(
            pool.submitted()[1].action.payload,
            ActionPayload::Staking { ref command } if command.as_ref() == [0x01, 0x02]
        ));
    }

    #[tokio::test]
    async fn test_pool_rejection_propagates() {
        let key = signer();
        let sent = crate::test_utils::test_action(0);
        let raw = encode_signed_tx(&sent.action, &key, MAINNET_CHAIN_ID).unwrap();

        let pool = MockPool::new().rejecting(meridian_types::PoolError::NonceTooLow);
        let ctx = ctx_with(MockLedger::new(test_chain(1)), pool, MockIndexer::default());

        assert!(matches!(
            ctx.submit_raw(&raw).await.unwrap_err(),
            EthError::Pool(meridian_types::PoolError::NonceTooLow)
        ));
    }

    #[tokio::test]
    async fn test_receipt_formatting() {
        let sealed = crate::test_utils::test_action(2);
        let receipt = meridian_types::ReceiptView {
            action_hash: sealed.hash,
            status: 1,
            gas_used: BASE_TX_GAS,
            cumulative_gas_used: BASE_TX_GAS,
            contract_address: None,
            logs: vec![],
            block_height: 2,
            block_hash: test_block_hash(2),
            tx_index: 0,
        };
        let ctx = ctx(MockLedger::new(test_chain(3)).with_receipt(receipt));

        let formatted = ctx.rpc_receipt(test_action_hash(2)).await.unwrap().unwrap();
        assert_eq!(formatted.status, U64::from(1u64));
        assert_eq!(formatted.from, NativeAddress::new([0x11; 20]).to_eth());

        // Memoized read agrees.
        assert_eq!(ctx.rpc_receipt(test_action_hash(2)).await.unwrap().unwrap(), formatted);

        assert!(ctx.rpc_receipt(B256::repeat_byte(0x31)).await.unwrap().is_none());
    }
}
