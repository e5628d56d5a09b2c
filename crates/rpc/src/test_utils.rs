//! Mock ledger collaborators and chain fixtures for tests.
//!
//! Enable the `test-utils` feature to use these from outside the crate, e.g.
//! to stand up a bridge against a scripted chain in an integration test or a
//! demo binary.

use alloy::primitives::{keccak256, Address, Bloom, Bytes, B256, U256};
use async_trait::async_trait;
use meridian_types::{
    constants::BASE_TX_GAS, Action, ActionCore, ActionInfo, ActionPayload, ActionPool, BlockView,
    CallRequest, HeaderView, IndexedLog, LedgerError, LedgerReader, LogIndexer, LogQuery,
    NativeAddress, PoolError, ReceiptView, SealedAction, SimulateOutcome,
};
use std::{
    collections::HashMap,
    sync::{Mutex, RwLock},
};

/// Deterministic hash for the fixture block at the given height.
pub fn test_block_hash(height: u64) -> B256 {
    keccak256(height.to_be_bytes())
}

/// Deterministic hash for the fixture action with the given nonce.
pub fn test_action_hash(nonce: u64) -> B256 {
    let mut preimage = b"action".to_vec();
    preimage.extend_from_slice(&nonce.to_be_bytes());
    keccak256(preimage)
}

/// A fixture transfer action. The signature bytes are shaped like a real
/// recoverable signature (recovery id 0) but do not verify.
pub fn test_action(nonce: u64) -> SealedAction {
    let action = Action::new(
        ActionCore {
            version: 1,
            nonce,
            gas_limit: BASE_TX_GAS,
            gas_price: U256::from(1_000_000_000_000u64),
        },
        ActionPayload::Transfer {
            amount: U256::from(1_000u64),
            recipient: NativeAddress::new([0x22; 20]).to_bech32(),
            payload: Bytes::new(),
        },
    );
    SealedAction {
        action,
        sender: NativeAddress::new([0x11; 20]),
        signature: [0x41; 65],
        hash: test_action_hash(nonce),
    }
}

/// A fixture header at the given height, hash-linked to its parent.
pub fn test_header(height: u64) -> HeaderView {
    HeaderView {
        height,
        hash: test_block_hash(height),
        parent_hash: if height == 0 { B256::ZERO } else { test_block_hash(height - 1) },
        timestamp: 1_700_000_000 + height,
        producer: NativeAddress::new([0x33; 20]),
        gas_limit: 50_000_000,
        gas_used: BASE_TX_GAS,
        logs_bloom: Bloom::default(),
        state_root: B256::repeat_byte(0x01),
        transactions_root: B256::repeat_byte(0x02),
        receipts_root: B256::repeat_byte(0x03),
    }
}

/// A fixture chain of `tip` blocks, heights `1..=tip`, each carrying one
/// transfer whose nonce equals the height.
pub fn test_chain(tip: u64) -> Vec<BlockView> {
    (1..=tip).map(|h| BlockView { header: test_header(h), actions: vec![test_action(h)] }).collect()
}

/// A fixture indexed log emitted by `address` in the block at `height`.
pub fn test_log(height: u64, address: Address) -> IndexedLog {
    IndexedLog {
        address,
        topics: vec![B256::repeat_byte(0xee)],
        data: Bytes::from(vec![0xbe, 0xef]),
        block_height: height,
        block_hash: test_block_hash(height),
        action_hash: test_action_hash(height),
        tx_index: 0,
        log_index: 0,
    }
}

/// In-memory [`LedgerReader`] backed by a scripted chain.
///
/// State queries ignore the height argument; the mock models a single state
/// snapshot. `push_block` grows the chain mid-test so filter polls have
/// something new to see.
#[derive(Debug, Default)]
pub struct MockLedger {
    blocks: RwLock<Vec<BlockView>>,
    balances: HashMap<NativeAddress, U256>,
    nonces: HashMap<NativeAddress, u64>,
    code: HashMap<NativeAddress, Bytes>,
    storage: HashMap<(NativeAddress, B256), B256>,
    receipts: HashMap<B256, ReceiptView>,
    outcome: Option<SimulateOutcome>,
    gas_floor: Option<u64>,
    reported_gas: Option<u64>,
}

impl MockLedger {
    /// Create a ledger over the given blocks (ascending heights).
    pub fn new(blocks: Vec<BlockView>) -> Self {
        Self { blocks: RwLock::new(blocks), ..Default::default() }
    }

    /// Set an account balance.
    pub fn with_balance(mut self, address: NativeAddress, amount: U256) -> Self {
        self.balances.insert(address, amount);
        self
    }

    /// Set an account's confirmed nonce.
    pub fn with_nonce(mut self, address: NativeAddress, nonce: u64) -> Self {
        self.nonces.insert(address, nonce);
        self
    }

    /// Deploy code at an account.
    pub fn with_code(mut self, address: NativeAddress, code: Bytes) -> Self {
        self.code.insert(address, code);
        self
    }

    /// Set a storage slot.
    pub fn with_storage(mut self, address: NativeAddress, slot: B256, value: B256) -> Self {
        self.storage.insert((address, slot), value);
        self
    }

    /// Record a receipt, keyed by its action hash.
    pub fn with_receipt(mut self, receipt: ReceiptView) -> Self {
        self.receipts.insert(receipt.action_hash, receipt);
        self
    }

    /// Force every simulation to produce this outcome.
    pub fn with_outcome(mut self, outcome: SimulateOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Make simulations fail unless given at least `floor` gas, and consume
    /// exactly `floor` on success.
    pub fn with_gas_floor(mut self, floor: u64) -> Self {
        self.gas_floor = Some(floor);
        self
    }

    /// Override the gas consumption successful simulations report.
    pub fn with_reported_gas(mut self, gas: u64) -> Self {
        self.reported_gas = Some(gas);
        self
    }

    /// Append a block to the chain.
    pub fn push_block(&self, block: BlockView) {
        self.blocks.write().unwrap().push(block);
    }

    fn find<F, T>(&self, f: F) -> Option<T>
    where
        F: Fn(&BlockView) -> Option<T>,
    {
        self.blocks.read().unwrap().iter().find_map(f)
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn tip_height(&self) -> Result<u64, LedgerError> {
        Ok(self.blocks.read().unwrap().last().map(|b| b.header.height).unwrap_or_default())
    }

    async fn header_by_height(&self, height: u64) -> Result<Option<HeaderView>, LedgerError> {
        Ok(self.find(|b| (b.header.height == height).then_some(b.header)))
    }

    async fn header_by_hash(&self, hash: B256) -> Result<Option<HeaderView>, LedgerError> {
        Ok(self.find(|b| (b.header.hash == hash).then_some(b.header)))
    }

    async fn block_by_height(&self, height: u64) -> Result<Option<BlockView>, LedgerError> {
        Ok(self.find(|b| (b.header.height == height).then(|| b.clone())))
    }

    async fn block_by_hash(&self, hash: B256) -> Result<Option<BlockView>, LedgerError> {
        Ok(self.find(|b| (b.header.hash == hash).then(|| b.clone())))
    }

    async fn balance(&self, address: NativeAddress, _height: u64) -> Result<U256, LedgerError> {
        Ok(self.balances.get(&address).copied().unwrap_or_default())
    }

    async fn nonce(&self, address: NativeAddress, _height: u64) -> Result<u64, LedgerError> {
        Ok(self.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn code(&self, address: NativeAddress, _height: u64) -> Result<Bytes, LedgerError> {
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn storage_at(
        &self,
        address: NativeAddress,
        slot: B256,
        _height: u64,
    ) -> Result<B256, LedgerError> {
        Ok(self.storage.get(&(address, slot)).copied().unwrap_or_default())
    }

    async fn simulate(
        &self,
        call: CallRequest,
        gas_cap: u64,
        _height: u64,
    ) -> Result<SimulateOutcome, LedgerError> {
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }

        let budget = call.gas.map_or(gas_cap, |g| g.min(gas_cap));
        if let Some(floor) = self.gas_floor {
            if budget < floor {
                return Ok(SimulateOutcome::Revert {
                    reason: "out of gas".to_string(),
                    data: Bytes::new(),
                });
            }
            return Ok(SimulateOutcome::Success {
                return_data: Bytes::new(),
                gas_used: self.reported_gas.unwrap_or(floor),
            });
        }

        Ok(SimulateOutcome::Success {
            return_data: Bytes::new(),
            gas_used: self.reported_gas.unwrap_or(BASE_TX_GAS),
        })
    }

    async fn action_by_hash(&self, hash: B256) -> Result<Option<ActionInfo>, LedgerError> {
        Ok(self.find(|b| {
            b.actions.iter().enumerate().find(|(_, a)| a.hash == hash).map(|(index, sealed)| {
                ActionInfo {
                    sealed: sealed.clone(),
                    block_height: b.header.height,
                    block_hash: b.header.hash,
                    index: index as u64,
                }
            })
        }))
    }

    async fn receipt_by_hash(&self, hash: B256) -> Result<Option<ReceiptView>, LedgerError> {
        Ok(self.receipts.get(&hash).cloned())
    }
}

/// In-memory [`ActionPool`] that records submissions.
#[derive(Debug, Default)]
pub struct MockPool {
    submitted: Mutex<Vec<SealedAction>>,
    pending: HashMap<NativeAddress, u64>,
    reject: Option<PoolError>,
}

impl MockPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a pending next nonce for an account.
    pub fn with_pending_nonce(mut self, address: NativeAddress, nonce: u64) -> Self {
        self.pending.insert(address, nonce);
        self
    }

    /// Reject every submission with the given error.
    pub fn rejecting(mut self, err: PoolError) -> Self {
        self.reject = Some(err);
        self
    }

    /// Everything submitted so far.
    pub fn submitted(&self) -> Vec<SealedAction> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionPool for MockPool {
    async fn submit(&self, action: SealedAction) -> Result<(), PoolError> {
        if let Some(err) = &self.reject {
            return Err(err.clone());
        }
        self.submitted.lock().unwrap().push(action);
        Ok(())
    }

    async fn pending_nonce(&self, address: NativeAddress) -> Result<Option<u64>, PoolError> {
        Ok(self.pending.get(&address).copied())
    }
}

/// In-memory [`LogIndexer`] over a fixed record set.
#[derive(Debug, Default)]
pub struct MockIndexer {
    records: Vec<IndexedLog>,
}

impl MockIndexer {
    /// Create an indexer over the given records.
    pub fn new(records: Vec<IndexedLog>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl LogIndexer for MockIndexer {
    async fn logs_in_range(&self, query: LogQuery) -> Result<Vec<IndexedLog>, LedgerError> {
        Ok(self.records.iter().filter(|r| record_matches(r, &query)).cloned().collect())
    }
}

fn record_matches(record: &IndexedLog, query: &LogQuery) -> bool {
    if record.block_height < query.from || record.block_height > query.to {
        return false;
    }
    if !query.addresses.is_empty() && !query.addresses.contains(&record.address) {
        return false;
    }
    // Positional topic match; an empty position is a wildcard.
    query.topics.iter().enumerate().all(|(position, wanted)| {
        wanted.is_empty() || record.topics.get(position).is_some_and(|t| wanted.contains(t))
    })
}
