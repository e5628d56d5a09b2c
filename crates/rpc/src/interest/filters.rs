use crate::{eth::EthError, interest::InterestKind, resp::log_from_indexed};
use alloy::{
    eips::BlockNumberOrTag,
    primitives::{keccak256, B256},
    rpc::types::{Filter, FilterBlockOption, Log},
};
use meridian_cache::TtlCache;
use meridian_types::{LedgerReader, LogIndexer, LogQuery};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::trace;

/// Filter handles are 32-byte identifiers derived from the filter contents.
pub(crate) type FilterId = B256;

/// The output of a filter poll.
///
/// This will be either a list of logs or a list of block hashes. Pending tx
/// filters are not supported by the bridge. For convenience, there is a
/// special variant for empty results.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FilterOutput {
    /// Empty output. Holds a `[(); 0]` to make sure it serializes as an empty
    /// array.
    Empty([(); 0]),
    /// Logs
    Log(Vec<Log>),
    /// Block hashes
    Block(Vec<B256>),
}

impl FilterOutput {
    /// Create an empty filter output.
    pub const fn empty() -> Self {
        Self::Empty([])
    }

    /// True if this is an empty filter output.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The length of this filter output.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty(_) => 0,
            Self::Log(logs) => logs.len(),
            Self::Block(blocks) => blocks.len(),
        }
    }
}

impl From<Vec<B256>> for FilterOutput {
    fn from(block_hashes: Vec<B256>) -> Self {
        Self::Block(block_hashes)
    }
}

impl From<Vec<Log>> for FilterOutput {
    fn from(logs: Vec<Log>) -> Self {
        Self::Log(logs)
    }
}

impl FromIterator<Log> for FilterOutput {
    fn from_iter<T: IntoIterator<Item = Log>>(iter: T) -> Self {
        let inner: Vec<_> = iter.into_iter().collect();
        if inner.is_empty() {
            Self::empty()
        } else {
            Self::Log(inner)
        }
    }
}

impl FromIterator<B256> for FilterOutput {
    fn from_iter<T: IntoIterator<Item = B256>>(iter: T) -> Self {
        let inner: Vec<_> = iter.into_iter().collect();
        if inner.is_empty() {
            Self::empty()
        } else {
            Self::Block(inner)
        }
    }
}

/// An active filter, as stored (JSON-encoded) in the filter store.
///
/// This struct records
/// - the filter details
/// - the cursor: the highest block height already reported to the caller
///
/// A poll reports the half-open span `(cursor, tip]` and moves the cursor
/// forward. TTL bookkeeping lives in the store itself; every load/save
/// refreshes the entry, so a filter expires only when left unpolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ActiveFilter {
    kind: InterestKind,
    cursor: u64,
}

impl ActiveFilter {
    /// Mark everything up to `height` as reported.
    fn advance_to(&mut self, height: u64) {
        self.cursor = height;
    }
}

/// Inner logic for [`FilterManager`].
pub(crate) struct FilterManagerInner {
    counter: AtomicU64,
    store: TtlCache,
    ledger: Arc<dyn LedgerReader>,
    indexer: Arc<dyn LogIndexer>,
    max_blocks_per_poll: u64,
}

impl fmt::Debug for FilterManagerInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterManagerInner")
            .field("store", &self.store)
            .field("max_blocks_per_poll", &self.max_blocks_per_poll)
            .finish_non_exhaustive()
    }
}

impl FilterManagerInner {
    /// Derive a fresh filter ID.
    ///
    /// The ID hashes the filter contents together with an install counter and
    /// the install time, so identical criteria installed twice still get
    /// distinct handles. The counter starts from 1; 0 is weird in quantity
    /// encoding.
    fn next_id(&self, kind: &InterestKind) -> Result<FilterId, EthError> {
        let mut preimage = serde_json::to_vec(kind)?;
        preimage.extend_from_slice(&self.counter.fetch_add(1, Ordering::Relaxed).to_be_bytes());
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        preimage.extend_from_slice(&now.as_nanos().to_be_bytes());
        Ok(keccak256(&preimage))
    }

    /// Load a filter from the store. Expired and unknown filters are
    /// indistinguishable.
    fn load(&self, id: FilterId) -> Result<ActiveFilter, EthError> {
        let raw = self.store.get(&id.to_string()).ok_or(EthError::FilterNotFound)?;
        serde_json::from_slice(&raw).map_err(Into::into)
    }

    /// Write a filter back to the store, refreshing its TTL.
    fn save(&self, id: FilterId, filter: &ActiveFilter) -> Result<(), EthError> {
        self.store.set(&id.to_string(), serde_json::to_vec(filter)?)?;
        Ok(())
    }

    fn install(&self, kind: InterestKind, cursor: u64) -> Result<FilterId, EthError> {
        let id = self.next_id(&kind)?;
        self.save(id, &ActiveFilter { kind, cursor })?;
        trace!(%id, cursor, "installed filter");
        Ok(id)
    }

    /// Install a new log filter.
    ///
    /// The cursor starts just below the filter's `fromBlock` when one is
    /// given, so the first poll reports the historical span the criteria ask
    /// for. Otherwise it starts at the tip and the filter reports only blocks
    /// sealed after installation.
    pub(crate) async fn install_log_filter(&self, criteria: Filter) -> Result<FilterId, EthError> {
        let cursor = match criteria.block_option {
            FilterBlockOption::Range {
                from_block: Some(BlockNumberOrTag::Number(height)), ..
            } => height.saturating_sub(1),
            FilterBlockOption::Range { from_block: Some(BlockNumberOrTag::Earliest), .. } => 0,
            _ => self.ledger.tip_height().await?,
        };
        self.install(InterestKind::Log(Box::new(criteria)), cursor)
    }

    /// Install a new block filter. Reports blocks sealed after installation.
    pub(crate) async fn install_block_filter(&self) -> Result<FilterId, EthError> {
        let cursor = self.ledger.tip_height().await?;
        self.install(InterestKind::Block, cursor)
    }

    /// Poll a filter: report what accumulated since the previous poll and
    /// advance the cursor.
    ///
    /// At most [`Self::max_blocks_per_poll`] blocks are consumed per call, so
    /// a filter far behind the tip catches up over successive polls instead
    /// of holding the indexer for an unbounded scan.
    pub(crate) async fn poll(&self, id: FilterId) -> Result<FilterOutput, EthError> {
        let mut filter = self.load(id)?;
        let tip = self.ledger.tip_height().await?;

        if tip <= filter.cursor {
            self.save(id, &filter)?;
            return Ok(FilterOutput::empty());
        }

        let target = tip.min(filter.cursor.saturating_add(self.max_blocks_per_poll));
        let output = match &filter.kind {
            InterestKind::Log(criteria) => {
                self.scan_logs(criteria, filter.cursor + 1, target).await?
            }
            InterestKind::Block => self.scan_blocks(filter.cursor + 1, target).await?,
        };

        filter.advance_to(target);
        self.save(id, &filter)?;
        trace!(%id, cursor = target, returned = output.len(), "polled filter");
        Ok(output)
    }

    /// Poll a log filter. Behaves exactly like [`Self::poll`], but refuses
    /// block filters, which have no log representation.
    pub(crate) async fn poll_as_logs(&self, id: FilterId) -> Result<FilterOutput, EthError> {
        if !self.load(id)?.kind.is_log() {
            return Err(EthError::NotLogFilter);
        }
        self.poll(id).await
    }

    /// Uninstall a filter. Returns whether a live filter was removed;
    /// uninstalling twice is not an error.
    pub(crate) fn uninstall(&self, id: FilterId) -> Result<bool, EthError> {
        let removed = self.store.delete(&id.to_string())?;
        trace!(%id, removed, "uninstalled filter");
        Ok(removed)
    }

    async fn scan_logs(
        &self,
        criteria: &Filter,
        from: u64,
        to: u64,
    ) -> Result<FilterOutput, EthError> {
        // The criteria's toBlock caps the scan; the cursor still advances
        // past it, so later polls report nothing rather than rescanning.
        let to = match criteria.block_option {
            FilterBlockOption::Range { to_block: Some(BlockNumberOrTag::Number(height)), .. } => {
                to.min(height)
            }
            _ => to,
        };
        if from > to {
            return Ok(FilterOutput::empty());
        }

        let records = self.indexer.logs_in_range(criteria_to_query(criteria, from, to)).await?;
        Ok(records.iter().map(log_from_indexed).collect())
    }

    async fn scan_blocks(&self, from: u64, to: u64) -> Result<FilterOutput, EthError> {
        let mut hashes = Vec::with_capacity((to - from + 1) as usize);
        for height in from..=to {
            if let Some(header) = self.ledger.header_by_height(height).await? {
                hashes.push(header.hash);
            }
        }
        Ok(hashes.into_iter().collect())
    }
}

/// Flatten log match criteria into the indexer's query shape for the given
/// height span. Empty address / topic positions are wildcards in both shapes.
pub(crate) fn criteria_to_query(criteria: &Filter, from: u64, to: u64) -> LogQuery {
    LogQuery {
        from,
        to,
        addresses: criteria.address.iter().copied().collect(),
        topics: criteria.topics.iter().map(|set| set.iter().copied().collect()).collect(),
    }
}

/// Manager for installed filters.
///
/// Filters live in a [`TtlCache`] keyed by their ID, so a filter left
/// unpolled past the store's TTL simply disappears; every poll refreshes it.
/// Polling reads sealed state through the ledger and indexer rather than
/// buffering notifications, so the manager carries no per-filter memory
/// beyond the cursor.
#[derive(Debug, Clone)]
pub(crate) struct FilterManager {
    inner: Arc<FilterManagerInner>,
}

impl FilterManager {
    /// Create a new filter manager. Spawns the store's sweeper so expired
    /// filters are dropped even when never polled again.
    pub(crate) fn new(
        store: TtlCache,
        ledger: Arc<dyn LedgerReader>,
        indexer: Arc<dyn LogIndexer>,
        max_blocks_per_poll: u64,
    ) -> Self {
        store.spawn_sweeper(store.ttl());
        Self {
            inner: Arc::new(FilterManagerInner {
                counter: AtomicU64::new(1),
                store,
                ledger,
                indexer,
                max_blocks_per_poll,
            }),
        }
    }
}

impl std::ops::Deref for FilterManager {
    type Target = FilterManagerInner;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{test_block_hash, test_chain, test_header, test_log, MockIndexer, MockLedger};
    use alloy::primitives::Address;
    use meridian_types::BlockView;
    use std::time::Duration;

    fn manager(tip: u64, records: Vec<meridian_types::IndexedLog>) -> FilterManager {
        FilterManager::new(
            TtlCache::new(Duration::from_secs(60)),
            Arc::new(MockLedger::new(test_chain(tip))),
            Arc::new(MockIndexer::new(records)),
            1_000,
        )
    }

    #[tokio::test]
    async fn test_identical_criteria_get_distinct_ids() {
        let mgr = manager(3, vec![]);

        let a = mgr.install_log_filter(Filter::new()).await.unwrap();
        let b = mgr.install_log_filter(Filter::new()).await.unwrap();
        assert_ne!(a, b);

        // Both handles resolve independently.
        assert!(mgr.poll(a).await.unwrap().is_empty());
        assert!(mgr.poll(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_block_filter_sees_only_new_blocks() {
        let ledger = Arc::new(MockLedger::new(test_chain(2)));
        let mgr = FilterManager::new(
            TtlCache::new(Duration::from_secs(60)),
            ledger.clone(),
            Arc::new(MockIndexer::default()),
            1_000,
        );

        let id = mgr.install_block_filter().await.unwrap();
        assert!(mgr.poll(id).await.unwrap().is_empty());

        ledger.push_block(BlockView { header: test_header(3), actions: vec![] });
        assert_eq!(mgr.poll(id).await.unwrap(), FilterOutput::Block(vec![test_block_hash(3)]));

        // Nothing new: empty again, not a repeat.
        assert!(mgr.poll(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_filter_replays_from_block() {
        let emitter = Address::repeat_byte(0x42);
        let records =
            vec![test_log(1, emitter), test_log(2, emitter), test_log(3, emitter)];
        let mgr = manager(3, records);

        let id = mgr
            .install_log_filter(Filter::new().address(emitter).from_block(2u64))
            .await
            .unwrap();

        let out = mgr.poll(id).await.unwrap();
        assert_eq!(out.len(), 2);
        assert!(matches!(out, FilterOutput::Log(_)));

        assert!(mgr.poll(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_filter_scan_caps_at_to_block() {
        let emitter = Address::repeat_byte(0x42);
        let records =
            vec![test_log(1, emitter), test_log(2, emitter), test_log(3, emitter)];
        let mgr = manager(3, records);

        let id = mgr
            .install_log_filter(Filter::new().address(emitter).from_block(2u64).to_block(2u64))
            .await
            .unwrap();

        assert_eq!(mgr.poll(id).await.unwrap().len(), 1);
        // The cursor has moved past the window; later polls stay empty.
        assert!(mgr.poll(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_block_beyond_tip_waits_for_the_chain() {
        let emitter = Address::repeat_byte(0x42);
        let ledger = Arc::new(MockLedger::new(test_chain(2)));
        let mgr = FilterManager::new(
            TtlCache::new(Duration::from_secs(60)),
            ledger.clone(),
            Arc::new(MockIndexer::new(vec![test_log(5, emitter)])),
            1_000,
        );

        let id = mgr.install_log_filter(Filter::new().from_block(5u64)).await.unwrap();
        assert!(mgr.poll(id).await.unwrap().is_empty());

        for height in 3..=5 {
            ledger.push_block(BlockView { header: test_header(height), actions: vec![] });
        }
        assert_eq!(mgr.poll(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_poll_consumes_at_most_the_configured_span() {
        let ledger = Arc::new(MockLedger::new(test_chain(5)));
        let mgr = FilterManager::new(
            TtlCache::new(Duration::from_secs(60)),
            ledger,
            Arc::new(MockIndexer::default()),
            2,
        );

        let id = mgr.install_log_filter(Filter::new().from_block(1u64)).await.unwrap();

        // Five blocks behind, two per poll: 2 + 2 + 1, then caught up.
        mgr.poll(id).await.unwrap();
        assert_eq!(mgr.load(id).unwrap().cursor, 2);
        mgr.poll(id).await.unwrap();
        assert_eq!(mgr.load(id).unwrap().cursor, 4);
        mgr.poll(id).await.unwrap();
        assert_eq!(mgr.load(id).unwrap().cursor, 5);
        assert!(mgr.poll(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poll_unknown_filter_errors() {
        let mgr = manager(1, vec![]);
        assert!(matches!(mgr.poll(B256::ZERO).await.unwrap_err(), EthError::FilterNotFound));
    }

    #[tokio::test]
    async fn test_poll_as_logs_rejects_block_filters() {
        let mgr = manager(1, vec![]);
        let id = mgr.install_block_filter().await.unwrap();
        assert!(matches!(mgr.poll_as_logs(id).await.unwrap_err(), EthError::NotLogFilter));
    }

    #[tokio::test]
    async fn test_uninstall_is_idempotent() {
        let mgr = manager(1, vec![]);
        let id = mgr.install_block_filter().await.unwrap();

        assert!(mgr.uninstall(id).unwrap());
        assert!(!mgr.uninstall(id).unwrap());
        assert!(matches!(mgr.poll(id).await.unwrap_err(), EthError::FilterNotFound));
    }

    #[tokio::test]
    async fn test_unpolled_filter_expires() {
        let mgr = FilterManager::new(
            TtlCache::new(Duration::from_millis(20)),
            Arc::new(MockLedger::new(test_chain(1))),
            Arc::new(MockIndexer::default()),
            1_000,
        );

        let id = mgr.install_block_filter().await.unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert!(matches!(mgr.poll(id).await.unwrap_err(), EthError::FilterNotFound));
    }

    #[test]
    fn test_criteria_to_query_positions_topics() {
        let emitter = Address::repeat_byte(0x42);
        let topic = B256::repeat_byte(0xee);
        let criteria = Filter::new().address(emitter).event_signature(topic);

        let query = criteria_to_query(&criteria, 1, 5);
        assert_eq!(query.from, 1);
        assert_eq!(query.to, 5);
        assert_eq!(query.addresses, vec![emitter]);
        assert_eq!(query.topics[0], vec![topic]);
        assert!(query.topics[1].is_empty());
    }

    #[test]
    fn test_empty_output_serializes_as_array() {
        let json = serde_json::to_string(&FilterOutput::empty()).unwrap();
        assert_eq!(json, "[]");
    }
}
