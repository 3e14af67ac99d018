//! Orderbook replica state machine
//!
//! Applies decoded updates and verifies the result against Kraken's checksum.
//!
//! # State Machine
//!
//! ```text
//! Uninitialized → Synced ↔ Desynchronized
//! ```
//!
//! The state is informational. Updates are applied in every state; a
//! checksum mismatch is reported through the returned error and the caller
//! decides whether to wait for a new snapshot or discard the replica.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use kraken_wire::{Side, Update};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    checksum::{compute_checksum, Checksum},
    config::ReplicaConfig,
    error::{ReplicaError, ReplicaResult},
    storage::{Level, LevelTable},
};

/// Orderbook synchronization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookState {
    /// No snapshot received yet
    #[default]
    Uninitialized,
    /// Snapshot applied and the last update verified
    Synced,
    /// The last update failed verification
    Desynchronized,
}

/// Result of applying an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Snapshot replaced the book
    Snapshot,
    /// Incremental update applied and checksum verified
    Verified(Checksum),
}

#[derive(Debug)]
struct Tables {
    asks: LevelTable,
    bids: LevelTable,
    state: BookState,
    last_checksum: Option<Checksum>,
}

impl Tables {
    fn new() -> Self {
        Self {
            asks: LevelTable::new(Side::Ask),
            bids: LevelTable::new(Side::Bid),
            state: BookState::Uninitialized,
            last_checksum: None,
        }
    }

    fn table(&self, side: Side) -> &LevelTable {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    fn table_mut(&mut self, side: Side) -> &mut LevelTable {
        match side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        }
    }

    fn load_snapshot(&mut self, update: &Update) {
        for side in [Side::Ask, Side::Bid] {
            let changes = update.changes(side);
            self.table_mut(side)
                .replace(changes.iter().map(|level| (level.price, level.volume)));
        }
        self.state = BookState::Synced;
        self.last_checksum = None;
    }

    fn apply_changes(&mut self, update: &Update) {
        for side in [Side::Ask, Side::Bid] {
            let table = self.table_mut(side);
            for level in update.changes(side) {
                // Zero volume removes; an absent price is a no-op
                table.upsert(level.price, level.volume);
            }
        }
    }

    /// Hash the top of the book and drop every level below the window
    fn checksum(&mut self, config: &ReplicaConfig) -> Checksum {
        let depth = config.checksum_depth;
        let asks = self.asks.ranked(config.ranking);
        let bids = self.bids.ranked(config.ranking);

        let checksum = compute_checksum(&asks, &bids, depth);

        for level in asks.iter().skip(depth) {
            self.asks.remove(&level.price);
        }
        for level in bids.iter().skip(depth) {
            self.bids.remove(&level.price);
        }

        checksum
    }
}

/// Checksum-verified replica of one symbol's orderbook
///
/// Every method takes the same exclusive lock for its whole duration, so an
/// `Orderbook` can be shared through an `Arc` between an ingesting task and a
/// reporter. The lock serializes calls but does not order them: updates must
/// be applied in the order the exchange published them.
#[derive(Debug)]
pub struct Orderbook {
    config: ReplicaConfig,
    tables: Mutex<Tables>,
}

impl Default for Orderbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Orderbook {
    /// Create an empty orderbook with Kraken's defaults
    pub fn new() -> Self {
        Self::with_config(ReplicaConfig::default())
    }

    /// Create an empty orderbook with a specific configuration
    pub fn with_config(config: ReplicaConfig) -> Self {
        Self {
            config,
            tables: Mutex::new(Tables::new()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    /// Apply a decoded update
    ///
    /// A snapshot replaces both sides and is never verified. An incremental
    /// update is applied, then the book is ranked, pruned to the checksum
    /// window, hashed and compared with the declared checksum, all under one
    /// lock acquisition.
    ///
    /// On [`ReplicaError::ChecksumMismatch`] the update stays applied: there
    /// is no rollback. The replica should be treated as desynchronized until
    /// the next snapshot.
    pub fn apply(&self, update: &Update) -> ReplicaResult<ApplyOutcome> {
        let mut tables = self.tables.lock();

        if update.is_snapshot() {
            tables.load_snapshot(update);
            debug!(
                asks = tables.asks.len(),
                bids = tables.bids.len(),
                "Applied book snapshot"
            );
            return Ok(ApplyOutcome::Snapshot);
        }

        tables.apply_changes(update);
        let computed = tables.checksum(&self.config);
        let expected = update.checksum.as_deref().unwrap_or_default();

        trace!(
            asks = update.asks.len(),
            bids = update.bids.len(),
            republished = update.republished(),
            %computed,
            "Applied book update"
        );

        if !computed.matches(expected) {
            tables.state = BookState::Desynchronized;
            warn!(%computed, expected, "Book checksum mismatch");
            return Err(ReplicaError::ChecksumMismatch {
                computed,
                expected: expected.to_string(),
            });
        }

        tables.state = BookState::Synced;
        tables.last_checksum = Some(computed);
        Ok(ApplyOutcome::Verified(computed))
    }

    /// Decode a raw book payload and apply it
    ///
    /// Decode failures leave the replica untouched.
    pub fn apply_raw(&self, raw: &str) -> ReplicaResult<ApplyOutcome> {
        let update = kraken_wire::decode(raw)?;
        self.apply(&update)
    }

    /// Compute the checksum of the current book
    ///
    /// **This is not a pure read.** Levels ranked below the checksum window
    /// (10 per side) are deleted from the book, exactly as [`apply`] does
    /// after every incremental update. Calling it again without an
    /// intervening update returns the same value.
    ///
    /// [`apply`]: Orderbook::apply
    pub fn checksum(&self) -> Checksum {
        self.tables.lock().checksum(&self.config)
    }

    /// Check if both sides are empty
    pub fn is_empty(&self) -> bool {
        let tables = self.tables.lock();
        tables.asks.is_empty() && tables.bids.is_empty()
    }

    /// Get the current state
    pub fn state(&self) -> BookState {
        self.tables.lock().state
    }

    /// Check if the orderbook is synchronized
    pub fn is_synced(&self) -> bool {
        self.state() == BookState::Synced
    }

    /// Get the last verified checksum
    pub fn last_checksum(&self) -> Option<Checksum> {
        self.tables.lock().last_checksum
    }

    /// Number of ask levels
    pub fn ask_count(&self) -> usize {
        self.tables.lock().asks.len()
    }

    /// Number of bid levels
    pub fn bid_count(&self) -> usize {
        self.tables.lock().bids.len()
    }

    /// Look up a level by side and price
    pub fn level(&self, side: Side, price: &Decimal) -> Option<Level> {
        self.tables.lock().table(side).get(price).copied()
    }

    /// All levels of a side, best first
    pub fn levels(&self, side: Side) -> Vec<Level> {
        self.tables.lock().table(side).ranked(self.config.ranking)
    }

    /// Get the best ask
    pub fn best_ask(&self) -> Option<Level> {
        self.tables.lock().asks.best().copied()
    }

    /// Get the best bid
    pub fn best_bid(&self) -> Option<Level> {
        self.tables.lock().bids.best().copied()
    }

    /// Get the spread (ask - bid)
    pub fn spread(&self) -> Option<Decimal> {
        let tables = self.tables.lock();
        match (tables.asks.best(), tables.bids.best()) {
            (Some(ask), Some(bid)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Clear both sides and forget the sync state
    pub fn reset(&self) {
        *self.tables.lock() = Tables::new();
    }

    /// Capture the book for reporting
    pub fn view(&self) -> BookView {
        let tables = self.tables.lock();
        let collect = |table: &LevelTable| {
            table
                .iter()
                .map(|level| (level.price, level.volume))
                .collect::<BTreeMap<_, _>>()
        };

        BookView {
            ask: collect(&tables.asks),
            bid: collect(&tables.bids),
            captured_at: Utc::now().trunc_subsecs(0),
        }
    }

    /// Capture the book and render it as JSON
    pub fn to_json(&self) -> ReplicaResult<String> {
        Ok(serde_json::to_string(&self.view())?)
    }
}

/// Immutable view of the book for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookView {
    /// Ask price → volume
    pub ask: BTreeMap<Decimal, Decimal>,
    /// Bid price → volume
    pub bid: BTreeMap<Decimal, Decimal>,
    /// Capture time, whole seconds
    pub captured_at: DateTime<Utc>,
}

impl BookView {
    /// Get the best ask price
    pub fn best_ask_price(&self) -> Option<Decimal> {
        self.ask.keys().next().copied()
    }

    /// Get the best bid price
    pub fn best_bid_price(&self) -> Option<Decimal> {
        self.bid.keys().next_back().copied()
    }

    /// Get the spread
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask_price(), self.best_bid_price()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Check if both sides are empty
    pub fn is_empty(&self) -> bool {
        self.ask.is_empty() && self.bid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ranking;
    use chrono::Timelike;
    use kraken_wire::LevelChange;
    use rust_decimal_macros::dec;

    fn change(price: Decimal, volume: Decimal) -> LevelChange {
        LevelChange::new(price, volume, dec!(1669902400.000000))
    }

    /// Checksum of the `snapshot()` book
    const SNAPSHOT_CHECKSUM: &str = "3046195854";

    fn snapshot() -> Update {
        Update::snapshot(
            vec![
                change(dec!(101.50000), dec!(1.00000000)),
                change(dec!(101.60000), dec!(2.50000000)),
                change(dec!(101.70000), dec!(0.12500000)),
            ],
            vec![
                change(dec!(101.40000), dec!(3.00000000)),
                change(dec!(101.30000), dec!(0.75000000)),
            ],
        )
    }

    fn synced_book() -> Orderbook {
        let book = Orderbook::new();
        assert_eq!(book.apply(&snapshot()).unwrap(), ApplyOutcome::Snapshot);
        book
    }

    #[test]
    fn test_new_book_is_empty() {
        let book = Orderbook::new();
        assert!(book.is_empty());
        assert_eq!(book.state(), BookState::Uninitialized);
        assert!(book.last_checksum().is_none());
    }

    #[test]
    fn test_snapshot() {
        let book = synced_book();
        assert!(!book.is_empty());
        assert!(book.is_synced());
        assert_eq!(book.ask_count(), 3);
        assert_eq!(book.bid_count(), 2);
        assert_eq!(book.best_ask().unwrap().price, dec!(101.5));
        assert_eq!(book.best_bid().unwrap().price, dec!(101.4));
        assert_eq!(book.spread(), Some(dec!(0.1)));
    }

    #[test]
    fn test_snapshot_replaces_previous_book() {
        let book = synced_book();
        book.apply(&Update::snapshot(
            vec![change(dec!(200), dec!(1))],
            vec![change(dec!(199), dec!(1))],
        ))
        .unwrap();

        assert_eq!(book.ask_count(), 1);
        assert_eq!(book.bid_count(), 1);
        assert!(book.level(Side::Ask, &dec!(101.5)).is_none());
    }

    #[test]
    fn test_empty_snapshot_empties_book() {
        let book = synced_book();
        book.apply(&Update::snapshot(vec![], vec![])).unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn test_checksum_of_snapshot() {
        let book = synced_book();
        assert_eq!(book.checksum().to_string(), SNAPSHOT_CHECKSUM);
    }

    #[test]
    fn test_verified_update() {
        let book = synced_book();
        let update = Update::incremental(
            vec![],
            vec![change(dec!(101.40000), dec!(4.00000000))],
            "2076294694",
        );

        let outcome = book.apply(&update).unwrap();
        assert_eq!(outcome, ApplyOutcome::Verified(Checksum::new(2076294694)));
        assert_eq!(book.last_checksum(), Some(Checksum::new(2076294694)));
        assert_eq!(
            book.level(Side::Bid, &dec!(101.4)).unwrap().volume,
            dec!(4)
        );
    }

    #[test]
    fn test_zero_volume_for_absent_price() {
        let book = synced_book();
        let update = Update::incremental(
            vec![change(dec!(105.00000), dec!(0.00000000))],
            vec![],
            SNAPSHOT_CHECKSUM,
        );

        book.apply(&update).unwrap();
        assert_eq!(book.ask_count(), 3);
        assert!(book.level(Side::Ask, &dec!(105)).is_none());
    }

    #[test]
    fn test_zero_volume_removes_only_that_price() {
        let book = synced_book();
        let update = Update::incremental(
            vec![],
            vec![change(dec!(101.30000), dec!(0))],
            "2234820822",
        );

        book.apply(&update).unwrap();
        assert_eq!(book.bid_count(), 1);
        assert_eq!(book.ask_count(), 3);
        assert!(book.level(Side::Bid, &dec!(101.3)).is_none());
        assert!(book.level(Side::Bid, &dec!(101.4)).is_some());
    }

    #[test]
    fn test_mismatch_keeps_update() {
        let book = synced_book();
        let update = Update::incremental(
            vec![],
            vec![change(dec!(101.40000), dec!(4.00000000))],
            "2076294695",
        );

        let err = book.apply(&update).unwrap_err();
        match err {
            ReplicaError::ChecksumMismatch { computed, expected } => {
                assert_eq!(computed, Checksum::new(2076294694));
                assert_eq!(expected, "2076294695");
            }
            other => panic!("Expected ChecksumMismatch, got {other:?}"),
        }

        assert_eq!(book.state(), BookState::Desynchronized);
        assert_eq!(
            book.level(Side::Bid, &dec!(101.4)).unwrap().volume,
            dec!(4)
        );
        assert!(book.last_checksum().is_none());
    }

    #[test]
    fn test_missing_checksum_never_verifies() {
        let book = synced_book();
        let mut update = Update::incremental(vec![], vec![], "");
        update.checksum = None;

        let err = book.apply(&update).unwrap_err();
        assert!(matches!(
            err,
            ReplicaError::ChecksumMismatch { ref expected, .. } if expected.is_empty()
        ));
    }

    #[test]
    fn test_snapshot_resyncs_after_mismatch() {
        let book = synced_book();
        let _ = book.apply(&Update::incremental(vec![], vec![], "0"));
        assert_eq!(book.state(), BookState::Desynchronized);

        book.apply(&snapshot()).unwrap();
        assert_eq!(book.state(), BookState::Synced);
    }

    #[test]
    fn test_checksum_prunes_and_is_idempotent() {
        let book = Orderbook::with_config(ReplicaConfig::new().with_checksum_depth(2));
        book.apply(&snapshot()).unwrap();

        let first = book.checksum();
        assert_eq!(first.value(), 3687560505);
        assert_eq!(book.ask_count(), 2);
        assert!(book.level(Side::Ask, &dec!(101.7)).is_none());

        assert_eq!(book.checksum(), first);
        assert_eq!(book.ask_count(), 2);
        assert_eq!(book.bid_count(), 2);
    }

    #[test]
    fn test_float_ranking_agrees_on_ordinary_prices() {
        let book = Orderbook::with_config(ReplicaConfig::new().with_ranking(Ranking::Float));
        book.apply(&snapshot()).unwrap();
        assert_eq!(book.checksum().to_string(), SNAPSHOT_CHECKSUM);
    }

    #[test]
    fn test_apply_raw_decode_error_leaves_book() {
        let book = synced_book();
        let err = book
            .apply_raw(r#"{"a": [["101.5", "1"]], "c": "1"}"#)
            .unwrap_err();
        assert!(matches!(err, ReplicaError::Decode(_)));
        assert_eq!(book.ask_count(), 3);
        assert!(book.is_synced());
    }

    #[test]
    fn test_reset() {
        let book = synced_book();
        book.reset();
        assert!(book.is_empty());
        assert_eq!(book.state(), BookState::Uninitialized);
    }

    #[test]
    fn test_view() {
        let book = synced_book();
        let view = book.view();

        assert_eq!(view.ask.len(), 3);
        assert_eq!(view.bid.len(), 2);
        assert_eq!(view.best_ask_price(), Some(dec!(101.5)));
        assert_eq!(view.best_bid_price(), Some(dec!(101.4)));
        assert_eq!(view.spread(), Some(dec!(0.1)));
        assert_eq!(view.captured_at.nanosecond(), 0);
        assert!(!view.is_empty());
    }

    #[test]
    fn test_to_json_keeps_wire_scale() {
        let book = synced_book();
        let json: serde_json::Value = serde_json::from_str(&book.to_json().unwrap()).unwrap();

        assert_eq!(json["ask"]["101.50000"], "1.00000000");
        assert_eq!(json["bid"]["101.30000"], "0.75000000");
        assert!(json["captured_at"].is_string());
    }
}
