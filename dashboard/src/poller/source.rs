//! # Per-Source Published State
//!
//! Each data source publishes its latest good value through a
//! [`SourceCell`]. The cell enforces the supersession rule: results are
//! applied in cycle order, a stale completion never rolls the value
//! back, and a failed fetch never clears a previously good value.

use chrono::{DateTime, Utc};
use lib_solana::FetchErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Consecutive failed cycles after which a source is flagged degraded.
pub const DEGRADED_AFTER: u32 = 3;

/// Published state of one data source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceState<T> {
    /// Latest value from a successful fetch, kept across failures.
    pub value: Option<T>,
    /// Error kind of the most recent fetch, cleared on success.
    pub last_error: Option<FetchErrorKind>,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Set once `consecutive_failures` reaches [`DEGRADED_AFTER`].
    pub degraded: bool,
    /// When the most recent successful fetch completed.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Cycle sequence number of the last applied result.
    applied_seq: u64,
}

impl<T> SourceState<T> {
    fn new() -> Self {
        Self {
            value: None,
            last_error: None,
            consecutive_failures: 0,
            degraded: false,
            last_success_at: None,
            applied_seq: 0,
        }
    }

    /// True when the most recent fetch failed.
    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }
}

impl<T> Default for SourceState<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-writer cell holding one source's published state.
///
/// Only the source's own cycle task writes to it; everyone else holds a
/// watch receiver. Sequence numbers are handed out by [`begin_cycle`]
/// and checked on publish, so completions that interleave out of order
/// are discarded instead of applied.
///
/// [`begin_cycle`]: SourceCell::begin_cycle
pub struct SourceCell<T> {
    tx: watch::Sender<SourceState<T>>,
    seq: AtomicU64,
}

impl<T: Clone> SourceCell<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SourceState::new());
        Self {
            tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SourceState<T>> {
        self.tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SourceState<T> {
        self.tx.borrow().clone()
    }

    /// Reserve the sequence number for a new fetch cycle.
    pub fn begin_cycle(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Apply a successful fetch result.
    ///
    /// Returns false when a later cycle already published, in which case
    /// this result is discarded.
    pub fn publish_success(&self, seq: u64, value: T, observed_at: DateTime<Utc>) -> bool {
        self.tx.send_if_modified(|state| {
            if seq <= state.applied_seq {
                return false;
            }
            state.applied_seq = seq;
            state.value = Some(value.clone());
            state.last_error = None;
            state.consecutive_failures = 0;
            state.degraded = false;
            state.last_success_at = Some(observed_at);
            true
        })
    }

    /// Apply a failed fetch result.
    ///
    /// The last good value is left untouched; only the error flag and
    /// the failure streak move. Returns false when superseded.
    pub fn publish_failure(&self, seq: u64, kind: FetchErrorKind) -> bool {
        self.tx.send_if_modified(|state| {
            if seq <= state.applied_seq {
                return false;
            }
            state.applied_seq = seq;
            state.last_error = Some(kind);
            state.consecutive_failures += 1;
            state.degraded = state.consecutive_failures >= DEGRADED_AFTER;
            true
        })
    }

    /// Clear the cell back to its initial state.
    ///
    /// Any cycle already begun is fenced out: its eventual result will
    /// be discarded as superseded. Used when the balance cycle stops on
    /// wallet disconnect.
    pub fn reset(&self) {
        let fence = self.seq.load(Ordering::Relaxed);
        self.tx.send_modify(|state| {
            *state = SourceState::new();
            state.applied_seq = fence;
        });
    }
}

impl<T: Clone> Default for SourceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
