//! # Data Source Types
//!
//! Typed values produced by the fetch clients. Each value is a consistent
//! snapshot from a single fetch; fields are never mixed across cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single price observation.
///
/// An absent price is a valid, renderable state: the endpoint answered
/// but carried no quote for the asset (or nothing has been fetched yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price in USD, absent when the endpoint had no quote.
    pub price: Option<f64>,
    /// When this observation was made.
    pub observed_at: DateTime<Utc>,
}

impl PriceQuote {
    /// Quote placeholder for "no observation yet".
    pub fn placeholder() -> Self {
        Self {
            price: None,
            observed_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Cluster statistics assembled from one RPC poll cycle.
///
/// All fields come from the same cycle's three RPC responses; if any of
/// the calls fails the whole fetch fails and no partial value is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Rounded transactions per second from the most recent performance
    /// sample, 0 when the cluster reports no sample.
    pub transactions_per_second: u64,
    /// Current slot at the time of the poll.
    pub current_slot: u64,
    /// Current epoch number.
    pub epoch: u64,
    /// Progress through the current epoch, in [0, 100].
    pub epoch_progress_percent: f64,
    /// Current block height.
    pub block_height: u64,
}
