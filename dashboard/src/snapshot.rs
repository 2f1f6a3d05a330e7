//! # View Snapshot
//!
//! Pure aggregation of the per-source states and the wallet session into
//! the one immutable view model the presentation layer reads. No fetching
//! and no clocks in here; everything derives from the inputs.

use crate::poller::source::SourceState;
use crate::session::WalletSession;
use chrono::{DateTime, Utc};
use lib_solana::{FetchErrorKind, NetworkStats, PriceQuote};
use serde::Serialize;

/// Health of one data source, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHealth {
    /// Kind of the most recent fetch error, if the last fetch failed.
    pub error: Option<FetchErrorKind>,
    /// The source has failed enough consecutive cycles to be unreliable.
    pub degraded: bool,
}

impl SourceHealth {
    fn of<T>(state: &SourceState<T>) -> Self {
        Self {
            error: state.last_error,
            degraded: state.degraded,
        }
    }
}

/// Per-source health, keyed by source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHealthReport {
    pub price: SourceHealth,
    pub network: SourceHealth,
    pub balance: SourceHealth,
}

/// Immutable view model for one render of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    /// Latest price quote; a placeholder with no price until the first
    /// successful fetch.
    pub price: PriceQuote,
    /// Latest cluster statistics, absent until the first successful fetch.
    pub network: Option<NetworkStats>,
    /// Wallet session, with the polled balance folded into `Connected`.
    pub wallet: WalletSession,
    /// When any source last fetched successfully.
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub sources: SourceHealthReport,
}

/// Merge the source states and the wallet session into a snapshot.
///
/// The balance is folded into the `Connected` session state here rather
/// than written back into the session, so the session controller stays
/// the only writer of session state.
pub fn aggregate(
    price: &SourceState<PriceQuote>,
    network: &SourceState<NetworkStats>,
    balance: &SourceState<f64>,
    wallet: &WalletSession,
) -> ViewSnapshot {
    let wallet = match wallet {
        WalletSession::Connected { account_id, .. } => WalletSession::Connected {
            account_id: account_id.clone(),
            balance: balance.value,
        },
        other => other.clone(),
    };

    ViewSnapshot {
        price: price.value.clone().unwrap_or_else(PriceQuote::placeholder),
        network: network.value.clone(),
        wallet,
        last_refreshed_at: latest_of(&[
            price.last_success_at,
            network.last_success_at,
            balance.last_success_at,
        ]),
        sources: SourceHealthReport {
            price: SourceHealth::of(price),
            network: SourceHealth::of(network),
            balance: SourceHealth::of(balance),
        },
    }
}

fn latest_of(times: &[Option<DateTime<Utc>>]) -> Option<DateTime<Utc>> {
    times.iter().flatten().max().copied()
}
