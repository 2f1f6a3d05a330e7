//! # Poller
//!
//! Independent repeating fetch cycles, one task per data source. Cycles
//! never block each other: a slow or hung fetch on one source cannot
//! delay another source's schedule. Failures are recovered locally by
//! publishing an error flag and keeping the last good value; there is no
//! backoff because intervals are short and transient failures are cheap
//! to retry.

pub mod source;

use crate::service::MarketDataApi;
use crate::session::WalletSession;
use chrono::Utc;
use lib_solana::{FetchError, FetchErrorKind, NetworkStats, PriceQuote};
use source::{SourceCell, SourceState};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Cadence and timeout settings for the fetch cycles.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub price_interval: Duration,
    pub network_interval: Duration,
    /// Balance cadence; the cycle only runs while the wallet session is
    /// connected.
    pub balance_interval: Duration,
    /// Per-fetch time budget, applied to every cycle of every source.
    pub fetch_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            price_interval: Duration::from_secs(30),
            network_interval: Duration::from_secs(10),
            balance_interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Schedules the per-source fetch cycles and owns their published state.
///
/// Starting the poller triggers one immediate fetch per active source
/// before the interval wait, so first paint is not delayed by a full
/// interval.
pub struct Poller {
    price: Arc<SourceCell<PriceQuote>>,
    network: Arc<SourceCell<NetworkStats>>,
    balance: Arc<SourceCell<f64>>,
    refresh_balance: Arc<Notify>,
    tasks: Vec<JoinHandle<()>>,
}

impl Poller {
    /// Spawn the cycle tasks and return the handle owning them.
    ///
    /// The balance cycle is gated on `session_rx`: it starts when the
    /// session enters `Connected` and stops, cancelling any in-flight
    /// request, when it leaves.
    pub fn start(
        api: Arc<dyn MarketDataApi>,
        session_rx: watch::Receiver<WalletSession>,
        config: PollerConfig,
    ) -> Self {
        let price = Arc::new(SourceCell::new());
        let network = Arc::new(SourceCell::new());
        let balance = Arc::new(SourceCell::new());
        let refresh_balance = Arc::new(Notify::new());

        let mut tasks = Vec::new();

        {
            let api = Arc::clone(&api);
            let cell = Arc::clone(&price);
            tasks.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.price_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    run_cycle(&cell, "price", config.fetch_timeout, api.fetch_price()).await;
                }
            }));
        }

        {
            let api = Arc::clone(&api);
            let cell = Arc::clone(&network);
            tasks.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.network_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    run_cycle(
                        &cell,
                        "network",
                        config.fetch_timeout,
                        api.fetch_network_stats(),
                    )
                    .await;
                }
            }));
        }

        {
            let cell = Arc::clone(&balance);
            let refresh = Arc::clone(&refresh_balance);
            tasks.push(tokio::spawn(poll_balance(
                api, cell, session_rx, refresh, config,
            )));
        }

        info!(
            price_interval_s = config.price_interval.as_secs(),
            network_interval_s = config.network_interval.as_secs(),
            balance_interval_s = config.balance_interval.as_secs(),
            "poller started"
        );

        Self {
            price,
            network,
            balance,
            refresh_balance,
            tasks,
        }
    }

    /// Subscribe to the price source state.
    pub fn subscribe_price(&self) -> watch::Receiver<SourceState<PriceQuote>> {
        self.price.subscribe()
    }

    /// Subscribe to the network stats source state.
    pub fn subscribe_network(&self) -> watch::Receiver<SourceState<NetworkStats>> {
        self.network.subscribe()
    }

    /// Subscribe to the balance source state.
    pub fn subscribe_balance(&self) -> watch::Receiver<SourceState<f64>> {
        self.balance.subscribe()
    }

    /// Trigger one out-of-cycle balance fetch.
    ///
    /// No-op while the balance cycle is not running (session not
    /// connected).
    pub fn refresh_balance(&self) {
        self.refresh_balance.notify_one();
    }

    /// Abort all cycle tasks.
    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Run one fetch cycle against a source cell.
///
/// Reserves the cycle sequence number up front so a result that resolves
/// after a later cycle has published is discarded, never applied.
async fn run_cycle<T, Fut>(cell: &SourceCell<T>, source: &'static str, timeout: Duration, fetch: Fut)
where
    T: Clone,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let seq = cell.begin_cycle();
    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok(value)) => {
            if cell.publish_success(seq, value, Utc::now()) {
                debug!(source, cycle = seq, "published fresh value");
            } else {
                debug!(source, cycle = seq, "result superseded, discarded");
            }
        }
        Ok(Err(e)) => {
            warn!(source, cycle = seq, error = %e, "fetch failed, keeping last good value");
            cell.publish_failure(seq, e.kind());
        }
        Err(_) => {
            warn!(
                source,
                cycle = seq,
                timeout_ms = timeout.as_millis() as u64,
                "fetch timed out"
            );
            cell.publish_failure(seq, FetchErrorKind::Timeout);
        }
    }
}

/// Balance cycle, gated by the wallet session state.
async fn poll_balance(
    api: Arc<dyn MarketDataApi>,
    cell: Arc<SourceCell<f64>>,
    mut session_rx: watch::Receiver<WalletSession>,
    refresh: Arc<Notify>,
    config: PollerConfig,
) {
    loop {
        // Park until the session is connected.
        let account = match session_rx.wait_for(|s| s.is_connected()).await {
            Ok(state) => match state.account_id() {
                Some(id) => id.to_string(),
                None => continue,
            },
            Err(_) => return,
        };

        info!(account = %account, "balance polling started");
        let mut interval = tokio::time::interval(config.balance_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Leaving Connected (or switching accounts) cancels any
                // in-flight fetch and clears the published balance.
                changed = session_rx.wait_for(|s| s.account_id() != Some(account.as_str())) => {
                    cell.reset();
                    info!(account = %account, "balance polling stopped");
                    match changed {
                        Ok(_) => break,
                        Err(_) => return,
                    }
                }
                _ = async {
                    interval.tick().await;
                    balance_cycle(api.as_ref(), &cell, &account, config.fetch_timeout).await;
                } => {}
                _ = async {
                    refresh.notified().await;
                    debug!(account = %account, "out-of-cycle balance refresh");
                    balance_cycle(api.as_ref(), &cell, &account, config.fetch_timeout).await;
                } => {}
            }
        }
    }
}

async fn balance_cycle(
    api: &dyn MarketDataApi,
    cell: &SourceCell<f64>,
    account: &str,
    timeout: Duration,
) {
    let fetch = async {
        match api.fetch_balance(account).await {
            // An unfunded account is a valid state, not a failure.
            Err(FetchError::NotFound) => Ok(0.0),
            other => other,
        }
    };
    run_cycle(cell, "balance", timeout, fetch).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Scripted market data: each call pops the next outcome; an
    /// exhausted script hangs forever (useful for timeout and
    /// cancellation tests).
    struct MockApi {
        price: Mutex<VecDeque<Result<PriceQuote, FetchError>>>,
        network: Mutex<VecDeque<Result<NetworkStats, FetchError>>>,
        balance: Mutex<VecDeque<Result<f64, FetchError>>>,
        balance_accounts: Mutex<Vec<String>>,
    }

    impl MockApi {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                price: Mutex::new(VecDeque::new()),
                network: Mutex::new(VecDeque::new()),
                balance: Mutex::new(VecDeque::new()),
                balance_accounts: Mutex::new(Vec::new()),
            })
        }

        fn push_price(&self, result: Result<PriceQuote, FetchError>) {
            self.price.lock().push_back(result);
        }

        fn push_balance(&self, result: Result<f64, FetchError>) {
            self.balance.lock().push_back(result);
        }

        fn balance_accounts(&self) -> Vec<String> {
            self.balance_accounts.lock().clone()
        }
    }

    #[async_trait]
    impl MarketDataApi for MockApi {
        async fn fetch_price(&self) -> Result<PriceQuote, FetchError> {
            let next = self.price.lock().pop_front();
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }

        async fn fetch_network_stats(&self) -> Result<NetworkStats, FetchError> {
            let next = self.network.lock().pop_front();
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }

        async fn fetch_balance(&self, account_id: &str) -> Result<f64, FetchError> {
            self.balance_accounts.lock().push(account_id.to_string());
            let next = self.balance.lock().pop_front();
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }
    }

    fn quote(price: f64) -> PriceQuote {
        PriceQuote {
            price: Some(price),
            observed_at: Utc::now(),
        }
    }

    fn connected(account: &str) -> WalletSession {
        WalletSession::Connected {
            account_id: account.to_string(),
            balance: None,
        }
    }

    fn session_channel(
        initial: WalletSession,
    ) -> (watch::Sender<WalletSession>, watch::Receiver<WalletSession>) {
        watch::channel(initial)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_is_immediate() {
        let api = MockApi::new();
        api.push_price(Ok(quote(100.0)));
        let (_tx, session_rx) = session_channel(WalletSession::Disconnected);
        let config = PollerConfig::default();

        let started = tokio::time::Instant::now();
        let poller = Poller::start(api, session_rx, config);
        let mut rx = poller.subscribe_price();

        let state = rx.wait_for(|s| s.value.is_some()).await.unwrap().clone();
        assert_eq!(state.value.unwrap().price, Some(100.0));
        assert!(
            started.elapsed() < config.price_interval,
            "first fetch must not wait a full interval"
        );
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_value_and_sets_flag() {
        let api = MockApi::new();
        api.push_price(Ok(quote(100.0)));
        api.push_price(Err(FetchError::Upstream("502".to_string())));
        let (_tx, session_rx) = session_channel(WalletSession::Disconnected);

        let poller = Poller::start(api, session_rx, PollerConfig::default());
        let mut rx = poller.subscribe_price();

        let state = rx.wait_for(|s| s.has_error()).await.unwrap().clone();
        assert_eq!(
            state.value.as_ref().and_then(|q| q.price),
            Some(100.0),
            "failed cycle must not clear the last good value"
        );
        assert_eq!(state.last_error, Some(FetchErrorKind::Upstream));
        assert_eq!(state.consecutive_failures, 1);
        assert!(!state.degraded);
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_after_three_failures_then_recovery() {
        let api = MockApi::new();
        api.push_price(Ok(quote(1.0)));
        for _ in 0..3 {
            api.push_price(Err(FetchError::Upstream("down".to_string())));
        }
        api.push_price(Ok(quote(2.0)));
        let (_tx, session_rx) = session_channel(WalletSession::Disconnected);

        let poller = Poller::start(api, session_rx, PollerConfig::default());
        let mut rx = poller.subscribe_price();

        let state = rx.wait_for(|s| s.degraded).await.unwrap().clone();
        assert_eq!(state.consecutive_failures, 3);
        assert_eq!(
            state.value.as_ref().and_then(|q| q.price),
            Some(1.0),
            "degraded source still serves the last good value"
        );

        let state = rx.wait_for(|s| !s.degraded).await.unwrap().clone();
        assert_eq!(state.value.as_ref().and_then(|q| q.price), Some(2.0));
        assert_eq!(state.consecutive_failures, 0);
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_times_out() {
        let api = MockApi::new();
        // Empty price script: the fetch never resolves.
        let (_tx, session_rx) = session_channel(WalletSession::Disconnected);
        let config = PollerConfig::default();

        let poller = Poller::start(api, session_rx, config);
        let mut rx = poller.subscribe_price();

        let state = rx.wait_for(|s| s.has_error()).await.unwrap().clone();
        assert_eq!(state.last_error, Some(FetchErrorKind::Timeout));
        assert!(state.value.is_none());
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_source_does_not_block_others() {
        let api = MockApi::new();
        // Network script is empty (hangs); price keeps answering.
        for i in 0..5 {
            api.push_price(Ok(quote(100.0 + i as f64)));
        }
        let (_tx, session_rx) = session_channel(WalletSession::Disconnected);

        let poller = Poller::start(api, session_rx, PollerConfig::default());
        let mut price_rx = poller.subscribe_price();

        // Two price cycles complete while the network fetch is hung.
        price_rx
            .wait_for(|s| s.value.as_ref().and_then(|q| q.price) == Some(100.0))
            .await
            .unwrap();
        price_rx
            .wait_for(|s| s.value.as_ref().and_then(|q| q.price) == Some(101.0))
            .await
            .unwrap();

        assert!(poller.subscribe_network().borrow().value.is_none());
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_balance_waits_for_connected_session() {
        let api = MockApi::new();
        api.push_balance(Ok(5.0));
        let (tx, session_rx) = session_channel(WalletSession::Disconnected);

        let poller = Poller::start(api.clone(), session_rx, PollerConfig::default());
        let mut rx = poller.subscribe_balance();

        // Well past several balance intervals: no fetch without a wallet.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(api.balance_accounts().is_empty());
        assert!(rx.borrow().value.is_none());

        tx.send(connected("acc1")).unwrap();
        let state = rx.wait_for(|s| s.value.is_some()).await.unwrap().clone();
        assert_eq!(state.value, Some(5.0));
        assert_eq!(api.balance_accounts(), vec!["acc1".to_string()]);
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_in_flight_fetch() {
        let api = MockApi::new();
        // Empty balance script: the fetch hangs until cancelled.
        let (tx, session_rx) = session_channel(connected("acc1"));

        let poller = Poller::start(api.clone(), session_rx, PollerConfig::default());
        let mut rx = poller.subscribe_balance();

        // Let the first cycle start its fetch, then disconnect before
        // the fetch timeout can fire.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.balance_accounts().len(), 1);
        tx.send(WalletSession::Disconnected).unwrap();

        rx.changed().await.unwrap();
        // Long after the would-be timeout and several intervals: no
        // balance update and no error ever surfaces after disconnect.
        tokio::time::sleep(Duration::from_secs(300)).await;
        let state = rx.borrow().clone();
        assert!(state.value.is_none());
        assert!(!state.has_error());
        assert_eq!(api.balance_accounts().len(), 1, "no fetch after disconnect");
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_balance_out_of_cycle() {
        let api = MockApi::new();
        api.push_balance(Ok(5.0));
        api.push_balance(Ok(6.0));
        let (_tx, session_rx) = session_channel(connected("acc1"));
        let config = PollerConfig::default();

        let poller = Poller::start(api.clone(), session_rx, config);
        let mut rx = poller.subscribe_balance();

        rx.wait_for(|s| s.value == Some(5.0)).await.unwrap();

        let before_refresh = tokio::time::Instant::now();
        poller.refresh_balance();
        rx.wait_for(|s| s.value == Some(6.0)).await.unwrap();
        assert!(
            before_refresh.elapsed() < config.balance_interval,
            "refresh must not wait for the next scheduled cycle"
        );
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfunded_account_reads_as_zero_balance() {
        let api = MockApi::new();
        api.push_balance(Err(FetchError::NotFound));
        let (_tx, session_rx) = session_channel(connected("acc1"));

        let poller = Poller::start(api, session_rx, PollerConfig::default());
        let mut rx = poller.subscribe_balance();

        let state = rx.wait_for(|s| s.value.is_some()).await.unwrap().clone();
        assert_eq!(state.value, Some(0.0));
        assert!(!state.has_error(), "unfunded account is not a failure");
        poller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_change_restarts_balance_cycle() {
        let api = MockApi::new();
        api.push_balance(Ok(1.0));
        api.push_balance(Ok(2.0));
        let (tx, session_rx) = session_channel(connected("acc1"));

        let poller = Poller::start(api.clone(), session_rx, PollerConfig::default());
        let mut rx = poller.subscribe_balance();

        rx.wait_for(|s| s.value == Some(1.0)).await.unwrap();

        tx.send(connected("acc2")).unwrap();
        rx.wait_for(|s| s.value == Some(2.0)).await.unwrap();

        assert_eq!(
            api.balance_accounts(),
            vec!["acc1".to_string(), "acc2".to_string()]
        );
        poller.shutdown();
    }
}
