//! # Dashboard Surface
//!
//! Wires the session controller, the poller, and the snapshot aggregator
//! together behind one handle. Consumers read snapshots and issue wallet
//! commands here; nothing else is exposed.

use crate::config::DashboardConfig;
use crate::poller::Poller;
use crate::service::{MarketDataApi, SignerCapability};
use crate::session::SessionController;
use crate::snapshot::{self, ViewSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Handle over the running data core.
///
/// Owns the poller tasks and the aggregator task; dropping the handle
/// without [`shutdown`](Dashboard::shutdown) leaves them running.
pub struct Dashboard {
    session: Arc<SessionController>,
    poller: Poller,
    snapshot_rx: watch::Receiver<ViewSnapshot>,
    aggregator: JoinHandle<()>,
}

impl Dashboard {
    /// Start the data core against the injected data sources and signer.
    pub fn start(
        config: &DashboardConfig,
        api: Arc<dyn MarketDataApi>,
        signer: Arc<dyn SignerCapability>,
    ) -> Self {
        let session = Arc::new(SessionController::new(
            signer,
            config.wallet_provider.clone(),
        ));
        let poller = Poller::start(api, session.subscribe(), config.poller_config());

        let initial = snapshot::aggregate(
            &poller.subscribe_price().borrow(),
            &poller.subscribe_network().borrow(),
            &poller.subscribe_balance().borrow(),
            &session.current(),
        );
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let aggregator = tokio::spawn(aggregate_loop(
            snapshot_tx,
            poller.subscribe_price(),
            poller.subscribe_network(),
            poller.subscribe_balance(),
            session.subscribe(),
        ));

        info!("dashboard data core started");

        Self {
            session,
            poller,
            snapshot_rx,
            aggregator,
        }
    }

    /// Current view snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Request a wallet connection.
    pub async fn connect_wallet(&self) {
        self.session.connect().await;
    }

    /// Disconnect the wallet.
    pub async fn disconnect_wallet(&self) {
        self.session.disconnect().await;
    }

    /// Report that the signer revoked the connection from outside.
    pub fn signer_disconnected(&self) {
        self.session.signer_disconnected();
    }

    /// Report that the signer switched accounts.
    pub fn account_changed(&self, account_id: String) {
        self.session.account_changed(account_id);
    }

    /// Trigger one out-of-cycle balance fetch.
    pub fn refresh_balance(&self) {
        self.poller.refresh_balance();
    }

    /// Stop the poller and aggregator tasks.
    pub fn shutdown(&self) {
        self.poller.shutdown();
        self.aggregator.abort();
        info!("dashboard data core stopped");
    }
}

/// Recompute and publish the snapshot whenever any input changes.
async fn aggregate_loop(
    tx: watch::Sender<ViewSnapshot>,
    mut price_rx: watch::Receiver<crate::poller::source::SourceState<lib_solana::PriceQuote>>,
    mut network_rx: watch::Receiver<crate::poller::source::SourceState<lib_solana::NetworkStats>>,
    mut balance_rx: watch::Receiver<crate::poller::source::SourceState<f64>>,
    mut session_rx: watch::Receiver<crate::session::WalletSession>,
) {
    loop {
        let changed = tokio::select! {
            r = price_rx.changed() => r,
            r = network_rx.changed() => r,
            r = balance_rx.changed() => r,
            r = session_rx.changed() => r,
        };
        if changed.is_err() {
            // A sender went away; the core is shutting down.
            return;
        }

        let next = snapshot::aggregate(
            &price_rx.borrow_and_update(),
            &network_rx.borrow_and_update(),
            &balance_rx.borrow_and_update(),
            &session_rx.borrow_and_update(),
        );
        tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
