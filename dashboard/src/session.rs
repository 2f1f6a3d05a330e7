//! # Wallet Session
//!
//! Connection state machine for the external wallet signer. Exactly one
//! state is active at any time, every external event maps to exactly one
//! next state, and events that make no sense in the current state are
//! tolerated as no-ops rather than errors (duplicate UI triggers are
//! expected).

use crate::service::SignerCapability;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Wallet connection state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum WalletSession {
    /// Not connected
    Disconnected,
    /// Connecting in progress
    Connecting,
    /// Connected with the active account identity
    #[serde(rename_all = "camelCase")]
    Connected {
        account_id: String,
        /// Native balance in SOL, absent until the balance cycle reports.
        balance: Option<f64>,
    },
    /// Connection attempt failed; retry requires an explicit reconnect
    #[serde(rename_all = "camelCase")]
    Failed { reason: String },
}

impl WalletSession {
    pub fn is_connected(&self) -> bool {
        matches!(self, WalletSession::Connected { .. })
    }

    pub fn account_id(&self) -> Option<&str> {
        match self {
            WalletSession::Connected { account_id, .. } => Some(account_id),
            _ => None,
        }
    }
}

/// External events the session reacts to.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User asked to connect.
    RequestConnect,
    /// User asked to disconnect.
    RequestDisconnect,
    /// Signer resolved the connection with an account identity.
    SignerConnected(String),
    /// Signer rejected or errored during connection.
    SignerFailed(String),
    /// Signer revoked the connection from outside.
    SignerDisconnected,
    /// Signer switched to a different account while connected.
    AccountChanged(String),
}

/// Compute the next session state for an event.
///
/// Total over all (state, event) pairs: transitions not in the table
/// below return the current state unchanged.
pub fn transition(current: &WalletSession, event: &SessionEvent) -> WalletSession {
    use WalletSession::*;

    match (current, event) {
        (Disconnected, SessionEvent::RequestConnect) => Connecting,
        (Failed { .. }, SessionEvent::RequestConnect) => Connecting,
        (Connecting, SessionEvent::SignerConnected(id)) => Connected {
            account_id: id.clone(),
            balance: None,
        },
        (Connecting, SessionEvent::SignerFailed(reason)) => Failed {
            reason: reason.clone(),
        },
        (Connected { .. }, SessionEvent::RequestDisconnect) => Disconnected,
        (Connected { .. }, SessionEvent::SignerDisconnected) => Disconnected,
        (Connected { .. }, SessionEvent::AccountChanged(id)) => Connected {
            account_id: id.clone(),
            balance: None,
        },
        // Everything else is a deliberate no-op; duplicate triggers from
        // the UI must not error or move the machine.
        (state, _) => state.clone(),
    }
}

/// Owns the session state machine and drives the injected signer.
///
/// State is published over a watch channel; the poller gates its balance
/// cycle on it and the aggregator folds it into the view snapshot.
pub struct SessionController {
    signer: Arc<dyn SignerCapability>,
    provider: Option<String>,
    tx: watch::Sender<WalletSession>,
}

impl SessionController {
    /// Create a controller in the `Disconnected` state.
    ///
    /// `provider` is the wallet provider name passed to the signer's
    /// `select` before connecting, when the host exposes several.
    pub fn new(signer: Arc<dyn SignerCapability>, provider: Option<String>) -> Self {
        let (tx, _) = watch::channel(WalletSession::Disconnected);
        Self {
            signer,
            provider,
            tx,
        }
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.tx.subscribe()
    }

    /// Current session state.
    pub fn current(&self) -> WalletSession {
        self.tx.borrow().clone()
    }

    /// Request a connection to the signer.
    ///
    /// No-op while already `Connecting` or `Connected`. From `Failed`
    /// this is the explicit retry path.
    pub async fn connect(&self) {
        {
            let state = self.tx.borrow();
            if matches!(
                *state,
                WalletSession::Connecting | WalletSession::Connected { .. }
            ) {
                debug!(state = ?*state, "connect request ignored");
                return;
            }
        }

        self.apply(SessionEvent::RequestConnect);

        if let Some(provider) = &self.provider {
            if let Err(e) = self.signer.select(provider).await {
                warn!(provider = %provider, error = %e, "wallet provider selection failed");
                self.apply(SessionEvent::SignerFailed(e.to_string()));
                return;
            }
        }

        match self.signer.connect().await {
            Ok(account_id) => {
                info!(account = %account_id, "wallet connected");
                self.apply(SessionEvent::SignerConnected(account_id));
            }
            Err(e) => {
                warn!(error = %e, "wallet connect failed");
                self.apply(SessionEvent::SignerFailed(e.to_string()));
            }
        }
    }

    /// Disconnect from the signer. No-op unless currently connected.
    pub async fn disconnect(&self) {
        if !self.tx.borrow().is_connected() {
            return;
        }
        self.signer.disconnect().await;
        self.apply(SessionEvent::RequestDisconnect);
        info!("wallet disconnected");
    }

    /// The signer revoked the connection from outside.
    pub fn signer_disconnected(&self) {
        self.apply(SessionEvent::SignerDisconnected);
    }

    /// The signer switched to a different account.
    pub fn account_changed(&self, account_id: String) {
        self.apply(SessionEvent::AccountChanged(account_id));
    }

    /// Apply one event atomically and publish the state if it changed.
    fn apply(&self, event: SessionEvent) -> WalletSession {
        let mut applied = WalletSession::Disconnected;
        self.tx.send_if_modified(|state| {
            let next = transition(state, &event);
            let changed = next != *state;
            if changed {
                debug!(from = ?*state, to = ?next, "wallet session transition");
                *state = next;
            }
            applied = state.clone();
            changed
        });
        applied
    }
}
