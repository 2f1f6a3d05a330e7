//! # Dashboard Data Core
//!
//! Live-data aggregation layer for a single-page Solana dashboard. Polls
//! three independent sources (Jupiter price, cluster statistics, wallet
//! balance), manages the external signer connection lifecycle, and merges
//! everything into one immutable [`snapshot::ViewSnapshot`] that
//! presentation reads and never mutates.
//!
//! ## Architecture
//!
//! - [`service`]: dependency-injection seams for the data sources and the
//!   wallet signer capability
//! - [`session`]: wallet session state machine and controller
//! - [`poller`]: independent repeating fetch cycles with failure isolation
//! - [`snapshot`]: pure view-model aggregation
//! - [`app`]: the outward surface wiring everything together
//! - [`signer`]: local keypair signer for running without a host wallet
//! - [`config`]: environment-driven configuration

pub mod app;
pub mod config;
pub mod poller;
pub mod service;
pub mod session;
pub mod signer;
pub mod snapshot;

// Re-export the surface types consumers need
pub use app::Dashboard;
pub use config::DashboardConfig;
pub use service::{LiveMarketData, MarketDataApi, SignerCapability, SignerError};
pub use session::{SessionController, SessionEvent, WalletSession};
pub use signer::LocalKeypairSigner;
pub use snapshot::ViewSnapshot;
