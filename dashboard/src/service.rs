//! # Service Traits
//!
//! Traits for dependency injection, enabling better testability and
//! modularity. The poller and the session controller are constructed
//! against these seams rather than concrete clients, so tests drive them
//! with scripted implementations.

use async_trait::async_trait;
use lib_solana::{FetchError, JupiterPriceClient, NetworkStats, PriceQuote, SolanaClient};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Wallet signer failures, as reported by the external signer capability.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The signer (or the user behind it) declined the request.
    #[error("signer rejected the request: {0}")]
    Rejected(String),

    /// The signer failed for any other reason.
    #[error("signer error: {0}")]
    Other(String),
}

/// Trait for the market data sources the poller cycles over.
///
/// Each operation is idempotent and side-effect-free beyond the network
/// call; a failed call returns a typed [`FetchError`] and never partial
/// data.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Fetch the current price quote for the configured asset.
    async fn fetch_price(&self) -> Result<PriceQuote, FetchError>;

    /// Fetch a consistent snapshot of cluster statistics.
    async fn fetch_network_stats(&self) -> Result<NetworkStats, FetchError>;

    /// Fetch the native balance for an account, in SOL.
    async fn fetch_balance(&self, account_id: &str) -> Result<f64, FetchError>;
}

/// Trait for the wallet signer capability delivered by the host runtime.
///
/// The session controller drives these operations; it never discovers a
/// signer through ambient context.
#[async_trait]
pub trait SignerCapability: Send + Sync {
    /// Select a wallet provider by name before connecting.
    async fn select(&self, provider: &str) -> Result<(), SignerError>;

    /// Request a connection; resolves with the active account's public
    /// identifier.
    async fn connect(&self) -> Result<String, SignerError>;

    /// Tear down the connection.
    async fn disconnect(&self);
}

/// Live [`MarketDataApi`] backed by the Jupiter price client and the
/// shared Solana RPC client.
pub struct LiveMarketData {
    jupiter: JupiterPriceClient,
    solana: Arc<SolanaClient>,
    price_mint: String,
}

impl LiveMarketData {
    /// Bundle the concrete clients behind the market-data seam.
    ///
    /// `solana` is the one explicitly shared RPC client instance; every
    /// consumer that needs the cluster goes through it.
    pub fn new(
        jupiter: JupiterPriceClient,
        solana: Arc<SolanaClient>,
        price_mint: impl Into<String>,
    ) -> Self {
        Self {
            jupiter,
            solana,
            price_mint: price_mint.into(),
        }
    }
}

#[async_trait]
impl MarketDataApi for LiveMarketData {
    async fn fetch_price(&self) -> Result<PriceQuote, FetchError> {
        self.jupiter.fetch_price(&self.price_mint).await
    }

    async fn fetch_network_stats(&self) -> Result<NetworkStats, FetchError> {
        self.solana.fetch_network_stats().await
    }

    async fn fetch_balance(&self, account_id: &str) -> Result<f64, FetchError> {
        let pubkey = Pubkey::from_str(account_id)
            .map_err(|e| FetchError::Parse(format!("invalid account id: {}", e)))?;
        self.solana.fetch_balance(&pubkey).await
    }
}
