//! # Solana RPC Client
//!
//! High-level wrapper around the Solana RPC client for the read-only
//! queries the dashboard needs: cluster statistics and native balances.
//!
//! ## Features
//!
//! - **Network Selection**: Easy switching between Mainnet and Devnet
//! - **Helius Integration**: Support for premium RPC endpoints with API keys
//! - **Cluster Statistics**: Slot, epoch, and throughput in one consistent fetch
//! - **Balance Queries**: Native balance by account, lamports converted to SOL
//! - **Health Checks**: Verify RPC endpoint connectivity at startup
//!
//! ## Example
//!
//! ```rust,no_run
//! use lib_solana::client::{SolanaClient, Network};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = SolanaClient::builder()
//!     .network(Network::Mainnet)
//!     .build();
//!
//! client.health_check().await?;
//!
//! let stats = client.fetch_network_stats().await?;
//! println!("Epoch {} is {:.1}% complete", stats.epoch, stats.epoch_progress_percent);
//! # Ok(())
//! # }
//! ```

use crate::error::FetchError;
use crate::types::NetworkStats;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, info};

/// Lamports per SOL (the native display unit).
const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Solana network selection.
///
/// - **Mainnet**: production network with real economic value
/// - **Devnet**: test network for development
#[derive(Debug, Clone)]
pub enum Network {
    /// Solana mainnet-beta (production network)
    Mainnet,
    /// Solana devnet (test network)
    Devnet,
}

/// Builder for configuring [`SolanaClient`].
///
/// Allows fluent configuration of client settings before building.
#[derive(Debug, Clone)]
pub struct SolanaClientBuilder {
    network: Option<Network>,
    helius_api_key: Option<String>,
    custom_rpc_url: Option<String>,
}

impl Default for SolanaClientBuilder {
    fn default() -> Self {
        Self {
            network: Some(Network::Mainnet),
            helius_api_key: None,
            custom_rpc_url: None,
        }
    }
}

impl SolanaClientBuilder {
    /// Set the Solana network.
    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    /// Set the Helius API key for premium RPC access.
    pub fn helius_api_key(mut self, key: String) -> Self {
        self.helius_api_key = Some(key);
        self
    }

    /// Set a custom RPC URL (overrides network-based URL).
    pub fn custom_rpc_url(mut self, url: String) -> Self {
        self.custom_rpc_url = Some(url);
        self
    }

    /// Build the SolanaClient with configured settings.
    pub fn build(self) -> SolanaClient {
        let network = self.network.unwrap_or(Network::Mainnet);
        let rpc_url = if let Some(custom_url) = self.custom_rpc_url {
            custom_url
        } else {
            match network {
                Network::Mainnet => {
                    if let Some(key) = self.helius_api_key {
                        format!("https://mainnet.helius-rpc.com/?api-key={}", key)
                    } else {
                        "https://api.mainnet-beta.solana.com".to_string()
                    }
                }
                Network::Devnet => "https://api.devnet.solana.com".to_string(),
            }
        };

        info!("🔗 Connecting to Solana RPC: {}", rpc_url);

        SolanaClient {
            rpc: Arc::new(RpcClient::new(rpc_url)),
            network,
        }
    }
}

/// High-level Solana RPC client wrapper.
///
/// Provides the read-only cluster queries the dashboard polls: current
/// slot, epoch info, recent performance samples, and native balances.
/// The underlying connection is lazy; requests only happen when methods
/// are called, and the wrapper is cheap to share behind an `Arc`.
pub struct SolanaClient {
    rpc: Arc<RpcClient>,
    network: Network,
}

impl SolanaClient {
    /// Create a new Solana RPC client using a builder for configuration.
    pub fn builder() -> SolanaClientBuilder {
        SolanaClientBuilder::default()
    }

    /// Get the network this client is connected to.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Check if the RPC endpoint is healthy and responsive.
    ///
    /// Makes a lightweight request to verify the RPC connection works.
    /// Intended for startup checks before polling begins.
    pub async fn health_check(&self) -> anyhow::Result<()> {
        let _ = self
            .rpc
            .get_version()
            .await
            .map_err(|e| anyhow::anyhow!("Health check failed: {}", e))?;
        Ok(())
    }

    /// Fetch a consistent snapshot of cluster statistics.
    ///
    /// Issues the three underlying RPC calls (current slot, epoch info,
    /// most recent performance sample) concurrently. If any of them
    /// fails, the whole fetch fails; a [`NetworkStats`] is never built
    /// from responses of different cycles.
    pub async fn fetch_network_stats(&self) -> Result<NetworkStats, FetchError> {
        let (slot, epoch_info, samples) = tokio::try_join!(
            async {
                self.rpc
                    .get_slot()
                    .await
                    .map_err(|e| FetchError::Upstream(format!("get_slot failed: {}", e)))
            },
            async {
                self.rpc
                    .get_epoch_info()
                    .await
                    .map_err(|e| FetchError::Upstream(format!("get_epoch_info failed: {}", e)))
            },
            async {
                self.rpc
                    .get_recent_performance_samples(Some(1))
                    .await
                    .map_err(|e| {
                        FetchError::Upstream(format!("get_recent_performance_samples failed: {}", e))
                    })
            },
        )?;

        let tps = samples
            .first()
            .map(|s| transactions_per_second(s.num_transactions, s.sample_period_secs))
            .unwrap_or(0);

        let stats = NetworkStats {
            transactions_per_second: tps,
            current_slot: slot,
            epoch: epoch_info.epoch,
            epoch_progress_percent: epoch_progress_percent(
                epoch_info.slot_index,
                epoch_info.slots_in_epoch,
            ),
            block_height: epoch_info.block_height,
        };

        debug!(
            slot = stats.current_slot,
            epoch = stats.epoch,
            tps = stats.transactions_per_second,
            "fetched network stats"
        );

        Ok(stats)
    }

    /// Fetch the native balance for an account, in SOL.
    ///
    /// Returns [`FetchError::NotFound`] when the account has no on-chain
    /// record. Callers that consider an unfunded account valid (the
    /// dashboard does) normalize that to a balance of 0.
    pub async fn fetch_balance(&self, pubkey: &Pubkey) -> Result<f64, FetchError> {
        let response = self
            .rpc
            .get_account_with_commitment(pubkey, self.rpc.commitment())
            .await
            .map_err(|e| FetchError::Upstream(format!("get_account failed: {}", e)))?;

        match response.value {
            Some(account) => Ok(account.lamports as f64 / LAMPORTS_PER_SOL),
            None => Err(FetchError::NotFound),
        }
    }
}

/// Rounded transactions per second from one performance sample.
fn transactions_per_second(num_transactions: u64, sample_period_secs: u16) -> u64 {
    if sample_period_secs == 0 {
        return 0;
    }
    (num_transactions as f64 / sample_period_secs as f64).round() as u64
}

/// Progress through the current epoch as a percentage in [0, 100].
fn epoch_progress_percent(slot_index: u64, slots_in_epoch: u64) -> f64 {
    if slots_in_epoch == 0 {
        return 0.0;
    }
    (slot_index as f64 / slots_in_epoch as f64 * 100.0).clamp(0.0, 100.0)
}
