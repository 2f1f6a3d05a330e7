//! Environment-driven configuration for the data core.

use crate::poller::PollerConfig;
use lib_solana::jupiter::DEFAULT_PRICE_API_BASE;
use lib_solana::Network;
use std::env;
use std::time::Duration;

/// SOL wrapped-native mint, the default priced asset.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub network: Network,
    pub helius_api_key: Option<String>,
    pub custom_rpc_url: Option<String>,
    pub price_api_base: String,
    /// Mint address of the asset to price.
    pub price_mint: String,
    /// Wallet provider name passed to the signer before connecting.
    pub wallet_provider: Option<String>,
    /// Path to a local keypair file; ephemeral keypair when unset.
    pub keypair_path: Option<String>,
    pub price_interval_secs: u64,
    pub network_interval_secs: u64,
    pub balance_interval_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            helius_api_key: None,
            custom_rpc_url: None,
            price_api_base: DEFAULT_PRICE_API_BASE.to_string(),
            price_mint: SOL_MINT.to_string(),
            wallet_provider: None,
            keypair_path: None,
            price_interval_secs: 30,
            network_interval_secs: 10,
            balance_interval_secs: 30,
            fetch_timeout_secs: 10,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let network = match env::var("SOLANA_NETWORK")
            .unwrap_or_else(|_| "mainnet".to_string())
            .to_lowercase()
            .as_str()
        {
            "mainnet" | "mainnet-beta" => Network::Mainnet,
            "devnet" => Network::Devnet,
            other => return Err(format!("SOLANA_NETWORK must be mainnet or devnet, got '{}'", other)),
        };

        let price_interval_secs = interval_from_env("PRICE_INTERVAL_SECS", defaults.price_interval_secs)?;
        let network_interval_secs =
            interval_from_env("NETWORK_INTERVAL_SECS", defaults.network_interval_secs)?;
        let balance_interval_secs =
            interval_from_env("BALANCE_INTERVAL_SECS", defaults.balance_interval_secs)?;
        let fetch_timeout_secs = interval_from_env("FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs)?;

        Ok(Self {
            network,
            helius_api_key: env::var("HELIUS_API_KEY").ok(),
            custom_rpc_url: env::var("SOLANA_RPC_URL").ok(),
            price_api_base: env::var("PRICE_API_BASE").unwrap_or(defaults.price_api_base),
            price_mint: env::var("PRICE_MINT").unwrap_or(defaults.price_mint),
            wallet_provider: env::var("WALLET_PROVIDER").ok(),
            keypair_path: env::var("KEYPAIR_PATH").ok(),
            price_interval_secs,
            network_interval_secs,
            balance_interval_secs,
            fetch_timeout_secs,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.price_mint.is_empty() {
            return Err("PRICE_MINT must not be empty".to_string());
        }

        if self.price_interval_secs == 0
            || self.network_interval_secs == 0
            || self.balance_interval_secs == 0
        {
            return Err("poll intervals must be at least 1 second".to_string());
        }

        if self.fetch_timeout_secs == 0 {
            return Err("FETCH_TIMEOUT_SECS must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Poller cadence derived from the configured intervals.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            price_interval: Duration::from_secs(self.price_interval_secs),
            network_interval: Duration::from_secs(self.network_interval_secs),
            balance_interval: Duration::from_secs(self.balance_interval_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}

fn interval_from_env(name: &str, default: u64) -> Result<u64, String> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| format!("{} must be a valid number of seconds", name)),
        Err(_) => Ok(default),
    }
}
