//! # Jupiter Price Client
//!
//! Integration with the Jupiter price API for asset quotes.

// region: --- Modules
pub mod price;
pub mod types;
// endregion: --- Modules

use reqwest::Client;
use std::time::Duration;

/// Default Jupiter price endpoint (v2 payload shape).
pub const DEFAULT_PRICE_API_BASE: &str = "https://api.jup.ag/price/v2";

/// Builder for configuring [`JupiterPriceClient`].
///
/// Allows fluent configuration of client settings before building.
#[derive(Debug, Clone)]
pub struct JupiterPriceClientBuilder {
    timeout: Option<Duration>,
    price_api_base: Option<String>,
}

impl Default for JupiterPriceClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            price_api_base: Some(DEFAULT_PRICE_API_BASE.to_string()),
        }
    }
}

impl JupiterPriceClientBuilder {
    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the price API base URL.
    pub fn price_api_base(mut self, url: String) -> Self {
        self.price_api_base = Some(url);
        self
    }

    /// Build the JupiterPriceClient with configured settings.
    pub fn build(self) -> anyhow::Result<JupiterPriceClient> {
        let http = Client::builder()
            .timeout(self.timeout.unwrap_or_else(|| Duration::from_secs(10)))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(JupiterPriceClient {
            http,
            price_api_base: self
                .price_api_base
                .unwrap_or_else(|| DEFAULT_PRICE_API_BASE.to_string()),
        })
    }
}

/// Client for the Jupiter price API.
///
/// Stateless beyond the pooled HTTP connection; every fetch is one GET
/// request with the asset mint as a query parameter.
pub struct JupiterPriceClient {
    pub(crate) http: Client,
    pub(crate) price_api_base: String,
}

impl JupiterPriceClient {
    /// Create a new price client with default settings (10s timeout).
    pub fn new() -> anyhow::Result<Self> {
        JupiterPriceClientBuilder::default().build()
    }

    /// Create a new price client using a builder for configuration.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use lib_solana::jupiter::JupiterPriceClient;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let client = JupiterPriceClient::builder()
    ///     .timeout(std::time::Duration::from_secs(30))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> JupiterPriceClientBuilder {
        JupiterPriceClientBuilder::default()
    }
}
