//! # Solana Library
//!
//! Solana data-source integration for the dashboard core: an RPC client
//! wrapper for cluster statistics and balance queries, and a Jupiter
//! price client for asset quotes.

// Declare all modules
pub mod client;
pub mod error;
pub mod jupiter;
pub mod types;

// Re-export commonly used types from root for convenience
pub use client::{Network, SolanaClient, SolanaClientBuilder};
pub use error::{FetchError, FetchErrorKind};
pub use jupiter::JupiterPriceClient;
pub use types::{NetworkStats, PriceQuote};
