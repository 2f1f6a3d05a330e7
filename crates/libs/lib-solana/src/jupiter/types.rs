//! # Jupiter API Types
//!
//! Type definitions for Jupiter price API responses.

use serde::Deserialize;
use std::collections::HashMap;

/// Response from the Jupiter price API.
///
/// A missing `data` key and an empty map are both valid "no price"
/// responses, mirroring the upstream behavior.
#[derive(Debug, Deserialize)]
pub struct JupiterPriceResponse {
    #[serde(default)]
    pub data: HashMap<String, JupiterPriceEntry>,
}

/// Price data for a single asset.
///
/// The price is a string-encoded decimal; it may be absent entirely,
/// which is a valid "no quote" state rather than an error.
#[derive(Debug, Clone, Deserialize)]
pub struct JupiterPriceEntry {
    pub price: Option<String>,
}
