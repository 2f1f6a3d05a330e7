//! # Jupiter Price Fetch
//!
//! Price fetching for a single asset mint.

use super::types::JupiterPriceResponse;
use super::JupiterPriceClient;
use crate::error::FetchError;
use crate::types::PriceQuote;
use chrono::Utc;
use tracing::debug;

impl JupiterPriceClient {
    /// Fetch the current price quote for an asset mint.
    ///
    /// One GET request with the mint as query parameter. A response that
    /// carries no entry for the mint, or an entry without a price field,
    /// is a successful fetch with an absent price; only transport
    /// failures, non-success statuses, and malformed payloads are errors.
    pub async fn fetch_price(&self, mint: &str) -> Result<PriceQuote, FetchError> {
        let url = format!("{}?ids={}", self.price_api_base, mint);

        debug!(%mint, "fetching Jupiter price");

        let response = self.http.get(&url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream(format!(
                "price endpoint returned {}",
                status
            )));
        }

        let body = response.text().await.map_err(request_error)?;
        let price = parse_price_response(&body, mint)?;

        Ok(PriceQuote {
            price,
            observed_at: Utc::now(),
        })
    }
}

fn request_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Upstream(err.to_string())
    }
}

/// Decode a price API body into an optional price for the given mint.
///
/// Returns `Ok(None)` when the response is well-formed but carries no
/// quote for the mint; `Parse` when the body or the price string itself
/// cannot be decoded.
pub(crate) fn parse_price_response(body: &str, mint: &str) -> Result<Option<f64>, FetchError> {
    let response: JupiterPriceResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    match response.data.get(mint).and_then(|entry| entry.price.as_deref()) {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| FetchError::Parse(format!("non-numeric price {:?}: {}", raw, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

    #[test]
    fn test_parse_price_present() {
        let body = format!(r#"{{"data":{{"{}":{{"price":"142.50"}}}}}}"#, SOL_MINT);
        let price = parse_price_response(&body, SOL_MINT).unwrap();
        assert_eq!(price, Some(142.50));
    }

    #[test]
    fn test_parse_empty_data_is_absent_not_error() {
        let price = parse_price_response(r#"{"data":{}}"#, SOL_MINT).unwrap();
        assert_eq!(price, None);
    }

    #[test]
    fn test_parse_missing_data_key_is_absent() {
        let price = parse_price_response("{}", SOL_MINT).unwrap();
        assert_eq!(price, None);
    }

    #[test]
    fn test_parse_missing_price_field_is_absent() {
        let body = format!(r#"{{"data":{{"{}":{{"type":"derivedPrice"}}}}}}"#, SOL_MINT);
        let price = parse_price_response(&body, SOL_MINT).unwrap();
        assert_eq!(price, None);
    }

    #[test]
    fn test_parse_entry_for_other_mint_is_absent() {
        let body = r#"{"data":{"SomeOtherMint":{"price":"1.0"}}}"#;
        let price = parse_price_response(body, SOL_MINT).unwrap();
        assert_eq!(price, None);
    }

    #[test]
    fn test_parse_malformed_body_is_parse_error() {
        let err = parse_price_response("not json", SOL_MINT).unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Parse);
    }

    #[test]
    fn test_parse_non_numeric_price_is_parse_error() {
        let body = format!(r#"{{"data":{{"{}":{{"price":"n/a"}}}}}}"#, SOL_MINT);
        let err = parse_price_response(&body, SOL_MINT).unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Parse);
    }

    #[test]
    fn test_parse_tolerates_extra_fields() {
        let body = format!(
            r#"{{"data":{{"{}":{{"id":"{}","type":"derivedPrice","price":"98.7654"}}}},"timeTaken":0.003}}"#,
            SOL_MINT, SOL_MINT
        );
        let price = parse_price_response(&body, SOL_MINT).unwrap();
        assert_eq!(price, Some(98.7654));
    }
}
