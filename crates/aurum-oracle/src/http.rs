//! HTTP price oracle client

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::{OracleError, OracleResult, PriceOracle, TickerSnapshot};

/// Wire shape of the upstream ticker endpoint.
#[derive(Debug, Deserialize)]
struct TickerResponse {
    usd: Decimal,
    success: bool,
}

/// Price oracle backed by an HTTP ticker endpoint.
///
/// The request timeout is the whole price budget: if the oracle does not
/// answer within it, the call fails and the settlement aborts. No retry
/// happens here; retry is a client-side concern.
pub struct HttpPriceOracle {
    client: reqwest::Client,
    base_url: String,
    source: String,
}

impl HttpPriceOracle {
    pub fn new(base_url: impl Into<String>, source: impl Into<String>, budget: Duration) -> OracleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(budget)
            .build()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            source: source.into(),
        })
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn ticker(&self, pair: &str) -> OracleResult<TickerSnapshot> {
        let url = format!("{}/ticker", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("pair", pair)])
            .send()
            .await
            .map_err(|e| {
                warn!(pair, error = %e, "ticker request failed");
                OracleError::Unavailable(e.to_string())
            })?;

        let body: TickerResponse = response
            .error_for_status()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| OracleError::BadResponse(e.to_string()))?;

        if !body.success {
            return Err(OracleError::Unavailable(format!(
                "oracle reported no data for {pair}"
            )));
        }
        if body.usd <= Decimal::ZERO {
            return Err(OracleError::BadResponse(format!(
                "non-positive price for {pair}"
            )));
        }

        Ok(TickerSnapshot {
            pair: pair.to_string(),
            usd: body.usd,
            ts: Utc::now(),
            source: self.source.clone(),
        })
    }
}
