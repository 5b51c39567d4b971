//! Currency conversion into the display currency (INR)

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::agent::types::{AgentError, decode_json, ensure_ok};
use crate::config::ExchangeConfig;

pub const TARGET_CURRENCY: &str = "INR";

#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

/// Published exchange rates keyed by base currency
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn latest_rates(&self, base_currency: &str) -> Result<RatesResponse, AgentError>;
}

/// Public exchangerate-api.com client (`/v4/latest/{base}`, no auth)
pub struct ExchangeRateClient {
    client: Client,
    base_url: String,
}

impl ExchangeRateClient {
    pub fn new(config: &ExchangeConfig, timeout: Duration) -> Result<Self, AgentError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn latest_rates(&self, base_currency: &str) -> Result<RatesResponse, AgentError> {
        let url = format!("{}/v4/latest/{}", self.base_url, base_currency);
        let response = self.client.get(&url).send().await?;

        let response = ensure_ok(response, "Exchange rate provider").await?;
        decode_json(response).await
    }
}

/// Convert `amount` from `currency` into INR, rounded to two decimals.
///
/// INR amounts are returned as-is without a lookup. `None` when the rate
/// table cannot be fetched or has no INR entry.
pub async fn convert_to_inr(rates: &dyn RateSource, amount: f64, currency: &str) -> Option<f64> {
    if currency == TARGET_CURRENCY {
        return Some(amount);
    }

    let table = match rates.latest_rates(currency).await {
        Ok(table) => table,
        Err(e) => {
            warn!("Exchange rate lookup for {} failed: {}", currency, e);
            return None;
        }
    };

    match table.rates.get(TARGET_CURRENCY) {
        Some(rate) => Some(round_to_cents(amount * rate)),
        None => {
            debug!("No {} rate published for {}", TARGET_CURRENCY, currency);
            None
        }
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
