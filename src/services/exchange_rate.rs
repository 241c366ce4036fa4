use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::Client;
use rocket::fairing::AdHoc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::engine::currency::RateTable;
use crate::error::EngineError;
use crate::models::{Currency, ExchangeRate};

/// Payload of the rate provider: units of each currency per one base unit.
#[derive(Debug, Deserialize)]
pub struct RatesPayload {
    pub rates: HashMap<String, f64>,
}

/// Process-lifetime cache of exchange rates.
///
/// Readers always get the last-known table immediately; only the refresher
/// talks to the provider.
pub struct ExchangeRateService {
    client: Client,
    url: String,
    base: Currency,
    table: RwLock<RateTable>,
}

impl ExchangeRateService {
    pub fn new(url: impl Into<String>, base: Currency, fallback: RateTable, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        ExchangeRateService {
            client,
            url: url.into(),
            base,
            table: RwLock::new(fallback),
        }
    }

    pub fn from_config() -> Self {
        Self::new(
            Config::exchange_rate_url(),
            Config::exchange_rate_base(),
            RateTable::fallback(Config::fallback_usd_inr_rate(), Utc::now()),
            Config::upstream_timeout(),
        )
    }

    pub async fn table(&self) -> RateTable {
        self.table.read().await.clone()
    }

    /// Fetches fresh rates and merges them over the cached table.
    /// On failure the cached table is left untouched.
    pub async fn refresh(&self) -> Result<usize, EngineError> {
        let res = self.client.get(&self.url).send().await?;

        if !res.status().is_success() {
            return Err(EngineError::upstream(format!(
                "Rate provider answered {}",
                res.status()
            )));
        }

        let payload: RatesPayload = res.json().await?;
        let fresh = parse_rates(self.base, &payload, Utc::now());
        if fresh.is_empty() {
            return Err(EngineError::upstream("Rate provider returned no usable rates"));
        }

        let count = fresh.len();
        self.table.write().await.merge(fresh);
        Ok(count)
    }
}

/// Builds a table from a provider payload, skipping unknown codes and bad values.
pub fn parse_rates(base: Currency, payload: &RatesPayload, fetched_at: DateTime<Utc>) -> RateTable {
    let mut table = RateTable::new(base);
    for (code, &rate) in &payload.rates {
        let Ok(currency) = code.parse::<Currency>() else {
            continue;
        };
        if currency == base {
            continue;
        }
        table.insert(ExchangeRate::new(base, currency, rate, fetched_at));
    }
    table
}

/// Refreshes on liftoff, then on every tick of `period`.
pub fn refresher(service: Arc<ExchangeRateService>, period: Duration) -> AdHoc {
    AdHoc::on_liftoff("Exchange rate refresher", move |_| {
        Box::pin(async move {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                loop {
                    interval.tick().await;
                    match service.refresh().await {
                        Ok(count) => info!("Refreshed {} exchange rates", count),
                        Err(e) => warn!("Exchange rate refresh failed, keeping last-known rates: {}", e),
                    }
                }
            });
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_currencies_only() {
        let payload: RatesPayload = serde_json::from_value(serde_json::json!({
            "rates": { "USD": 1.0, "INR": 83.12, "EUR": 0.92, "JPY": 149.5, "GBP": -1.0 }
        }))
        .unwrap();

        let table = parse_rates(Currency::Usd, &payload, Utc::now());

        assert_eq!(table.len(), 2);
        assert_eq!(table.convert(1.0, Currency::Usd, Currency::Inr), 83.12);
        assert_eq!(table.convert(1.0, Currency::Usd, Currency::Gbp), 0.0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_fallback() {
        let service = ExchangeRateService::new(
            "http://127.0.0.1:9/latest",
            Currency::Usd,
            RateTable::fallback(83.0, Utc::now()),
            Duration::from_millis(200),
        );

        assert!(service.refresh().await.is_err());
        let table = service.table().await;
        assert_eq!(table.convert(2.0, Currency::Usd, Currency::Inr), 166.0);
    }
}
