use chrono::{DateTime, Duration, NaiveDate, Utc};
use eyre::{Result, WrapErr};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::constants::*;
use crate::error::{CoreError, CoreResult};
use crate::http_client::{HttpClientSettings, build_http_client};

const SOURCE_NAME: &str = "defillama-stablecoins";

/// Where a supply series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Live,
    /// Generated stand-in; not an observation of anything
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupplyPoint {
    pub date: NaiveDate,
    pub total_supply_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StablecoinSupply {
    pub points: Vec<SupplyPoint>,
    pub provenance: Provenance,
}

impl StablecoinSupply {
    /// Keep the last `days` days ending at the newest point
    pub fn trailing(mut self, days: u32) -> Self {
        retain_trailing(&mut self.points, days);
        self
    }
}

fn retain_trailing(points: &mut Vec<SupplyPoint>, days: u32) {
    if let Some(last) = points.last().map(|p| p.date) {
        let cutoff = last - Duration::days(i64::from(days));
        points.retain(|p| p.date > cutoff);
    }
}

#[derive(Debug, Deserialize)]
struct ChartEntry {
    date: serde_json::Value,
    #[serde(rename = "totalCirculatingUSD", default)]
    total_circulating_usd: HashMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct StablecoinSupplySource {
    http_client: ClientWithMiddleware,
    base_url: String,
}

impl StablecoinSupplySource {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = build_http_client(HttpClientSettings {
            timeout: config.http_timeout,
            requests_per_minute: config.rate_limit_per_minute,
            max_retries: config.fetch_max_retries,
        })
        .wrap_err("Failed to create DefiLlama HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.defillama_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Aggregate stablecoin supply for the last `lookback_days` days, falling
    /// back to the simulated series when the live source fails
    #[instrument(skip(self), fields(on_close = true))]
    pub async fn fetch(&self, lookback_days: u32) -> StablecoinSupply {
        match self.fetch_live(lookback_days).await {
            Ok(points) => {
                info!(rows = points.len(), "Fetched live stablecoin supply");
                StablecoinSupply {
                    points,
                    provenance: Provenance::Live,
                }
            }
            Err(e) => {
                warn!(error = %e, "Stablecoin supply unavailable, using simulated placeholder");
                simulated_supply(Utc::now().date_naive()).trailing(lookback_days)
            }
        }
    }

    pub async fn fetch_live(&self, lookback_days: u32) -> CoreResult<Vec<SupplyPoint>> {
        let url = format!("{}/stablecoincharts/all", self.base_url);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::data_unavailable(SOURCE_NAME, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::data_unavailable(SOURCE_NAME, format!("HTTP {}", status.as_u16())));
        }
        let entries: Vec<ChartEntry> = response
            .json()
            .await
            .map_err(|e| CoreError::data_unavailable(SOURCE_NAME, format!("undecodable response: {}", e)))?;

        let mut points: Vec<SupplyPoint> = entries.iter().filter_map(to_supply_point).collect();
        points.sort_by_key(|p| p.date);
        retain_trailing(&mut points, lookback_days);
        if points.is_empty() {
            return Err(CoreError::data_unavailable(SOURCE_NAME, "no rows"));
        }
        Ok(points)
    }
}

fn to_supply_point(entry: &ChartEntry) -> Option<SupplyPoint> {
    let secs = match &entry.date {
        serde_json::Value::String(s) => s.parse::<i64>().ok()?,
        serde_json::Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    let date = DateTime::from_timestamp(secs, 0)?.date_naive();
    let total: f64 = entry.total_circulating_usd.values().sum();
    Some(SupplyPoint {
        date,
        total_supply_usd: total,
    })
}

/// Deterministic stand-in: base supply plus a linear trend plus Gaussian noise
pub fn simulated_supply(end: NaiveDate) -> StablecoinSupply {
    let mut rng = StdRng::seed_from_u64(SIMULATED_SUPPLY_SEED);
    let noise = Normal::new(0.0, SIMULATED_SUPPLY_NOISE_USD).ok();
    let n = SIMULATED_SUPPLY_DAYS;

    let points = (0..n)
        .map(|i| {
            let date = end - Duration::days(n - 1 - i);
            let trend = SIMULATED_SUPPLY_TREND_USD * i as f64 / (n - 1) as f64;
            let shock = noise.as_ref().map(|d| d.sample(&mut rng)).unwrap_or(0.0);
            SupplyPoint {
                date,
                total_supply_usd: SIMULATED_SUPPLY_BASE_USD + trend + shock,
            }
        })
        .collect();

    StablecoinSupply {
        points,
        provenance: Provenance::Simulated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_series_is_deterministic_and_marked() {
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let a = simulated_supply(end);
        let b = simulated_supply(end);
        assert_eq!(a.provenance, Provenance::Simulated);
        assert_eq!(a.points.len(), 365);
        assert_eq!(a.points.last().unwrap().date, end);
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn trailing_window_keeps_the_newest_days() {
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let full = simulated_supply(end);
        let recent = simulated_supply(end).trailing(30);
        assert_eq!(recent.points.len(), 30);
        assert_eq!(recent.points.first().unwrap().date, NaiveDate::from_ymd_opt(2023, 12, 2).unwrap());
        assert_eq!(recent.points[..], full.points[335..]);
        assert_eq!(recent.provenance, Provenance::Simulated);
        assert_eq!(simulated_supply(end).trailing(1000).points.len(), 365);
    }

    #[test]
    fn chart_entries_accept_string_and_numeric_dates() {
        let raw = r#"[
            {"date": "1672531200", "totalCirculatingUSD": {"peggedUSD": 100.0, "peggedEUR": 5.0}},
            {"date": 1672617600, "totalCirculatingUSD": {"peggedUSD": 110.0}},
            {"date": null}
        ]"#;
        let entries: Vec<ChartEntry> = serde_json::from_str(raw).unwrap();
        let points: Vec<SupplyPoint> = entries.iter().filter_map(to_supply_point).collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].total_supply_usd, 105.0);
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
    }
}
