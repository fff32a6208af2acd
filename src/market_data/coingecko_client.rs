use chrono::{DateTime, NaiveDate};
use eyre::{Result, WrapErr};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{AssetSeries, PricePoint};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::http_client::{HttpClientSettings, build_http_client};

/// Raw `/coins/{id}/market_chart` payload; each entry is `[unix_ms, value]`
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    vs_currency: String,
}

impl CoinGeckoClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = build_http_client(HttpClientSettings {
            timeout: config.http_timeout,
            requests_per_minute: config.rate_limit_per_minute,
            max_retries: config.fetch_max_retries,
        })
        .wrap_err("Failed to create CoinGecko HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.coingecko_base_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
        })
    }

    /// Daily close/volume history for `asset_id` over the last `days` days.
    ///
    /// Any transport failure, non-success status (429 and 5xx included),
    /// undecodable body or empty result is reported as `DataUnavailable`.
    #[instrument(skip(self))]
    pub async fn fetch_market_chart(&self, asset_id: &str, days: u32) -> CoreResult<AssetSeries> {
        let url = Url::parse(&format!("{}/coins/{}/market_chart", self.base_url, asset_id))
            .map_err(|e| CoreError::data_unavailable(asset_id, format!("invalid endpoint: {}", e)))?;
        let params = [
            ("vs_currency", self.vs_currency.clone()),
            ("days", days.to_string()),
            ("interval", "daily".to_string()),
        ];

        let response = self
            .http_client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| CoreError::data_unavailable(asset_id, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(asset_id, %status, "CoinGecko request rejected");
            return Err(CoreError::data_unavailable(asset_id, describe_status(status)));
        }

        let chart: MarketChartResponse = response
            .json()
            .await
            .map_err(|e| CoreError::data_unavailable(asset_id, format!("undecodable response: {}", e)))?;
        debug!(
            asset_id,
            price_rows = chart.prices.len(),
            volume_rows = chart.total_volumes.len(),
            "Received market chart"
        );

        let series = normalize_market_chart(asset_id, &chart);
        if series.is_empty() {
            return Err(CoreError::data_unavailable(asset_id, "no rows for requested range"));
        }
        Ok(series)
    }
}

fn describe_status(status: StatusCode) -> String {
    if status == StatusCode::TOO_MANY_REQUESTS {
        "rate limited (HTTP 429)".to_string()
    } else if status.is_server_error() {
        format!("upstream server error (HTTP {})", status.as_u16())
    } else {
        format!("request failed (HTTP {})", status.as_u16())
    }
}

fn to_date(unix_ms: f64) -> Option<NaiveDate> {
    if !unix_ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(unix_ms as i64).map(|dt| dt.date_naive())
}

/// Collapse the payload to one row per UTC date.
///
/// The last observation of a date wins (CoinGecko appends an intraday "now"
/// sample to the daily series). Dates lacking either price or volume are dropped.
pub fn normalize_market_chart(asset_id: &str, chart: &MarketChartResponse) -> AssetSeries {
    let mut rows: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for &(ts, price) in &chart.prices {
        if let Some(date) = to_date(ts) {
            rows.entry(date).or_default().0 = Some(price);
        }
    }
    for &(ts, volume) in &chart.total_volumes {
        if let Some(date) = to_date(ts) {
            rows.entry(date).or_default().1 = Some(volume);
        }
    }

    let mut dropped = 0usize;
    let points: Vec<PricePoint> = rows
        .into_iter()
        .filter_map(|(date, row)| match row {
            (Some(close_price), Some(volume)) => Some(PricePoint { date, close_price, volume }),
            _ => {
                dropped += 1;
                None
            }
        })
        .collect();
    if dropped > 0 {
        debug!(asset_id, dropped, "Dropped incomplete market chart rows");
    }
    AssetSeries::from_points(asset_id, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: f64 = 86_400_000.0;
    // 2023-01-01T00:00:00Z
    const JAN_1_MS: f64 = 1_672_531_200_000.0;

    #[test]
    fn last_sample_of_a_day_wins() {
        let chart = MarketChartResponse {
            prices: vec![(JAN_1_MS, 100.0), (JAN_1_MS + DAY_MS, 110.0), (JAN_1_MS + DAY_MS + 3_600_000.0, 111.0)],
            total_volumes: vec![(JAN_1_MS, 5.0), (JAN_1_MS + DAY_MS, 6.0), (JAN_1_MS + DAY_MS + 3_600_000.0, 7.0)],
        };
        let series = normalize_market_chart("bitcoin", &chart);
        assert_eq!(series.len(), 2);
        let last = series.points()[1];
        assert_eq!(last.date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(last.close_price, 111.0);
        assert_eq!(last.volume, 7.0);
    }

    #[test]
    fn rows_without_volume_are_dropped() {
        let chart = MarketChartResponse {
            prices: vec![(JAN_1_MS, 100.0), (JAN_1_MS + DAY_MS, 110.0)],
            total_volumes: vec![(JAN_1_MS, 5.0)],
        };
        let series = normalize_market_chart("bitcoin", &chart);
        assert_eq!(series.len(), 1);
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2023, 1, 1));
    }

    #[test]
    fn status_descriptions() {
        assert!(describe_status(StatusCode::TOO_MANY_REQUESTS).contains("429"));
        assert!(describe_status(StatusCode::BAD_GATEWAY).contains("server error"));
        assert!(describe_status(StatusCode::NOT_FOUND).contains("404"));
    }
}
