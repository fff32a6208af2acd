pub mod coingecko_client;
pub mod correlation;
pub mod series_cache;
pub mod stablecoin_supply;
pub mod types;

use eyre::Result;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use coingecko_client::CoinGeckoClient;
use series_cache::{CacheKey, SeriesCache};
use types::AssetSeries;

/// Non-fatal notice that an asset was replaced by an empty series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchWarning {
    pub asset_id: String,
    pub message: String,
}

impl FetchWarning {
    fn from_error(asset_id: &str, error: &CoreError) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            message: error.to_string(),
        }
    }
}

/// Series for every requested asset, with failed assets present but empty
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub series: BTreeMap<String, AssetSeries>,
    pub warnings: Vec<FetchWarning>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Cached access to daily price/volume history
#[derive(Debug)]
pub struct MarketDataFetcher {
    client: CoinGeckoClient,
    cache: SeriesCache,
}

impl MarketDataFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: CoinGeckoClient::new(config)?,
            cache: SeriesCache::new(config.cache_ttl),
        })
    }

    /// Daily series for one asset; served from cache within the TTL
    #[instrument(skip(self), fields(on_close = true))]
    pub async fn fetch(&self, asset_id: &str, lookback_days: u32) -> CoreResult<AssetSeries> {
        let key = CacheKey::new(asset_id, lookback_days);
        if let Some(series) = self.cache.get(&key).await {
            debug!(asset_id, rows = series.len(), "Series served from cache");
            return Ok(series);
        }

        let series = self.client.fetch_market_chart(asset_id, lookback_days).await?;
        info!(asset_id, rows = series.len(), "Fetched market series");
        self.cache.insert(key, series.clone()).await;
        Ok(series)
    }

    /// Like [`fetch`](Self::fetch) but never fails: an unavailable asset
    /// yields an empty series plus a warning
    pub async fn fetch_or_empty(&self, asset_id: &str, lookback_days: u32) -> (AssetSeries, Option<FetchWarning>) {
        match self.fetch(asset_id, lookback_days).await {
            Ok(series) => (series, None),
            Err(e) => {
                warn!(asset_id, error = %e, "Falling back to empty series");
                (AssetSeries::empty(asset_id), Some(FetchWarning::from_error(asset_id, &e)))
            }
        }
    }

    #[instrument(skip(self), fields(on_close = true))]
    pub async fn fetch_many(&self, asset_ids: &[String], lookback_days: u32) -> FetchReport {
        let results = join_all(
            asset_ids
                .iter()
                .map(|id| self.fetch_or_empty(id, lookback_days)),
        )
        .await;

        let mut report = FetchReport::default();
        for (series, warning) in results {
            report.series.insert(series.asset_id.clone(), series);
            report.warnings.extend(warning);
        }
        report
    }

    pub async fn cached_series(&self) -> usize {
        self.cache.live_entries().await
    }
}
