use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::types::AssetSeries;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub asset_id: String,
    pub lookback_days: u32,
}

impl CacheKey {
    pub fn new(asset_id: &str, lookback_days: u32) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            lookback_days,
        }
    }
}

#[derive(Debug)]
struct CachedSeries {
    series: AssetSeries,
    fetched_at: Instant,
}

/// Fetched series memoized for a fixed time-to-live.
///
/// Entries only leave by expiry; there is no explicit invalidation.
#[derive(Debug)]
pub struct SeriesCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CachedSeries>>,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &CacheKey) -> Option<AssetSeries> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => Some(entry.series.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: CacheKey, series: AssetSeries) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CachedSeries {
                series,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Number of entries that have not yet expired
    pub async fn live_entries(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|e| e.fetched_at.elapsed() < self.ttl).count()
    }
}
