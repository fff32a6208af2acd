use dotenvy::dotenv;
use eyre::{Result, WrapErr, eyre};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::index::types::{IndexParams, IndexWeights};
use crate::portfolio::types::{AssetClass, ReturnAssumption, default_return_assumptions};

#[derive(Debug, Clone)]
pub struct Config {
    pub coingecko_base_url: String,
    pub defillama_base_url: String,
    pub vs_currency: String,
    pub http_timeout: Duration,
    pub rate_limit_per_minute: u32,
    pub fetch_max_retries: u32,
    pub cache_ttl: Duration,

    pub tracked_assets: Vec<String>,
    pub lookback_days: u32,

    pub index_weights: IndexWeights,
    pub index_params: IndexParams,

    pub event_study_window_days: i64,
    pub crisis_window_days: i64,

    pub return_assumptions: BTreeMap<AssetClass, ReturnAssumption>,
    pub events_file: Option<PathBuf>,
}

impl Config {
    /// Load from the process environment, reading `.env` first when present
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let tracked_assets = env::var("TRACKED_ASSETS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_else(|_| DEFAULT_TRACKED_ASSETS.iter().map(|s| s.to_string()).collect());
        if tracked_assets.is_empty() {
            return Err(eyre!("TRACKED_ASSETS must name at least one asset"));
        }

        let index_weights = IndexWeights {
            volatility: env_or("INDEX_WEIGHT_VOLATILITY", DEFAULT_VOLATILITY_WEIGHT)?,
            volume_surge: env_or("INDEX_WEIGHT_VOLUME_SURGE", DEFAULT_VOLUME_SURGE_WEIGHT)?,
            event_intensity: env_or("INDEX_WEIGHT_EVENT_INTENSITY", DEFAULT_EVENT_INTENSITY_WEIGHT)?,
        };
        index_weights
            .validate()
            .wrap_err("Invalid INDEX_WEIGHT_* configuration")?;

        let index_params = IndexParams {
            benchmark_asset: env::var("BENCHMARK_ASSET").unwrap_or_else(|_| DEFAULT_BENCHMARK_ASSET.to_string()),
            volatility_window_days: env_or("VOLATILITY_WINDOW_DAYS", DEFAULT_VOLATILITY_WINDOW_DAYS)?,
            volume_window_days: env_or("VOLUME_WINDOW_DAYS", DEFAULT_VOLUME_WINDOW_DAYS)?,
            event_window_days: env_or("EVENT_WINDOW_DAYS", DEFAULT_EVENT_WINDOW_DAYS)?,
            ..IndexParams::default()
        };

        Ok(Config {
            coingecko_base_url: env::var("COINGECKO_BASE_URL").unwrap_or_else(|_| COINGECKO_BASE_URL.to_string()),
            defillama_base_url: env::var("DEFILLAMA_BASE_URL").unwrap_or_else(|_| DEFILLAMA_BASE_URL.to_string()),
            vs_currency: env::var("VS_CURRENCY").unwrap_or_else(|_| DEFAULT_VS_CURRENCY.to_string()),
            http_timeout: Duration::from_secs(env_or("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?),
            rate_limit_per_minute: env_or("RATE_LIMIT_PER_MINUTE", DEFAULT_RATE_LIMIT_PER_MINUTE)?,
            fetch_max_retries: env_or("FETCH_MAX_RETRIES", 0)?,
            cache_ttl: Duration::from_secs(env_or("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?),
            tracked_assets,
            lookback_days: env_or("LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?,
            index_weights,
            index_params,
            event_study_window_days: env_or("EVENT_STUDY_WINDOW_DAYS", DEFAULT_EVENT_STUDY_WINDOW_DAYS)?,
            crisis_window_days: env_or("CRISIS_WINDOW_DAYS", DEFAULT_CRISIS_WINDOW_DAYS)?,
            return_assumptions: default_return_assumptions(),
            events_file: env::var("EVENTS_FILE").ok().map(PathBuf::from),
        })
    }

    /// Built-in defaults with the given API base url, no environment involved
    pub fn with_base_url(coingecko_base_url: impl Into<String>) -> Self {
        Config {
            coingecko_base_url: coingecko_base_url.into(),
            defillama_base_url: DEFILLAMA_BASE_URL.to_string(),
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            fetch_max_retries: 0,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            tracked_assets: DEFAULT_TRACKED_ASSETS.iter().map(|s| s.to_string()).collect(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            index_weights: IndexWeights::default(),
            index_params: IndexParams::default(),
            event_study_window_days: DEFAULT_EVENT_STUDY_WINDOW_DAYS,
            crisis_window_days: DEFAULT_CRISIS_WINDOW_DAYS,
            return_assumptions: default_return_assumptions(),
            events_file: None,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| eyre!("Invalid value '{}' for {}: {}", raw, key, e)),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_normalizes_asset_lists() {
        assert_eq!(parse_list(" Bitcoin, ethereum,,monero "), vec!["bitcoin", "ethereum", "monero"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn defaults_match_published_parameters() {
        let cfg = Config::with_base_url("http://localhost");
        assert_eq!(cfg.index_params.volatility_window_days, 30);
        assert_eq!(cfg.index_params.volume_window_days, 90);
        assert_eq!(cfg.index_params.event_window_days, 7);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.fetch_max_retries, 0);
        assert!(cfg.index_weights.validate().is_ok());
    }

    #[test]
    fn missing_variable_falls_back_to_default() {
        let value: u32 = env_or("CCI_TEST_SURELY_UNSET_VARIABLE", 17).unwrap();
        assert_eq!(value, 17);
    }
}
