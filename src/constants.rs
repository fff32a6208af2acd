// --- DATA SOURCES ---
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFILLAMA_BASE_URL: &str = "https://stablecoins.llama.fi";
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// CoinGecko free tier allows roughly 10-30 calls per minute
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

pub const DEFAULT_TRACKED_ASSETS: &[&str] = &["bitcoin", "ethereum", "tether", "monero"];
pub const DEFAULT_BENCHMARK_ASSET: &str = "bitcoin";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

use crate::portfolio::types::AssetClass;

/// An asset the dashboard knows how to fetch and classify
#[derive(Debug, Clone, Copy)]
pub struct CatalogAsset {
    pub coingecko_id: &'static str,
    pub symbol: &'static str,
    pub asset_class: AssetClass,
}

pub const ASSET_CATALOG: &[CatalogAsset] = &[
    CatalogAsset { coingecko_id: "bitcoin", symbol: "BTC", asset_class: AssetClass::Bitcoin },
    CatalogAsset { coingecko_id: "ethereum", symbol: "ETH", asset_class: AssetClass::Ethereum },
    CatalogAsset { coingecko_id: "tether", symbol: "USDT", asset_class: AssetClass::Stablecoins },
    CatalogAsset { coingecko_id: "usd-coin", symbol: "USDC", asset_class: AssetClass::Stablecoins },
    CatalogAsset { coingecko_id: "monero", symbol: "XMR", asset_class: AssetClass::Privacy },
    CatalogAsset { coingecko_id: "zcash", symbol: "ZEC", asset_class: AssetClass::Privacy },
];

pub fn catalog_asset(coingecko_id: &str) -> Option<&'static CatalogAsset> {
    ASSET_CATALOG.iter().find(|a| a.coingecko_id == coingecko_id)
}

/// Ticker for display, falling back to the raw id for uncatalogued assets
pub fn display_symbol(coingecko_id: &str) -> String {
    catalog_asset(coingecko_id)
        .map(|a| a.symbol.to_string())
        .unwrap_or_else(|| coingecko_id.to_string())
}

// --- INDEX CONSTRUCTION ---
pub const DEFAULT_VOLATILITY_WEIGHT: f64 = 0.30;
pub const DEFAULT_VOLUME_SURGE_WEIGHT: f64 = 0.30;
pub const DEFAULT_EVENT_INTENSITY_WEIGHT: f64 = 0.40;

pub const DEFAULT_VOLATILITY_WINDOW_DAYS: usize = 30;
pub const DEFAULT_VOLUME_WINDOW_DAYS: usize = 90;
pub const DEFAULT_EVENT_WINDOW_DAYS: i64 = 7;

/// Daily return std-dev mapped to 0 and 100 respectively
pub const VOLATILITY_REFERENCE_MIN: f64 = 0.0;
pub const VOLATILITY_REFERENCE_MAX: f64 = 0.10;
pub const VOLUME_ZSCORE_CLAMP: f64 = 3.0;
/// Severity sum that saturates the event-intensity component (two extreme events)
pub const EVENT_INTENSITY_MAX: f64 = 20.0;

pub const INDEX_SCALE_MIN: f64 = 0.0;
pub const INDEX_SCALE_MAX: f64 = 100.0;
pub const NEUTRAL_SUB_SCORE: f64 = 50.0;
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// --- EVENT STUDY ---
pub const DEFAULT_EVENT_STUDY_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_CRISIS_WINDOW_DAYS: i64 = 7;

// --- PORTFOLIO ---
pub const ALLOCATION_TOLERANCE_PCT: f64 = 0.5;
pub const STABLECOIN_MAX_LEVERAGE: f64 = 3.0;
pub const STABLECOIN_RECOMMENDED_LEVERAGE: f64 = 2.0;
pub const VOLATILE_MAX_LEVERAGE: f64 = 2.0;
pub const VOLATILE_RECOMMENDED_LEVERAGE: f64 = 1.0;

// --- EVENT CLASSIFICATION ---
pub const SEVERITY_GUIDELINES: [&str; 10] = [
    "Minor: Local regulatory clarification, small exchange licensing",
    "Low: Limited KYC requirements, minor tax reporting changes",
    "Moderate: Exchange restrictions in small markets",
    "Noticeable: Significant but localized regulatory action",
    "Medium: Major exchange shut down, mid-size country restrictions",
    "Significant: Large country regulatory crackdown",
    "High: Major banking crisis, targeted sanctions",
    "Severe: Systemic banking failure, broad sanctions",
    "Critical: SWIFT removal, nationwide crypto ban in major economy",
    "Extreme: Multi-country coordinated action, global systemic event",
];

pub const HIGH_FRICTION_COUNTRIES: &[&str] = &[
    "Russia", "China", "Venezuela", "Argentina", "Lebanon",
    "Turkey", "Nigeria", "Iran", "Cuba", "North Korea",
];

// --- STABLECOIN SUPPLY PLACEHOLDER ---
pub const SIMULATED_SUPPLY_SEED: u64 = 42;
pub const SIMULATED_SUPPLY_DAYS: i64 = 365;
pub const SIMULATED_SUPPLY_BASE_USD: f64 = 100e9;
pub const SIMULATED_SUPPLY_TREND_USD: f64 = 50e9;
pub const SIMULATED_SUPPLY_NOISE_USD: f64 = 5e9;
