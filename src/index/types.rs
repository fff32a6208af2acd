use chrono::NaiveDate;
use serde::Serialize;

use crate::constants::*;
use crate::error::{CoreError, CoreResult};

/// Relative weight of each component; must sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexWeights {
    pub volatility: f64,
    pub volume_surge: f64,
    pub event_intensity: f64,
}

impl Default for IndexWeights {
    fn default() -> Self {
        Self {
            volatility: DEFAULT_VOLATILITY_WEIGHT,
            volume_surge: DEFAULT_VOLUME_SURGE_WEIGHT,
            event_intensity: DEFAULT_EVENT_INTENSITY_WEIGHT,
        }
    }
}

impl IndexWeights {
    pub fn new(volatility: f64, volume_surge: f64, event_intensity: f64) -> Self {
        Self {
            volatility,
            volume_surge,
            event_intensity,
        }
    }

    pub fn sum(&self) -> f64 {
        self.volatility + self.volume_surge + self.event_intensity
    }

    pub fn validate(&self) -> CoreResult<()> {
        let all = [self.volatility, self.volume_surge, self.event_intensity];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CoreError::validation(format!("index weights must be finite and non-negative: {:?}", self)));
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CoreError::validation(format!("index weights sum to {}, expected 1.0", self.sum())));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexParams {
    /// Asset whose date range and statistics drive the index
    pub benchmark_asset: String,
    pub volatility_window_days: usize,
    pub volume_window_days: usize,
    pub event_window_days: i64,
    /// Daily-return std-dev mapped to sub-score 0
    pub volatility_reference_min: f64,
    /// Daily-return std-dev mapped to sub-score 100
    pub volatility_reference_max: f64,
    pub volume_zscore_clamp: f64,
    /// Severity sum mapped to sub-score 100
    pub event_intensity_max: f64,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            benchmark_asset: DEFAULT_BENCHMARK_ASSET.to_string(),
            volatility_window_days: DEFAULT_VOLATILITY_WINDOW_DAYS,
            volume_window_days: DEFAULT_VOLUME_WINDOW_DAYS,
            event_window_days: DEFAULT_EVENT_WINDOW_DAYS,
            volatility_reference_min: VOLATILITY_REFERENCE_MIN,
            volatility_reference_max: VOLATILITY_REFERENCE_MAX,
            volume_zscore_clamp: VOLUME_ZSCORE_CLAMP,
            event_intensity_max: EVENT_INTENSITY_MAX,
        }
    }
}

impl IndexParams {
    pub fn validate(&self) -> CoreResult<()> {
        if self.volatility_window_days < 2 || self.volume_window_days < 2 {
            return Err(CoreError::validation("rolling windows need at least 2 days"));
        }
        if self.event_window_days < 1 {
            return Err(CoreError::validation("event window must be at least 1 day"));
        }
        if !(self.volatility_reference_max > self.volatility_reference_min) {
            return Err(CoreError::validation("volatility reference range is empty"));
        }
        if !(self.volume_zscore_clamp > 0.0) || !(self.event_intensity_max > 0.0) {
            return Err(CoreError::validation("z-score clamp and event intensity maximum must be positive"));
        }
        Ok(())
    }
}

/// Sub-scores on the 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScores {
    pub volatility: f64,
    pub volume_surge: f64,
    pub event_intensity: f64,
}

impl ComponentScores {
    pub fn uniform(score: f64) -> Self {
        Self {
            volatility: score,
            volume_surge: score,
            event_intensity: score,
        }
    }
}

/// Un-normalized statistics behind the sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawSignals {
    /// Std-dev of daily returns; `None` while the window is filling
    pub volatility: Option<f64>,
    pub volume_zscore: Option<f64>,
    pub severity_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexScore {
    pub date: NaiveDate,
    /// Always within 0..=100
    pub value: f64,
    pub components: ComponentScores,
    pub raw: RawSignals,
}
