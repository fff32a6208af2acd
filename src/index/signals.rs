use chrono::{Duration, NaiveDate};

use super::types::IndexParams;
use crate::constants::{INDEX_SCALE_MAX, INDEX_SCALE_MIN};
use crate::events::PolicyEvent;

/// Sample standard deviation (n - 1)
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Std-dev of the `window` daily returns ending at row `i`.
///
/// `None` until `window` consecutive valid returns exist.
pub fn rolling_volatility(returns: &[Option<f64>], i: usize, window: usize) -> Option<f64> {
    if window < 2 || i < window || i >= returns.len() {
        return None;
    }
    let slice: Option<Vec<f64>> = returns[i + 1 - window..=i].iter().copied().collect();
    sample_std(&slice?)
}

/// Z-score of row `i`'s volume against the `window` rows before it.
///
/// A flat baseline gives 0 when the volume matches it and an infinite score
/// (saturated later by the clamp) when it does not.
pub fn volume_zscore(volumes: &[f64], i: usize, window: usize) -> Option<f64> {
    if window < 2 || i < window || i >= volumes.len() {
        return None;
    }
    let baseline = &volumes[i - window..i];
    let current = volumes[i];
    if !current.is_finite() || baseline.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mean = baseline.iter().sum::<f64>() / window as f64;
    let std = sample_std(baseline)?;
    let deviation = current - mean;
    if std == 0.0 {
        if deviation == 0.0 {
            return Some(0.0);
        }
        return Some(f64::INFINITY.copysign(deviation));
    }
    Some(deviation / std)
}

/// Flat sum of severities for events dated in `(day - window_days, day]`
pub fn severity_sum(events: &[PolicyEvent], day: NaiveDate, window_days: i64) -> f64 {
    let earliest_excluded = day - Duration::days(window_days);
    events
        .iter()
        .filter(|e| e.date > earliest_excluded && e.date <= day)
        .map(|e| f64::from(e.severity))
        .sum()
}

fn clamp_scale(x: f64) -> f64 {
    if x.is_nan() {
        return INDEX_SCALE_MIN;
    }
    x.clamp(INDEX_SCALE_MIN, INDEX_SCALE_MAX)
}

/// Linear map of `[min, max]` onto 0-100, saturating outside the range
pub fn scale_min_max(x: f64, min: f64, max: f64) -> f64 {
    clamp_scale((x - min) / (max - min) * INDEX_SCALE_MAX)
}

pub fn volatility_score(volatility: f64, params: &IndexParams) -> f64 {
    scale_min_max(volatility, params.volatility_reference_min, params.volatility_reference_max)
}

/// `[-clamp, +clamp]` onto 0-100; a z-score of 0 lands on 50
pub fn volume_surge_score(zscore: f64, params: &IndexParams) -> f64 {
    let c = params.volume_zscore_clamp;
    if zscore.is_nan() {
        return INDEX_SCALE_MAX / 2.0;
    }
    scale_min_max(zscore.clamp(-c, c), -c, c)
}

pub fn event_intensity_score(severity_sum: f64, params: &IndexParams) -> f64 {
    scale_min_max(severity_sum, 0.0, params.event_intensity_max)
}
