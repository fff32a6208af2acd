use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use super::formula::{IndexFormula, WeightedSumFormula, clamp_index};
use super::signals;
use super::types::{ComponentScores, IndexParams, IndexScore, IndexWeights, RawSignals};
use crate::constants::NEUTRAL_SUB_SCORE;
use crate::error::{CoreError, CoreResult};
use crate::events::PolicyEvent;
use crate::market_data::types::AssetSeries;

/// Daily Corruption Index over the benchmark asset's date range
pub struct IndexEngine<F: IndexFormula = WeightedSumFormula> {
    params: IndexParams,
    formula: F,
}

impl IndexEngine<WeightedSumFormula> {
    pub fn new(weights: IndexWeights, params: IndexParams) -> CoreResult<Self> {
        Self::with_formula(params, WeightedSumFormula::new(weights)?)
    }
}

impl<F: IndexFormula> IndexEngine<F> {
    pub fn with_formula(params: IndexParams, formula: F) -> CoreResult<Self> {
        params.validate()?;
        Ok(Self { params, formula })
    }

    pub fn params(&self) -> &IndexParams {
        &self.params
    }

    pub fn formula_name(&self) -> &str {
        self.formula.name()
    }

    /// One score per benchmark row.
    ///
    /// Components whose window is not yet full sit at the neutral midpoint.
    #[instrument(
        skip_all,
        fields(benchmark = %self.params.benchmark_asset, formula = self.formula.name(), on_close = true)
    )]
    pub fn compute(
        &self,
        series_by_asset: &BTreeMap<String, AssetSeries>,
        events: &[PolicyEvent],
    ) -> CoreResult<Vec<IndexScore>> {
        let benchmark = series_by_asset.get(&self.params.benchmark_asset).ok_or_else(|| {
            CoreError::insufficient(
                self.params.benchmark_asset.clone(),
                "benchmark series missing from input",
            )
        })?;
        if benchmark.is_empty() {
            debug!("Benchmark series is empty, no index computed");
            return Ok(Vec::new());
        }

        let returns = benchmark.daily_returns();
        let volumes: Vec<f64> = benchmark.points().iter().map(|p| p.volume).collect();

        let scores: Vec<IndexScore> = benchmark
            .points()
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let raw = RawSignals {
                    volatility: signals::rolling_volatility(&returns, i, self.params.volatility_window_days),
                    volume_zscore: signals::volume_zscore(&volumes, i, self.params.volume_window_days),
                    severity_sum: signals::severity_sum(events, point.date, self.params.event_window_days),
                };
                let components = self.components(&raw);
                IndexScore {
                    date: point.date,
                    value: clamp_index(self.formula.combine(&components)),
                    components,
                    raw,
                }
            })
            .collect();

        if let Some(latest) = scores.last() {
            info!(days = scores.len(), latest_date = %latest.date, latest_value = latest.value, "Index computed");
        }
        Ok(scores)
    }

    fn components(&self, raw: &RawSignals) -> ComponentScores {
        ComponentScores {
            volatility: raw
                .volatility
                .map(|v| signals::volatility_score(v, &self.params))
                .unwrap_or(NEUTRAL_SUB_SCORE),
            volume_surge: raw
                .volume_zscore
                .map(|z| signals::volume_surge_score(z, &self.params))
                .unwrap_or(NEUTRAL_SUB_SCORE),
            event_intensity: signals::event_intensity_score(raw.severity_sum, &self.params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use crate::market_data::types::PricePoint;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    fn series(prices: &[f64], volumes: &[f64]) -> BTreeMap<String, AssetSeries> {
        let points = prices
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&p, &v))| PricePoint {
                date: start() + Duration::days(i as i64),
                close_price: p,
                volume: v,
            })
            .collect();
        BTreeMap::from([("bitcoin".to_string(), AssetSeries::from_points("bitcoin", points))])
    }

    fn event(offset: i64, severity: u8) -> PolicyEvent {
        PolicyEvent {
            id: 1,
            date: start() + Duration::days(offset),
            country: "Global".to_string(),
            event_type: EventType::Other,
            severity,
            description: String::new(),
        }
    }

    #[test]
    fn neutral_components_blend_to_exactly_fifty() {
        let engine = IndexEngine::new(IndexWeights::new(0.3, 0.3, 0.4), IndexParams::default()).unwrap();
        let input = series(&[100.0, 101.0], &[5.0, 5.0]);
        // severity 10 against a max of 20 puts event intensity at 50
        let scores = engine.compute(&input, &[event(1, 10)]).unwrap();
        assert_eq!(scores[1].components, ComponentScores::uniform(50.0));
        assert_eq!(scores[1].value, 50.0);
    }

    #[test]
    fn missing_benchmark_is_insufficient_data() {
        let engine = IndexEngine::new(IndexWeights::default(), IndexParams::default()).unwrap();
        let err = engine.compute(&BTreeMap::new(), &[]).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData { .. }));
    }

    #[test]
    fn empty_benchmark_yields_no_scores() {
        let engine = IndexEngine::new(IndexWeights::default(), IndexParams::default()).unwrap();
        let input = BTreeMap::from([("bitcoin".to_string(), AssetSeries::empty("bitcoin"))]);
        assert!(engine.compute(&input, &[]).unwrap().is_empty());
    }

    #[test]
    fn volatility_component_engages_once_window_fills() {
        let params = IndexParams {
            volatility_window_days: 2,
            volume_window_days: 2,
            ..IndexParams::default()
        };
        let engine = IndexEngine::new(IndexWeights::new(1.0, 0.0, 0.0), params).unwrap();
        let input = series(&[100.0, 110.0, 99.0, 108.9], &[1.0, 1.0, 1.0, 1.0]);
        let scores = engine.compute(&input, &[]).unwrap();
        assert_eq!(scores[0].components.volatility, 50.0);
        assert_eq!(scores[1].components.volatility, 50.0);
        assert!(scores[2].raw.volatility.is_some());
        // returns +10%, -10% -> std ~0.141, beyond the 0.10 reference max
        assert_eq!(scores[2].components.volatility, 100.0);
        assert_eq!(scores[2].value, 100.0);
    }

    #[test]
    fn custom_formula_replaces_weighted_sum() {
        struct Loudest;
        impl IndexFormula for Loudest {
            fn name(&self) -> &str {
                "loudest"
            }
            fn combine(&self, c: &ComponentScores) -> f64 {
                c.volatility.max(c.volume_surge).max(c.event_intensity) * 3.0
            }
        }

        let engine = IndexEngine::with_formula(IndexParams::default(), Loudest).unwrap();
        assert_eq!(engine.formula_name(), "loudest");
        let scores = engine.compute(&series(&[1.0, 2.0], &[1.0, 1.0]), &[]).unwrap();
        // 50 * 3 is clamped back onto the scale
        assert!(scores.iter().all(|s| s.value == 100.0));
    }

    #[test]
    fn boxed_formula_is_accepted() {
        let formula: Box<dyn IndexFormula> = Box::new(WeightedSumFormula::new(IndexWeights::default()).unwrap());
        let engine = IndexEngine::with_formula(IndexParams::default(), formula).unwrap();
        assert_eq!(engine.formula_name(), "weighted_sum");
    }
}
