pub mod engine;
pub mod formula;
pub mod signals;
pub mod types;

use std::collections::BTreeMap;

pub use engine::IndexEngine;
pub use formula::{IndexFormula, WeightedSumFormula};
pub use types::{ComponentScores, IndexParams, IndexScore, IndexWeights, RawSignals};

use crate::error::CoreResult;
use crate::events::PolicyEvent;
use crate::market_data::types::AssetSeries;

/// Compute the index with the default weighted-sum formula
pub fn compute(
    series_by_asset: &BTreeMap<String, AssetSeries>,
    events: &[PolicyEvent],
    weights: IndexWeights,
    params: IndexParams,
) -> CoreResult<Vec<IndexScore>> {
    IndexEngine::new(weights, params)?.compute(series_by_asset, events)
}
