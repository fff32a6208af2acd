use super::types::{ComponentScores, IndexWeights};
use crate::constants::{INDEX_SCALE_MAX, INDEX_SCALE_MIN};
use crate::error::CoreResult;

/// Combines the three sub-scores into one daily value.
///
/// The engine clamps whatever this returns to 0-100, so implementations
/// need not.
pub trait IndexFormula: Send + Sync {
    fn name(&self) -> &str;

    fn combine(&self, components: &ComponentScores) -> f64;
}

/// Fixed linear blend of the sub-scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedSumFormula {
    weights: IndexWeights,
}

impl WeightedSumFormula {
    pub fn new(weights: IndexWeights) -> CoreResult<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> IndexWeights {
        self.weights
    }
}

impl IndexFormula for WeightedSumFormula {
    fn name(&self) -> &str {
        "weighted_sum"
    }

    fn combine(&self, c: &ComponentScores) -> f64 {
        self.weights.volatility * c.volatility
            + self.weights.volume_surge * c.volume_surge
            + self.weights.event_intensity * c.event_intensity
    }
}

impl<F: IndexFormula + ?Sized> IndexFormula for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn combine(&self, components: &ComponentScores) -> f64 {
        (**self).combine(components)
    }
}

/// Force a value onto the index scale; NaN maps to the floor
pub fn clamp_index(value: f64) -> f64 {
    if value.is_nan() {
        INDEX_SCALE_MIN
    } else {
        value.clamp(INDEX_SCALE_MIN, INDEX_SCALE_MAX)
    }
}
