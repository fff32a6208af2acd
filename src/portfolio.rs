pub mod calculator;
pub mod types;

use std::collections::BTreeMap;

pub use calculator::PortfolioCalculator;
pub use types::{AssetClass, PortfolioAllocation, PortfolioMetrics, ReturnAssumption};

use crate::error::CoreResult;

pub fn evaluate(
    allocation: &PortfolioAllocation,
    assumptions: &BTreeMap<AssetClass, ReturnAssumption>,
) -> CoreResult<PortfolioMetrics> {
    PortfolioCalculator::new(assumptions.clone()).evaluate(allocation)
}
