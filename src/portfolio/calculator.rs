use std::collections::BTreeMap;
use tracing::{debug, instrument};

use super::types::{AssetClass, Confidence, PortfolioAllocation, PortfolioMetrics, ReturnAssumption};
use crate::constants::ALLOCATION_TOLERANCE_PCT;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone)]
pub struct PortfolioCalculator {
    assumptions: BTreeMap<AssetClass, ReturnAssumption>,
}

impl PortfolioCalculator {
    pub fn new(assumptions: BTreeMap<AssetClass, ReturnAssumption>) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &BTreeMap<AssetClass, ReturnAssumption> {
        &self.assumptions
    }

    /// Blend the static assumptions by weight and leverage.
    ///
    /// The drawdown is a weighted sum of per-class worst cases, capped at a
    /// total loss; it is not simulated.
    #[instrument(skip_all, fields(total_weight = allocation.total_weight()))]
    pub fn evaluate(&self, allocation: &PortfolioAllocation) -> CoreResult<PortfolioMetrics> {
        self.validate(allocation)?;

        let mut base = 0.0;
        let mut crisis = 0.0;
        let mut drawdown = 0.0;
        let mut gross_leverage = 0.0;
        let mut effective_exposure = BTreeMap::new();

        for (class, position) in allocation.positions() {
            let assumption = self
                .assumptions
                .get(class)
                .ok_or_else(|| CoreError::validation(format!("no return assumption for {}", class)))?;
            let exposure = position.weight_percent / 100.0 * position.leverage;

            base += exposure * assumption.base_return;
            crisis += exposure * assumption.base_return * assumption.crisis_multiplier;
            drawdown += exposure * assumption.volatility;
            gross_leverage += exposure;
            effective_exposure.insert(*class, position.weight_percent * position.leverage);
        }

        let metrics = PortfolioMetrics {
            expected_return_base: base,
            expected_return_crisis: crisis,
            max_drawdown: -drawdown.min(1.0),
            effective_exposure,
            gross_leverage,
            confidence: Confidence::Placeholder,
        };
        debug!(?metrics, "Portfolio evaluated");
        Ok(metrics)
    }

    fn validate(&self, allocation: &PortfolioAllocation) -> CoreResult<()> {
        if allocation.is_empty() {
            return Err(CoreError::validation("allocation is empty"));
        }
        for (class, position) in allocation.positions() {
            if !position.weight_percent.is_finite() || !(0.0..=100.0).contains(&position.weight_percent) {
                return Err(CoreError::validation(format!(
                    "{} weight {} outside 0..=100",
                    class, position.weight_percent
                )));
            }
            let max = class.max_leverage();
            if !position.leverage.is_finite() || position.leverage < 1.0 || position.leverage > max {
                return Err(CoreError::validation(format!(
                    "{} leverage {} outside 1.0..={}",
                    class, position.leverage, max
                )));
            }
            if !self.assumptions.contains_key(class) {
                return Err(CoreError::validation(format!("no return assumption for {}", class)));
            }
        }
        let total = allocation.total_weight();
        if (total - 100.0).abs() > ALLOCATION_TOLERANCE_PCT {
            return Err(CoreError::validation(format!("allocation weights sum to {}%, expected 100%", total)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::types::default_return_assumptions;
    use approx::assert_abs_diff_eq;

    fn calculator() -> PortfolioCalculator {
        PortfolioCalculator::new(default_return_assumptions())
    }

    #[test]
    fn default_allocation_metrics() {
        let metrics = calculator().evaluate(&PortfolioAllocation::default_allocation()).unwrap();
        assert_abs_diff_eq!(metrics.expected_return_base, 0.219, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.expected_return_crisis, 0.4068, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.max_drawdown, -0.485, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.gross_leverage, 1.4, epsilon = 1e-12);
        assert_eq!(metrics.effective_exposure[&AssetClass::Stablecoins], 80.0);
        assert_eq!(metrics.confidence, Confidence::Placeholder);
    }

    #[test]
    fn tolerates_rounding_in_weights() {
        let allocation = PortfolioAllocation::new()
            .with(AssetClass::Bitcoin, 30.0, 1.0)
            .with(AssetClass::Ethereum, 20.0, 1.0)
            .with(AssetClass::Stablecoins, 39.9, 2.0)
            .with(AssetClass::Privacy, 10.0, 1.0);
        assert!(calculator().evaluate(&allocation).is_ok());
    }

    #[test]
    fn rejects_allocation_summing_to_ninety() {
        let allocation = PortfolioAllocation::new()
            .with(AssetClass::Bitcoin, 30.0, 1.0)
            .with(AssetClass::Ethereum, 20.0, 1.0)
            .with(AssetClass::Stablecoins, 30.0, 2.0)
            .with(AssetClass::Privacy, 10.0, 1.0);
        let err = calculator().evaluate(&allocation).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn leverage_limits_follow_asset_class() {
        let stable_ok = PortfolioAllocation::new().with(AssetClass::Stablecoins, 100.0, 3.0);
        assert!(calculator().evaluate(&stable_ok).is_ok());
        let btc_too_high = PortfolioAllocation::new().with(AssetClass::Bitcoin, 100.0, 2.5);
        assert!(calculator().evaluate(&btc_too_high).is_err());
        let below_one = PortfolioAllocation::new().with(AssetClass::Bitcoin, 100.0, 0.5);
        assert!(calculator().evaluate(&below_one).is_err());
    }

    #[test]
    fn drawdown_is_capped_at_total_loss() {
        let calc = PortfolioCalculator::new(BTreeMap::from([(
            AssetClass::Ethereum,
            ReturnAssumption { base_return: 0.3, crisis_multiplier: 2.5, volatility: 0.65 },
        )]));
        let metrics = calc
            .evaluate(&PortfolioAllocation::new().with(AssetClass::Ethereum, 100.0, 2.0))
            .unwrap();
        assert_eq!(metrics.max_drawdown, -1.0);
    }

    #[test]
    fn missing_assumption_is_rejected() {
        let calc = PortfolioCalculator::new(BTreeMap::new());
        let err = calc
            .evaluate(&PortfolioAllocation::new().with(AssetClass::Privacy, 100.0, 1.0))
            .unwrap_err();
        assert!(err.to_string().contains("no return assumption"));
    }
}
