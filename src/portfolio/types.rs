use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Bitcoin,
    Ethereum,
    Stablecoins,
    Privacy,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Bitcoin,
        AssetClass::Ethereum,
        AssetClass::Stablecoins,
        AssetClass::Privacy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Bitcoin => "Bitcoin",
            AssetClass::Ethereum => "Ethereum",
            AssetClass::Stablecoins => "Stablecoins",
            AssetClass::Privacy => "Privacy Coins",
        }
    }

    pub fn is_stablecoin(&self) -> bool {
        matches!(self, AssetClass::Stablecoins)
    }

    pub fn max_leverage(&self) -> f64 {
        if self.is_stablecoin() { STABLECOIN_MAX_LEVERAGE } else { VOLATILE_MAX_LEVERAGE }
    }

    pub fn recommended_leverage(&self) -> f64 {
        if self.is_stablecoin() {
            STABLECOIN_RECOMMENDED_LEVERAGE
        } else {
            VOLATILE_RECOMMENDED_LEVERAGE
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AssetClass {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(AssetClass::Bitcoin),
            "ethereum" | "eth" => Ok(AssetClass::Ethereum),
            "stablecoins" | "stablecoin" | "stable" => Ok(AssetClass::Stablecoins),
            "privacy" | "privacy coins" | "privacy_coins" => Ok(AssetClass::Privacy),
            _ => Err(CoreError::validation(format!("unknown asset class '{}'", s))),
        }
    }
}

/// Static per-class expectations
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnAssumption {
    /// Annual return in normal conditions, as a fraction
    pub base_return: f64,
    /// Multiple applied to the base return during a friction crisis
    pub crisis_multiplier: f64,
    /// Worst-case unleveraged loss, as a positive fraction
    pub volatility: f64,
}

pub fn default_return_assumptions() -> BTreeMap<AssetClass, ReturnAssumption> {
    BTreeMap::from([
        (AssetClass::Bitcoin, ReturnAssumption { base_return: 0.25, crisis_multiplier: 2.0, volatility: 0.60 }),
        (AssetClass::Ethereum, ReturnAssumption { base_return: 0.30, crisis_multiplier: 2.5, volatility: 0.65 }),
        (AssetClass::Stablecoins, ReturnAssumption { base_return: 0.08, crisis_multiplier: 1.2, volatility: 0.15 }),
        (AssetClass::Privacy, ReturnAssumption { base_return: 0.20, crisis_multiplier: 1.5, volatility: 0.55 }),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub weight_percent: f64,
    pub leverage: f64,
}

/// Percent weights and leverage per asset class
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioAllocation {
    positions: BTreeMap<AssetClass, Position>,
}

impl PortfolioAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, class: AssetClass, weight_percent: f64, leverage: f64) -> Self {
        self.set(class, weight_percent, leverage);
        self
    }

    pub fn set(&mut self, class: AssetClass, weight_percent: f64, leverage: f64) {
        self.positions.insert(class, Position { weight_percent, leverage });
    }

    /// 30/20/40/10 with 2x on stablecoins and 1x elsewhere
    pub fn default_allocation() -> Self {
        Self::new()
            .with(AssetClass::Bitcoin, 30.0, VOLATILE_RECOMMENDED_LEVERAGE)
            .with(AssetClass::Ethereum, 20.0, VOLATILE_RECOMMENDED_LEVERAGE)
            .with(AssetClass::Stablecoins, 40.0, STABLECOIN_RECOMMENDED_LEVERAGE)
            .with(AssetClass::Privacy, 10.0, VOLATILE_RECOMMENDED_LEVERAGE)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&AssetClass, &Position)> {
        self.positions.iter()
    }

    pub fn get(&self, class: AssetClass) -> Option<&Position> {
        self.positions.get(&class)
    }

    pub fn total_weight(&self) -> f64 {
        self.positions.values().map(|p| p.weight_percent).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// How far the figures can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Derived from hardcoded assumptions, not from market history
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub expected_return_base: f64,
    pub expected_return_crisis: f64,
    /// Negative fraction; -1.0 is a total loss
    pub max_drawdown: f64,
    /// Weight times leverage, in percent of capital
    pub effective_exposure: BTreeMap<AssetClass, f64>,
    pub gross_leverage: f64,
    pub confidence: Confidence,
}
