//! Category weight tables and redistribution

use crate::detectors::registry::AssetClass;
use crate::error::ConfigError;
use crate::models::SignalCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category weights of one profile, summing to 1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryWeights {
    weights: BTreeMap<SignalCategory, f64>,
}

impl CategoryWeights {
    /// Allowed deviation of the weight sum from 1.0
    pub const TOLERANCE: f64 = 1e-6;

    pub const GENERAL: [(SignalCategory, f64); 8] = [
        (SignalCategory::Structure, 0.20),
        (SignalCategory::Trend, 0.18),
        (SignalCategory::Momentum, 0.15),
        (SignalCategory::Volatility, 0.08),
        (SignalCategory::Volume, 0.10),
        (SignalCategory::SupportResistance, 0.12),
        (SignalCategory::Candlestick, 0.05),
        (SignalCategory::ChartPattern, 0.12),
    ];

    pub const FOREX: [(SignalCategory, f64); 8] = [
        (SignalCategory::Structure, 0.20),
        (SignalCategory::Trend, 0.18),
        (SignalCategory::Momentum, 0.14),
        (SignalCategory::Volatility, 0.08),
        (SignalCategory::Volume, 0.08),
        (SignalCategory::SupportResistance, 0.15),
        (SignalCategory::Candlestick, 0.05),
        (SignalCategory::ChartPattern, 0.12),
    ];

    pub const SYNTHETIC: [(SignalCategory, f64); 8] = [
        (SignalCategory::Structure, 0.18),
        (SignalCategory::Trend, 0.15),
        (SignalCategory::Momentum, 0.12),
        (SignalCategory::Volatility, 0.20),
        (SignalCategory::Volume, 0.05),
        (SignalCategory::SupportResistance, 0.10),
        (SignalCategory::Candlestick, 0.05),
        (SignalCategory::ChartPattern, 0.15),
    ];

    /// Validated table from `(category, weight)` pairs
    pub fn new(
        entries: impl IntoIterator<Item = (SignalCategory, f64)>,
    ) -> Result<Self, ConfigError> {
        let weights = Self {
            weights: entries.into_iter().collect(),
        };
        weights.validate("custom")?;
        Ok(weights)
    }

    /// Built-in table for an asset class
    pub fn for_asset_class(asset_class: AssetClass) -> Self {
        let table = match asset_class {
            AssetClass::General => Self::GENERAL,
            AssetClass::Forex => Self::FOREX,
            AssetClass::Synthetic => Self::SYNTHETIC,
        };
        Self {
            weights: table.into_iter().collect(),
        }
    }

    /// Parse a JSON object of `category name -> weight`
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, f64> = serde_json::from_str(json)?;
        let mut weights = BTreeMap::new();
        for (name, weight) in raw {
            let category: SignalCategory = name
                .parse()
                .map_err(|_| ConfigError::UnknownCategory(name.clone()))?;
            weights.insert(category, weight);
        }
        let weights = Self { weights };
        weights.validate("json")?;
        Ok(weights)
    }

    /// Get weight for a category, `None` when the category is not active
    pub fn get(&self, category: SignalCategory) -> Option<f64> {
        self.weights.get(&category).copied()
    }

    pub fn categories(&self) -> impl Iterator<Item = SignalCategory> + '_ {
        self.weights.keys().copied()
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Verify weights sum to 1.0
    pub fn verify(&self) -> bool {
        (self.sum() - 1.0).abs() <= Self::TOLERANCE
    }

    pub fn validate(&self, profile: &str) -> Result<(), ConfigError> {
        if let Some((category, weight)) = self
            .weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ConfigError::NegativeWeight {
                category: category.to_string(),
                weight: *weight,
            });
        }
        if !self.verify() {
            return Err(ConfigError::WeightSum {
                profile: profile.to_string(),
                sum: self.sum(),
            });
        }
        Ok(())
    }

    /// Weights restricted to the `fired` categories, rescaled to sum to 1.0.
    ///
    /// Empty categories give up their weight proportionally to the ones that
    /// fired. Categories without a weight entry are ignored. Returns an empty
    /// map when no fired category carries weight.
    pub fn redistribute(&self, fired: &[SignalCategory]) -> BTreeMap<SignalCategory, f64> {
        let active: BTreeMap<SignalCategory, f64> = fired
            .iter()
            .filter_map(|c| self.get(*c).map(|w| (*c, w)))
            .filter(|(_, w)| *w > 0.0)
            .collect();
        let total: f64 = active.values().sum();
        if total <= 0.0 {
            return BTreeMap::new();
        }
        active.into_iter().map(|(c, w)| (c, w / total)).collect()
    }
}
