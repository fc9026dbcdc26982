//! Signals emitted by detectors.

use crate::error::DetectorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category a signal is grouped under for confluence weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Trend,
    Momentum,
    Volatility,
    Volume,
    SupportResistance,
    Candlestick,
    ChartPattern,
    Structure,
}

impl SignalCategory {
    pub const ALL: [SignalCategory; 8] = [
        SignalCategory::Trend,
        SignalCategory::Momentum,
        SignalCategory::Volatility,
        SignalCategory::Volume,
        SignalCategory::SupportResistance,
        SignalCategory::Candlestick,
        SignalCategory::ChartPattern,
        SignalCategory::Structure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Trend => "trend",
            SignalCategory::Momentum => "momentum",
            SignalCategory::Volatility => "volatility",
            SignalCategory::Volume => "volume",
            SignalCategory::SupportResistance => "support_resistance",
            SignalCategory::Candlestick => "candlestick",
            SignalCategory::ChartPattern => "chart_pattern",
            SignalCategory::Structure => "structure",
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown signal category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// +1 bullish, -1 bearish, 0 neutral
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Bullish => 1.0,
            Direction::Bearish => -1.0,
            Direction::Neutral => 0.0,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
            Direction::Neutral => Direction::Neutral,
        }
    }

    pub fn from_sign(value: f64) -> Direction {
        if value > 0.0 {
            Direction::Bullish
        } else if value < 0.0 {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// A single detector's verdict on a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub source_id: String,
    pub category: SignalCategory,
    pub direction: Direction,
    /// Confidence in [0, 1]
    pub strength: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub evidence: BTreeMap<String, f64>,
}

impl Signal {
    pub fn new(
        source_id: impl Into<String>,
        category: SignalCategory,
        direction: Direction,
        strength: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            category,
            direction,
            strength,
            evidence: BTreeMap::new(),
        }
    }

    pub fn with_evidence(mut self, key: impl Into<String>, value: f64) -> Self {
        self.evidence.insert(key.into(), value);
        self
    }

    /// Signed contribution used in category votes
    pub fn signed_strength(&self) -> f64 {
        self.strength * self.direction.sign()
    }

    /// Reject signals that would poison aggregation
    pub fn validate(&self) -> Result<(), DetectorError> {
        if !self.strength.is_finite() || !(0.0..=1.0).contains(&self.strength) {
            return Err(DetectorError::Malformed(format!(
                "strength {} outside [0, 1]",
                self.strength
            )));
        }
        if let Some((key, _)) = self.evidence.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DetectorError::Malformed(format!(
                "evidence {} is not finite",
                key
            )));
        }
        Ok(())
    }
}
