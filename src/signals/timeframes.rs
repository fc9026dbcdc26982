//! Merge decisions taken on several timeframes of the same symbol.

use super::aggregation::AggregatorConfig;
use super::scoring;
use crate::models::{Decision, Direction, Rating};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
    MN1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::MN1,
    ];

    /// Higher timeframes carry more weight in the merge
    pub fn weight(&self) -> f64 {
        match self {
            Timeframe::M1 => 0.6,
            Timeframe::M5 => 0.7,
            Timeframe::M15 => 0.8,
            Timeframe::M30 => 0.85,
            Timeframe::H1 => 0.9,
            Timeframe::H4 => 1.0,
            Timeframe::D1 => 1.1,
            Timeframe::W1 => 1.2,
            Timeframe::MN1 => 1.3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    /// Accepts `M15`, `m15`, `15m`, `1h`, `4h`, `1d`, `1w`, `1M` and the like
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let tf = match trimmed {
            "1m" | "M1" | "m1" => Timeframe::M1,
            "5m" | "M5" | "m5" => Timeframe::M5,
            "15m" | "M15" | "m15" => Timeframe::M15,
            "30m" | "M30" | "m30" => Timeframe::M30,
            "1h" | "H1" | "h1" => Timeframe::H1,
            "4h" | "H4" | "h4" => Timeframe::H4,
            "1d" | "D1" | "d1" => Timeframe::D1,
            "1w" | "W1" | "w1" => Timeframe::W1,
            "1M" | "MN1" | "mn1" => Timeframe::MN1,
            _ => return Err(format!("unknown timeframe: {}", trimmed)),
        };
        Ok(tf)
    }
}

/// Merged view across timeframes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeConfluence {
    pub direction: Direction,
    /// Weight-normalized signed score, -100 to +100
    pub net_score: f64,
    pub confluence_score: f64,
    pub rating: Rating,
    /// How far the timeframes agree with the merged direction, 0-100
    pub alignment_pct: f64,
    pub timeframes: Vec<Timeframe>,
}

/// Merge per-timeframe decisions. Returns `None` for an empty input.
///
/// A timeframe that agrees with the merged direction counts fully toward
/// alignment; one that disagrees counts half.
pub fn merge_timeframes(
    decisions: &[(Timeframe, Decision)],
    config: &AggregatorConfig,
) -> Option<TimeframeConfluence> {
    if decisions.is_empty() {
        return None;
    }

    let total_weight: f64 = decisions.iter().map(|(tf, _)| tf.weight()).sum();
    let weighted: f64 = decisions
        .iter()
        .map(|(tf, d)| tf.weight() * d.signed_score())
        .sum();
    let net_score = (weighted / total_weight).clamp(-100.0, 100.0);

    let direction = scoring::direction_for(net_score, config.neutral_band);
    let rating = if direction == Direction::Neutral {
        Rating::None
    } else {
        config.thresholds.rate(net_score.abs())
    };

    let agreement: f64 = decisions
        .iter()
        .map(|(_, d)| if d.direction == direction { 1.0 } else { 0.5 })
        .sum();
    let alignment_pct = agreement / decisions.len() as f64 * 100.0;

    Some(TimeframeConfluence {
        direction,
        net_score,
        confluence_score: net_score.abs(),
        rating,
        alignment_pct,
        timeframes: decisions.iter().map(|(tf, _)| *tf).collect(),
    })
}
