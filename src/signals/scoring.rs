//! Score normalization, rating thresholds and setup classification

use crate::error::ConfigError;
use crate::models::{Direction, Rating, SetupStatus, Signal, StructureState};
use serde::{Deserialize, Serialize};

/// Clip to the -1 to +1 range, mapping NaN to 0
pub fn clip_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Strength-weighted vote of one category's signals, in -1 to +1
///
/// score = Σ(strength · sign) / Σ(strength). Neutral signals add to the
/// denominator only, diluting the vote. `None` when the strengths sum to 0.
pub fn category_vote<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Option<f64> {
    let (signed, total) = signals
        .into_iter()
        .fold((0.0, 0.0), |(signed, total), s| {
            (signed + s.signed_strength(), total + s.strength)
        });
    (total > 0.0).then(|| clip_unit(signed / total))
}

/// Direction of a net score with a symmetric neutral band
pub fn direction_for(net_score: f64, neutral_band: f64) -> Direction {
    if net_score.abs() < neutral_band {
        Direction::Neutral
    } else {
        Direction::from_sign(net_score)
    }
}

/// Monotonic thresholds on |net score|
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingThresholds {
    pub strong: f64,
    pub moderate: f64,
    pub weak: f64,
}

impl Default for RatingThresholds {
    fn default() -> Self {
        Self {
            strong: 60.0,
            moderate: 35.0,
            weak: 15.0,
        }
    }
}

impl RatingThresholds {
    pub fn rate(&self, magnitude: f64) -> Rating {
        if magnitude >= self.strong {
            Rating::Strong
        } else if magnitude >= self.moderate {
            Rating::Moderate
        } else if magnitude >= self.weak {
            Rating::Weak
        } else {
            Rating::None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 0.0 < self.weak
            && self.weak < self.moderate
            && self.moderate < self.strong
            && self.strong <= 100.0;
        if ordered {
            Ok(())
        } else {
            Err(ConfigError::InvalidSetting {
                key: "rating_thresholds".to_string(),
                value: format!("{:?}", self),
            })
        }
    }
}

/// `valid` needs a moderate rating and a structure event agreeing with the
/// direction; `forming` needs at least a weak rating.
pub fn setup_status(rating: Rating, direction: Direction, structure: &StructureState) -> SetupStatus {
    if rating >= Rating::Moderate && structure.confirms(direction) {
        SetupStatus::Valid
    } else if rating >= Rating::Weak && direction != Direction::Neutral {
        SetupStatus::Forming
    } else {
        SetupStatus::NoSetup
    }
}
