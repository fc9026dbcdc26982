//! Confluence aggregation: signals plus structure state into one decision

use super::categories::CategoryWeights;
use super::scoring::{self, RatingThresholds};
use crate::error::ConfigError;
use crate::models::{
    Decision, Direction, Rating, Signal, SignalCategory, SignalReason, StructureState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// |net score| below this is neutral
    pub neutral_band: f64,
    pub thresholds: RatingThresholds,
    /// Signals weaker than this are ignored
    pub min_signal_strength: f64,
    /// Reasoning lines kept per category
    pub reasoning_per_category: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            neutral_band: 5.0,
            thresholds: RatingThresholds::default(),
            min_signal_strength: 0.05,
            reasoning_per_category: 3,
        }
    }
}

impl AggregatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.neutral_band.is_finite() || !(0.0..100.0).contains(&self.neutral_band) {
            return Err(ConfigError::InvalidSetting {
                key: "neutral_band".to_string(),
                value: self.neutral_band.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_signal_strength) {
            return Err(ConfigError::InvalidSetting {
                key: "min_signal_strength".to_string(),
                value: self.min_signal_strength.to_string(),
            });
        }
        self.thresholds.validate()
    }
}

/// Vote and weight of one category that fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: SignalCategory,
    /// Strength-weighted vote in -1 to +1
    pub score: f64,
    /// Weight from the profile table
    pub weight: f64,
    /// Weight after redistribution over the categories that fired
    pub effective_weight: f64,
    pub signal_count: usize,
}

impl CategoryScore {
    /// Signed share of the net score, in score points
    pub fn contribution(&self) -> f64 {
        self.score * self.effective_weight * 100.0
    }
}

/// Decision plus the numbers it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub decision: Decision,
    /// Signed score in -100 to +100
    pub net_score: f64,
    pub categories: Vec<CategoryScore>,
}

/// Aggregate signals by category into a confluence decision
#[derive(Debug, Clone)]
pub struct ConfluenceAggregator {
    weights: CategoryWeights,
    config: AggregatorConfig,
}

impl ConfluenceAggregator {
    pub fn new(weights: CategoryWeights, config: AggregatorConfig) -> Result<Self, ConfigError> {
        weights.validate("aggregator")?;
        config.validate()?;
        Ok(Self { weights, config })
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn aggregate(&self, signals: &[Signal], structure: &StructureState) -> Decision {
        self.aggregate_detailed(signals, structure).decision
    }

    /// Same inputs always give the same output: categories are visited in a
    /// fixed order and ties are broken by id.
    pub fn aggregate_detailed(&self, signals: &[Signal], structure: &StructureState) -> Aggregation {
        let eligible: Vec<&Signal> = signals
            .iter()
            .filter(|s| s.strength >= self.config.min_signal_strength)
            .filter(|s| self.weights.get(s.category).is_some())
            .collect();

        let categories = self.aggregate_by_category(&eligible);
        let net_score = Self::calculate_global_score(&categories);
        let direction = scoring::direction_for(net_score, self.config.neutral_band);
        let rating = if direction == Direction::Neutral {
            Rating::None
        } else {
            self.config.thresholds.rate(net_score.abs())
        };
        let setup_status = scoring::setup_status(rating, direction, structure);
        let reasoning = self.generate_reasons(&eligible, &categories);

        debug!(
            net_score,
            direction = %direction,
            rating = ?rating,
            setup = ?setup_status,
            categories = categories.len(),
            "ConfluenceAggregator: aggregated {} signals",
            eligible.len()
        );

        Aggregation {
            decision: Decision {
                direction,
                confluence_score: net_score.abs(),
                rating,
                setup_status,
                reasoning,
            },
            net_score,
            categories,
        }
    }

    /// Vote per category, with weights redistributed over those that fired
    pub fn aggregate_by_category(&self, signals: &[&Signal]) -> Vec<CategoryScore> {
        let mut grouped: BTreeMap<SignalCategory, Vec<&Signal>> = BTreeMap::new();
        for signal in signals {
            grouped.entry(signal.category).or_default().push(signal);
        }

        let votes: BTreeMap<SignalCategory, (f64, usize)> = grouped
            .iter()
            .filter_map(|(category, members)| {
                scoring::category_vote(members.iter().copied())
                    .map(|vote| (*category, (vote, members.len())))
            })
            .collect();

        let fired: Vec<SignalCategory> = votes.keys().copied().collect();
        let shares = self.weights.redistribute(&fired);

        shares
            .into_iter()
            .filter_map(|(category, effective_weight)| {
                let (score, signal_count) = *votes.get(&category)?;
                Some(CategoryScore {
                    category,
                    score,
                    weight: self.weights.get(category).unwrap_or(0.0),
                    effective_weight,
                    signal_count,
                })
            })
            .collect()
    }

    /// Calculate global score from category scores, bounded to -100..=100
    pub fn calculate_global_score(categories: &[CategoryScore]) -> f64 {
        categories
            .iter()
            .map(CategoryScore::contribution)
            .sum::<f64>()
            .clamp(-100.0, 100.0)
    }

    /// Top signals per category, strongest first. Categories are ordered by
    /// the size of their contribution.
    pub fn generate_reasons(
        &self,
        signals: &[&Signal],
        categories: &[CategoryScore],
    ) -> Vec<SignalReason> {
        let mut ordered: Vec<&CategoryScore> = categories.iter().collect();
        ordered.sort_by(|a, b| {
            b.contribution()
                .abs()
                .total_cmp(&a.contribution().abs())
                .then(a.category.cmp(&b.category))
        });

        let mut reasons = Vec::new();
        for category in ordered {
            let mut members: Vec<&Signal> = signals
                .iter()
                .copied()
                .filter(|s| s.category == category.category)
                .collect();
            members.sort_by(|a, b| {
                b.strength
                    .total_cmp(&a.strength)
                    .then_with(|| a.source_id.cmp(&b.source_id))
            });
            for signal in members.into_iter().take(self.config.reasoning_per_category) {
                reasons.push(SignalReason {
                    category: signal.category,
                    source_id: signal.source_id.clone(),
                    direction: signal.direction,
                    strength: signal.strength,
                    description: format!(
                        "{}: {} {} ({:.2})",
                        signal.category, signal.source_id, signal.direction, signal.strength
                    ),
                });
            }
        }
        reasons
    }
}
