//! The aggregated decision record.

use super::signal::{Direction, SignalCategory};
use serde::{Deserialize, Serialize};

/// Confluence strength; ordering follows conviction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    None,
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStatus {
    Valid,
    Forming,
    NoSetup,
}

/// One line of the explainability trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReason {
    pub category: SignalCategory,
    pub source_id: String,
    pub direction: Direction,
    pub strength: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub direction: Direction,
    /// Magnitude of the net confluence score, 0-100
    pub confluence_score: f64,
    pub rating: Rating,
    pub setup_status: SetupStatus,
    pub reasoning: Vec<SignalReason>,
}

impl Decision {
    /// Decision for a window where nothing fired
    pub fn neutral() -> Self {
        Self {
            direction: Direction::Neutral,
            confluence_score: 0.0,
            rating: Rating::None,
            setup_status: SetupStatus::NoSetup,
            reasoning: Vec::new(),
        }
    }

    /// Signed score in [-100, 100]
    pub fn signed_score(&self) -> f64 {
        self.confluence_score * self.direction.sign()
    }
}
