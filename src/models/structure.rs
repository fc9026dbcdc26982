//! Market structure state: swing points, trend label and structural events.

use super::signal::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed local extremum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Uptrend,
    Downtrend,
    Ranging,
    /// Too little history to classify
    Undefined,
}

impl TrendLabel {
    pub fn direction(&self) -> Direction {
        match self {
            TrendLabel::Uptrend => Direction::Bullish,
            TrendLabel::Downtrend => Direction::Bearish,
            TrendLabel::Ranging | TrendLabel::Undefined => Direction::Neutral,
        }
    }

    pub fn is_directional(&self) -> bool {
        matches!(self, TrendLabel::Uptrend | TrendLabel::Downtrend)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureEvent {
    None,
    /// Continuation break in the direction of the established trend
    BreakOfStructure,
    /// First break against the established trend
    ChangeOfCharacter,
}

/// Snapshot of the structure tracker after the final candle of a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureState {
    pub last_swing_sequence: Vec<SwingPoint>,
    pub trend_label: TrendLabel,
    pub last_event: StructureEvent,
    /// Direction of `last_event`; neutral when there is none
    pub event_direction: Direction,
    /// Candle index at which `last_event` fired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_index: Option<usize>,
}

impl StructureState {
    pub fn empty() -> Self {
        Self {
            last_swing_sequence: Vec::new(),
            trend_label: TrendLabel::Undefined,
            last_event: StructureEvent::None,
            event_direction: Direction::Neutral,
            event_index: None,
        }
    }

    /// True when a BOS or CHOCH points in `direction`
    pub fn confirms(&self, direction: Direction) -> bool {
        self.last_event != StructureEvent::None
            && direction != Direction::Neutral
            && self.event_direction == direction
    }
}

impl Default for StructureState {
    fn default() -> Self {
        Self::empty()
    }
}
