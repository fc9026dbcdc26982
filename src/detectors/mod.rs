//! Detector contract and the detector families.
//!
//! A detector is a pure function of a [`CandleWindow`]: it either emits one
//! [`Signal`] or nothing. Detectors fail closed, returning `Ok(None)` when the
//! window is shorter than their lookback.

pub mod asset;
pub mod candlestick;
pub mod chart;
pub mod indicator;
pub mod profiles;
pub mod registry;
pub mod smart_money;

pub use candlestick::{candlestick_templates, CandlestickDetector, PatternTemplate};
pub use chart::{ChartParams, ChartPatternDetector, ChartTemplate};
pub use indicator::{IndicatorDetector, IndicatorRule};
pub use registry::{AssetClass, AssetProfile, DetectorFailure, DetectorRegistry, RegistryRun};

use crate::error::DetectorError;
use crate::models::{CandleWindow, Signal, SignalCategory, StructureState};
use serde::{Deserialize, Serialize};

/// Detector family tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Indicator,
    CandlestickPattern,
    ChartPattern,
    Structure,
}

/// Trait implemented by every detector the registry can run
pub trait Detector: Send + Sync {
    /// Stable identifier, used as `Signal::source_id` and in failure logs
    fn id(&self) -> &str;

    fn kind(&self) -> DetectorKind;

    /// Category of every signal this detector emits
    fn category(&self) -> SignalCategory;

    /// Minimum number of candles needed to produce a signal
    fn min_lookback(&self) -> usize;

    fn evaluate(&self, window: &CandleWindow) -> Result<Option<Signal>, DetectorError>;

    /// [`Detector::evaluate`] plus the market-structure state the signal was
    /// read from. Only structure detectors report a state; the engine takes
    /// the window's structure from the first one in the profile.
    fn evaluate_with_state(
        &self,
        window: &CandleWindow,
    ) -> Result<(Option<Signal>, Option<StructureState>), DetectorError> {
        Ok((self.evaluate(window)?, None))
    }
}
