//! Error types shared across the engine.

use crate::detectors::registry::AssetClass;
use thiserror::Error;

/// Errors surfaced by [`crate::AnalysisEngine::analyze`] and the window source.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid candle window: {reason}")]
    InvalidWindow { reason: String },

    #[error("data unavailable for {symbol} {timeframe}: {available} candles, {required} required")]
    DataUnavailable {
        symbol: String,
        timeframe: String,
        available: usize,
        required: usize,
    },

    #[error("no detector profile registered for {0:?}")]
    UnknownProfile(AssetClass),
}

impl AnalysisError {
    pub fn invalid_window(reason: impl Into<String>) -> Self {
        Self::InvalidWindow {
            reason: reason.into(),
        }
    }
}

/// Failure of a single detector. Contained by the registry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    #[error("computation failed: {0}")]
    Computation(String),

    #[error("malformed signal: {0}")]
    Malformed(String),
}

/// Profile and settings errors, raised at load time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("category weights for {profile} sum to {sum}, expected 1.0")]
    WeightSum { profile: String, sum: f64 },

    #[error("negative weight {weight} for category {category}")]
    NegativeWeight { category: String, weight: f64 },

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("detector {detector} emits category {category} which has no weight in profile {profile}")]
    MissingWeight {
        detector: String,
        category: String,
        profile: String,
    },

    #[error("invalid value {value:?} for setting {key}")]
    InvalidSetting { key: String, value: String },

    #[error("failed to parse weight table: {0}")]
    Json(#[from] serde_json::Error),
}
