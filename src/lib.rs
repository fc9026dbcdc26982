//! Candle signal detection and confluence scoring.
//!
//! A read-only [`models::CandleWindow`] is run through a profile's detectors
//! (indicators, candlestick templates, chart patterns, market structure), and the
//! resulting [`models::Signal`]s are combined into a single [`models::Decision`].

pub mod common;
pub mod config;
pub mod core;
pub mod detectors;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod models;
pub mod services;
pub mod signals;
pub mod structure;

pub use error::{AnalysisError, ConfigError, DetectorError};
pub use signals::engine::AnalysisEngine;
