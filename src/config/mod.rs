//! Engine settings loaded from the environment.

use crate::detectors::chart::ChartParams;
use crate::error::ConfigError;
use crate::signals::aggregation::AggregatorConfig;
use crate::structure::StructureConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Deployment environment name (`APP_ENV`), `sandbox` when unset
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

/// Tunables for detection and aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub structure: StructureConfig,
    pub chart: ChartParams,
    pub aggregation: AggregatorConfig,
    /// Floor on accepted window length
    pub min_window: usize,
    pub parallel_detectors: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            structure: StructureConfig::default(),
            chart: ChartParams::default(),
            aggregation: AggregatorConfig::default(),
            min_window: 20,
            parallel_detectors: true,
        }
    }
}

impl EngineSettings {
    /// Defaults overridden by `STRELITZIA_*` variables, after loading `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(v) = parse(&lookup, "STRELITZIA_SWING_WIDTH")? {
            settings.structure.swing_width = v;
        }
        if let Some(v) = parse(&lookup, "STRELITZIA_EQUAL_TOLERANCE_PCT")? {
            settings.structure.equal_tolerance_pct = v;
        }
        if let Some(v) = parse(&lookup, "STRELITZIA_BREAK_TOLERANCE_PCT")? {
            settings.structure.break_tolerance_pct = v;
        }
        if let Some(v) = parse(&lookup, "STRELITZIA_NEUTRAL_BAND")? {
            settings.aggregation.neutral_band = v;
        }
        if let Some(v) = parse(&lookup, "STRELITZIA_MIN_SIGNAL_STRENGTH")? {
            settings.aggregation.min_signal_strength = v;
        }
        if let Some(v) = parse(&lookup, "STRELITZIA_MIN_WINDOW")? {
            settings.min_window = v;
        }
        if let Some(v) = parse(&lookup, "STRELITZIA_PARALLEL")? {
            settings.parallel_detectors = v;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, value: String| ConfigError::InvalidSetting {
            key: key.to_string(),
            value,
        };
        if self.structure.swing_width == 0 {
            return Err(invalid("swing_width", "0".to_string()));
        }
        for (key, value) in [
            ("equal_tolerance_pct", self.structure.equal_tolerance_pct),
            ("break_tolerance_pct", self.structure.break_tolerance_pct),
            ("tolerance_atr", self.chart.tolerance_atr),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(key, value.to_string()));
            }
        }
        self.aggregation.validate()
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidSetting {
                key: key.to_string(),
                value: raw,
            }),
    }
}
