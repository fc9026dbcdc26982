//! Detector registry and asset-class profiles.

use super::Detector;
use crate::error::{AnalysisError, ConfigError, DetectorError};
use crate::models::{CandleWindow, Signal, StructureState};
use crate::signals::categories::CategoryWeights;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Asset class selecting a detector profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Forex,
    Synthetic,
    General,
}

const CURRENCIES: [&str; 30] = [
    "USD", "EUR", "GBP", "JPY", "CHF", "AUD", "NZD", "CAD", "SEK", "NOK", "DKK", "PLN", "HUF",
    "CZK", "TRY", "ZAR", "MXN", "SGD", "HKD", "CNH", "THB", "ILS", "RUB", "INR", "BRL", "KRW",
    "XAU", "XAG", "XPT", "XPD",
];

const SYNTHETIC_MARKERS: [&str; 7] = [
    "VOLATILITY", "BOOM", "CRASH", "JUMP", "STEP", "RANGE BREAK", "DRIFT",
];

impl AssetClass {
    pub const ALL: [AssetClass; 3] = [AssetClass::Forex, AssetClass::Synthetic, AssetClass::General];

    /// Classify a broker symbol name.
    ///
    /// Synthetic index names (`Volatility 75 Index`, `Boom 1000 Index`,
    /// `R_100`, `1HZ10V`) map to synthetic; six-letter currency pairs with an
    /// optional broker suffix (`EURUSD`, `GBPJPY.m`) map to forex.
    pub fn from_symbol(symbol: &str) -> AssetClass {
        let upper = symbol.trim().to_ascii_uppercase();
        if SYNTHETIC_MARKERS.iter().any(|m| upper.contains(m))
            || upper.starts_with("R_")
            || upper.starts_with("1HZ")
        {
            return AssetClass::Synthetic;
        }
        let letters: String = upper
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if letters.len() >= 6 {
            let (base, quote) = (&letters[..3], &letters[3..6]);
            if CURRENCIES.contains(&base) && CURRENCIES.contains(&quote) && base != quote {
                return AssetClass::Forex;
            }
        }
        AssetClass::General
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Forex => "forex",
            AssetClass::Synthetic => "synthetic",
            AssetClass::General => "general",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detector excluded from a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorFailure {
    pub detector_id: String,
    pub reason: String,
}

/// Output of one registry run
#[derive(Debug, Clone, Default)]
pub struct RegistryRun {
    pub signals: Vec<Signal>,
    pub failures: Vec<DetectorFailure>,
    /// State reported by the profile's structure detector, if it has one
    pub structure: Option<StructureState>,
}

/// Detector set and weight table for one asset class
#[derive(Clone)]
pub struct AssetProfile {
    asset_class: AssetClass,
    weights: CategoryWeights,
    detectors: Vec<Arc<dyn Detector>>,
    min_window: usize,
}

impl AssetProfile {
    /// Build a profile, validating that weights sum to 1 and that every
    /// detector's category carries a weight.
    ///
    /// `min_window` is a floor on the window length; the effective minimum is
    /// the larger of the floor and the shortest detector lookback.
    pub fn new(
        asset_class: AssetClass,
        weights: CategoryWeights,
        detectors: Vec<Arc<dyn Detector>>,
        min_window: usize,
    ) -> Result<Self, ConfigError> {
        weights.validate(asset_class.as_str())?;
        for detector in &detectors {
            if weights.get(detector.category()).is_none() {
                return Err(ConfigError::MissingWeight {
                    detector: detector.id().to_string(),
                    category: detector.category().to_string(),
                    profile: asset_class.to_string(),
                });
            }
        }
        let shortest = detectors
            .iter()
            .map(|d| d.min_lookback())
            .min()
            .unwrap_or(1);
        Ok(Self {
            asset_class,
            weights,
            detectors,
            min_window: min_window.max(shortest).max(1),
        })
    }

    pub fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    pub fn detectors(&self) -> &[Arc<dyn Detector>] {
        &self.detectors
    }

    /// Shortest window this profile accepts
    pub fn min_window(&self) -> usize {
        self.min_window
    }
}

impl fmt::Debug for AssetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.detectors.iter().map(|d| d.id()).collect();
        f.debug_struct("AssetProfile")
            .field("asset_class", &self.asset_class)
            .field("weights", &self.weights)
            .field("detectors", &ids)
            .field("min_window", &self.min_window)
            .finish()
    }
}

/// Holds one [`AssetProfile`] per asset class and runs its detectors
#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    profiles: HashMap<AssetClass, AssetProfile>,
    parallel: bool,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            parallel: true,
        }
    }

    /// Evaluate detectors on the rayon pool (default) or sequentially
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Register or replace the profile for its asset class
    pub fn register(&mut self, profile: AssetProfile) {
        debug!(
            profile = %profile.asset_class,
            detectors = profile.detectors.len(),
            "DetectorRegistry: registered profile {}",
            profile.asset_class
        );
        self.profiles.insert(profile.asset_class, profile);
    }

    pub fn profile(&self, asset_class: AssetClass) -> Option<&AssetProfile> {
        self.profiles.get(&asset_class)
    }

    /// Run every detector of the profile against `window`.
    ///
    /// A detector that errors, panics or emits a malformed signal is logged
    /// with its id and excluded; the rest of the run is unaffected. Signals
    /// keep registration order.
    pub fn run(
        &self,
        window: &CandleWindow,
        asset_class: AssetClass,
    ) -> Result<RegistryRun, AnalysisError> {
        let profile = self
            .profile(asset_class)
            .ok_or(AnalysisError::UnknownProfile(asset_class))?;

        let outcomes: Vec<Result<Evaluated, DetectorError>> = if self.parallel {
            profile
                .detectors
                .par_iter()
                .map(|d| evaluate_guarded(d.as_ref(), window))
                .collect()
        } else {
            profile
                .detectors
                .iter()
                .map(|d| evaluate_guarded(d.as_ref(), window))
                .collect()
        };

        let mut run = RegistryRun::default();
        for (detector, outcome) in profile.detectors.iter().zip(outcomes) {
            match outcome {
                Ok((signal, structure)) => {
                    run.signals.extend(signal);
                    if run.structure.is_none() {
                        run.structure = structure;
                    }
                }
                Err(e) => {
                    warn!(
                        detector = %detector.id(),
                        profile = %asset_class,
                        error = %e,
                        "DetectorRegistry: detector {} failed and was excluded: {}",
                        detector.id(),
                        e
                    );
                    run.failures.push(DetectorFailure {
                        detector_id: detector.id().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            profile = %asset_class,
            signals = run.signals.len(),
            failures = run.failures.len(),
            "DetectorRegistry: run complete"
        );
        Ok(run)
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

type Evaluated = (Option<Signal>, Option<StructureState>);

/// Evaluate one detector, turning panics and malformed output into errors
fn evaluate_guarded(
    detector: &dyn Detector,
    window: &CandleWindow,
) -> Result<Evaluated, DetectorError> {
    let (outcome, structure) =
        panic::catch_unwind(AssertUnwindSafe(|| detector.evaluate_with_state(window)))
            .map_err(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                DetectorError::Computation(format!("panicked: {}", message))
            })??;

    let Some(mut signal) = outcome else {
        return Ok((None, structure));
    };
    signal.validate()?;
    if signal.category != detector.category() {
        return Err(DetectorError::Malformed(format!(
            "emitted category {} but is registered under {}",
            signal.category,
            detector.category()
        )));
    }
    if signal.source_id != detector.id() {
        signal.source_id = detector.id().to_string();
    }
    Ok((Some(signal), structure))
}
