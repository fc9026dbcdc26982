//! Analysis entry point: registry, structure tracker and aggregator wired together.

use super::aggregation::{CategoryScore, ConfluenceAggregator};
use crate::config::EngineSettings;
use crate::detectors::profiles::default_registry;
use crate::detectors::{AssetClass, DetectorFailure, DetectorRegistry};
use crate::error::{AnalysisError, ConfigError};
use crate::models::{CandleWindow, Decision, Signal, StructureState};
use crate::structure::StructureTracker;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Full output of one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub decision: Decision,
    /// Signed confluence score, -100 to +100
    pub net_score: f64,
    pub categories: Vec<CategoryScore>,
    pub structure: StructureState,
    /// Every signal that reached the aggregator, in registration order
    pub signals: Vec<Signal>,
    pub failures: Vec<DetectorFailure>,
}

/// Stateless analysis engine. Each call rebuilds structure from the window
/// it is given; nothing is carried between calls.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    registry: DetectorRegistry,
    /// Tracks structure for profiles without a structure detector
    tracker: StructureTracker,
    aggregators: HashMap<AssetClass, ConfluenceAggregator>,
    settings: EngineSettings,
}

impl AnalysisEngine {
    /// Engine with the default forex, synthetic and general profiles
    pub fn new(settings: EngineSettings) -> Result<Self, ConfigError> {
        let registry = default_registry(&settings)?;
        Self::with_registry(registry, settings)
    }

    /// Engine over a caller-built registry. Each registered profile gets an
    /// aggregator over its own weight table.
    pub fn with_registry(
        registry: DetectorRegistry,
        settings: EngineSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let mut aggregators = HashMap::new();
        for asset_class in AssetClass::ALL {
            if let Some(profile) = registry.profile(asset_class) {
                let aggregator = ConfluenceAggregator::new(
                    profile.weights().clone(),
                    settings.aggregation.clone(),
                )?;
                aggregators.insert(asset_class, aggregator);
            }
        }
        Ok(Self {
            registry,
            tracker: StructureTracker::new(settings.structure.clone()),
            aggregators,
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// Shortest window accepted for `asset_class`
    pub fn min_window(&self, asset_class: AssetClass) -> Result<usize, AnalysisError> {
        self.registry
            .profile(asset_class)
            .map(|p| p.min_window())
            .ok_or(AnalysisError::UnknownProfile(asset_class))
    }

    pub fn analyze(
        &self,
        window: &CandleWindow,
        asset_class: AssetClass,
    ) -> Result<Decision, AnalysisError> {
        self.analyze_detailed(window, asset_class)
            .map(|report| report.decision)
    }

    /// Analyze with the profile picked from the symbol name
    pub fn analyze_symbol(
        &self,
        window: &CandleWindow,
        symbol: &str,
    ) -> Result<Decision, AnalysisError> {
        self.analyze(window, AssetClass::from_symbol(symbol))
    }

    pub fn analyze_detailed(
        &self,
        window: &CandleWindow,
        asset_class: AssetClass,
    ) -> Result<AnalysisReport, AnalysisError> {
        let required = self.min_window(asset_class)?;
        if window.len() < required {
            return Err(AnalysisError::invalid_window(format!(
                "{} candles supplied, profile {} requires at least {}",
                window.len(),
                asset_class,
                required
            )));
        }
        let aggregator = self
            .aggregators
            .get(&asset_class)
            .ok_or(AnalysisError::UnknownProfile(asset_class))?;

        let mut run = self.registry.run(window, asset_class)?;
        let structure = match run.structure.take() {
            Some(state) => state,
            None => self.tracker.track(window),
        };
        let aggregation = aggregator.aggregate_detailed(&run.signals, &structure);

        debug!(
            profile = %asset_class,
            candles = window.len(),
            signals = run.signals.len(),
            failures = run.failures.len(),
            score = aggregation.net_score,
            trend = ?structure.trend_label,
            event = ?structure.last_event,
            "AnalysisEngine: analysis complete"
        );

        Ok(AnalysisReport {
            decision: aggregation.decision,
            net_score: aggregation.net_score,
            categories: aggregation.categories,
            structure,
            signals: run.signals,
            failures: run.failures,
        })
    }
}
