//! Unit tests for the analysis engine

use crate::fixtures::*;
use std::sync::Arc;
use strelitzia::config::EngineSettings;
use strelitzia::detectors::{AssetClass, AssetProfile, Detector, DetectorRegistry};
use strelitzia::models::{Direction, Rating, SignalCategory, TrendLabel};
use strelitzia::signals::CategoryWeights;
use strelitzia::structure::{StructureConfig, StructureTracker};
use strelitzia::{AnalysisEngine, AnalysisError};

fn engine() -> AnalysisEngine {
    AnalysisEngine::new(EngineSettings::default()).unwrap()
}

#[test]
fn test_default_engine_on_rising_market() {
    let engine = engine();
    let w = window(rising(60));
    let report = engine.analyze_detailed(&w, AssetClass::General).unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.structure.trend_label, TrendLabel::Uptrend);
    let structure = report
        .signals
        .iter()
        .find(|s| s.source_id == "structure")
        .unwrap();
    assert_eq!(structure.direction, Direction::Bullish);

    let total: f64 = report.categories.iter().map(|c| c.effective_weight).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!((report.decision.confluence_score - report.net_score.abs()).abs() < 1e-9);
    assert!((-100.0..=100.0).contains(&report.net_score));
    assert!(!report.decision.reasoning.is_empty());
    assert_eq!(report.decision, engine.analyze(&w, AssetClass::General).unwrap());
}

#[test]
fn test_repeated_calls_are_identical() {
    let engine = engine();
    let w = window(uptrend_breaking_low());
    let first = engine.analyze_detailed(&w, AssetClass::Synthetic).unwrap();
    let second = engine.analyze_detailed(&w, AssetClass::Synthetic).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_sequential_and_parallel_agree() {
    let w = window(uptrend_breaking_high());
    let parallel = engine().analyze_detailed(&w, AssetClass::Forex).unwrap();
    let sequential = AnalysisEngine::new(EngineSettings {
        parallel_detectors: false,
        ..EngineSettings::default()
    })
    .unwrap()
    .analyze_detailed(&w, AssetClass::Forex)
    .unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_symbol_selects_profile() {
    let engine = engine();
    let w = window(rising(60));
    assert_eq!(
        engine.analyze_symbol(&w, "EURUSD").unwrap(),
        engine.analyze(&w, AssetClass::Forex).unwrap()
    );
    assert_eq!(
        engine.analyze_symbol(&w, "Volatility 75 Index").unwrap(),
        engine.analyze(&w, AssetClass::Synthetic).unwrap()
    );
}

#[test]
fn test_short_window_rejected_before_detection() {
    let engine = engine();
    assert_eq!(engine.min_window(AssetClass::General).unwrap(), 20);
    let err = engine
        .analyze(&window(rising(19)), AssetClass::General)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidWindow { .. }));
    assert!(engine.analyze(&window(rising(20)), AssetClass::General).is_ok());
}

#[test]
fn test_min_window_setting_raises_floor() {
    let engine = AnalysisEngine::new(EngineSettings {
        min_window: 30,
        ..EngineSettings::default()
    })
    .unwrap();
    assert_eq!(engine.min_window(AssetClass::Forex).unwrap(), 30);
    assert!(engine.analyze(&window(rising(25)), AssetClass::Forex).is_err());
}

#[test]
fn test_custom_registry_drives_decision() {
    let detectors: Vec<Arc<dyn Detector>> = vec![
        Arc::new(FixedDetector::new(
            "trend.up",
            SignalCategory::Trend,
            Direction::Bullish,
            0.9,
        )),
        Arc::new(FixedDetector::new(
            "momentum.up",
            SignalCategory::Momentum,
            Direction::Bullish,
            0.7,
        )),
    ];
    let mut registry = DetectorRegistry::new();
    registry.register(
        AssetProfile::new(
            AssetClass::General,
            CategoryWeights::for_asset_class(AssetClass::General),
            detectors,
            1,
        )
        .unwrap(),
    );
    let engine = AnalysisEngine::with_registry(registry, EngineSettings::default()).unwrap();

    let report = engine
        .analyze_detailed(&window(rising(10)), AssetClass::General)
        .unwrap();
    assert_eq!(report.signals.len(), 2);
    assert_eq!(report.decision.direction, Direction::Bullish);
    assert_eq!(report.decision.rating, Rating::Strong);
    assert!((report.net_score - 100.0).abs() < 1e-9);

    assert!(matches!(
        engine.analyze(&window(rising(10)), AssetClass::Forex),
        Err(AnalysisError::UnknownProfile(AssetClass::Forex))
    ));
}

/// Short legs: swings of width 3 exist, swings of width 8 do not
fn stair_step() -> Vec<strelitzia::models::Candle> {
    candles_from_closes(&legs(
        &[100.0, 106.0, 103.0, 109.0, 106.0, 112.0, 109.0, 115.0, 112.0, 118.0],
        1.0,
    ))
}

#[test]
fn test_structure_state_comes_from_profile_tracker() {
    let wide = StructureTracker::new(StructureConfig {
        swing_width: 8,
        ..StructureConfig::default()
    });
    let mut registry = DetectorRegistry::new();
    registry.register(
        AssetProfile::new(
            AssetClass::General,
            CategoryWeights::for_asset_class(AssetClass::General),
            vec![Arc::new(wide.clone())],
            1,
        )
        .unwrap(),
    );
    let engine = AnalysisEngine::with_registry(registry, EngineSettings::default()).unwrap();
    let w = window(stair_step());
    let report = engine.analyze_detailed(&w, AssetClass::General).unwrap();

    assert_eq!(report.structure, wide.track(&w));
    assert_ne!(report.structure, StructureTracker::default().track(&w));
    assert!(report.structure.last_swing_sequence.is_empty());

    let signal = report
        .signals
        .iter()
        .find(|s| s.source_id == "structure")
        .unwrap();
    assert_eq!(signal.evidence["swings"], 0.0);
    assert!(!signal.evidence.contains_key("event_index"));
}

#[test]
fn test_profile_without_tracker_uses_engine_settings() {
    let mut registry = DetectorRegistry::new();
    registry.register(
        AssetProfile::new(
            AssetClass::General,
            CategoryWeights::for_asset_class(AssetClass::General),
            vec![Arc::new(FixedDetector::new(
                "trend.up",
                SignalCategory::Trend,
                Direction::Bullish,
                0.9,
            ))],
            1,
        )
        .unwrap(),
    );
    let settings = EngineSettings::default();
    let tracker = StructureTracker::new(settings.structure.clone());
    let engine = AnalysisEngine::with_registry(registry, settings).unwrap();
    let w = window(stair_step());
    let report = engine.analyze_detailed(&w, AssetClass::General).unwrap();
    assert_eq!(report.structure, tracker.track(&w));
}

#[test]
fn test_report_serializes() {
    let report = engine()
        .analyze_detailed(&window(rising(40)), AssetClass::General)
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["decision"]["direction"].is_string());
    assert!(json["structure"]["trend_label"].is_string());
    assert!(json["categories"].is_array());
}
