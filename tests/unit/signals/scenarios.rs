//! End-to-end scenarios through the engine

use crate::fixtures::*;
use std::sync::Arc;
use strelitzia::config::EngineSettings;
use strelitzia::detectors::{AssetClass, AssetProfile, Detector, DetectorRegistry};
use strelitzia::models::{
    Direction, Rating, SetupStatus, SignalCategory, StructureEvent, TrendLabel,
};
use strelitzia::signals::CategoryWeights;
use strelitzia::structure::StructureTracker;
use strelitzia::{AnalysisEngine, AnalysisError};

fn engine_with(detectors: Vec<Arc<dyn Detector>>) -> AnalysisEngine {
    let mut registry = DetectorRegistry::new();
    registry.register(
        AssetProfile::new(
            AssetClass::General,
            CategoryWeights::for_asset_class(AssetClass::General),
            detectors,
            20,
        )
        .unwrap(),
    );
    AnalysisEngine::with_registry(registry, EngineSettings::default()).unwrap()
}

fn structure_signal_strength(report: &strelitzia::signals::AnalysisReport) -> f64 {
    report
        .signals
        .iter()
        .find(|s| s.category == SignalCategory::Structure)
        .map(|s| s.strength)
        .unwrap()
}

#[test]
fn test_steady_uptrend_has_no_structure_event() {
    let engine = AnalysisEngine::new(EngineSettings::default()).unwrap();
    let report = engine
        .analyze_detailed(&window(rising(20)), AssetClass::General)
        .unwrap();
    assert_eq!(report.structure.trend_label, TrendLabel::Uptrend);
    assert_eq!(report.structure.last_event, StructureEvent::None);
    assert_ne!(report.decision.setup_status, SetupStatus::Valid);
}

#[test]
fn test_break_of_structure_confirms_bullish_setup() {
    let engine = engine_with(vec![
        Arc::new(FixedDetector::new(
            "trend.up",
            SignalCategory::Trend,
            Direction::Bullish,
            0.9,
        )),
        Arc::new(StructureTracker::default()),
    ]);
    let report = engine
        .analyze_detailed(&window(uptrend_breaking_high()), AssetClass::General)
        .unwrap();

    assert_eq!(report.structure.last_event, StructureEvent::BreakOfStructure);
    assert_eq!(report.structure.event_direction, Direction::Bullish);
    assert!((structure_signal_strength(&report) - 0.75).abs() < 1e-12);
    assert_eq!(report.decision.direction, Direction::Bullish);
    assert_eq!(report.decision.rating, Rating::Strong);
    assert_eq!(report.decision.setup_status, SetupStatus::Valid);
}

#[test]
fn test_change_of_character_turns_read_bearish() {
    let engine = engine_with(vec![Arc::new(StructureTracker::default())]);
    let report = engine
        .analyze_detailed(&window(uptrend_breaking_low()), AssetClass::General)
        .unwrap();

    assert_eq!(report.structure.last_event, StructureEvent::ChangeOfCharacter);
    assert_eq!(report.structure.event_direction, Direction::Bearish);
    assert!((structure_signal_strength(&report) - 0.9).abs() < 1e-12);
    assert_eq!(report.decision.direction, Direction::Bearish);
    assert_eq!(report.decision.setup_status, SetupStatus::Valid);
    assert_eq!(
        report.decision.reasoning[0].description,
        "structure: structure bearish (0.90)"
    );
}

#[test]
fn test_short_window_is_rejected() {
    let engine = AnalysisEngine::new(EngineSettings::default()).unwrap();
    for class in AssetClass::ALL {
        let err = engine.analyze(&window(rising(19)), class).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidWindow { .. }), "{:?}", err);
    }
}

#[test]
fn test_failing_detector_does_not_abort_analysis() {
    let engine = engine_with(vec![
        Arc::new(FixedDetector::new(
            "trend.up",
            SignalCategory::Trend,
            Direction::Bullish,
            0.8,
        )),
        Arc::new(BrokenDetector::new("momentum.broken", Fault::Error)),
        Arc::new(BrokenDetector::new("momentum.panics", Fault::Panic)),
    ]);
    let report = engine
        .analyze_detailed(&window(rising(30)), AssetClass::General)
        .unwrap();

    let failed: Vec<&str> = report
        .failures
        .iter()
        .map(|f| f.detector_id.as_str())
        .collect();
    assert_eq!(failed, vec!["momentum.broken", "momentum.panics"]);
    assert_eq!(report.decision.direction, Direction::Bullish);
    assert!(report
        .decision
        .reasoning
        .iter()
        .all(|r| r.source_id == "trend.up"));
}

#[test]
fn test_change_of_character_beats_same_candle_continuation() {
    let engine = AnalysisEngine::new(EngineSettings::default()).unwrap();
    let candles = reversal_and_continuation_on_one_close();
    assert_eq!(candles.len(), 20);
    let report = engine
        .analyze_detailed(&window(candles), AssetClass::General)
        .unwrap();

    assert_eq!(report.structure.trend_label, TrendLabel::Downtrend);
    assert_eq!(report.structure.last_event, StructureEvent::ChangeOfCharacter);
    assert_eq!(report.structure.event_direction, Direction::Bearish);
    assert_eq!(report.structure.event_index, Some(19));
}
