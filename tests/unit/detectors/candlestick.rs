//! Unit tests for candlestick pattern templates

use crate::fixtures::{falling, rising, ts, window};
use strelitzia::detectors::{candlestick_templates, CandlestickDetector, Detector, DetectorKind};
use strelitzia::models::{Candle, Direction, SignalCategory};

fn detector(name: &str) -> CandlestickDetector {
    let template = candlestick_templates()
        .into_iter()
        .find(|t| t.name == name)
        .unwrap();
    CandlestickDetector::new(template)
}

/// Falling context followed by a long-lower-wick candle
fn hammer_after_decline() -> Vec<Candle> {
    let mut candles = falling(8);
    let prev = candles.last().unwrap().close;
    candles.push(Candle::new(prev - 0.5, prev - 0.25, prev - 2.5, prev - 0.3, 1_500.0, ts(8)));
    candles
}

#[test]
fn test_template_table_is_complete() {
    let names: Vec<String> = candlestick_templates().into_iter().map(|t| t.name).collect();
    assert_eq!(names.len(), 22);
    for expected in [
        "doji",
        "hammer",
        "hanging_man",
        "shooting_star",
        "bullish_engulfing",
        "bearish_engulfing",
        "morning_star",
        "evening_star",
        "three_white_soldiers",
        "three_black_crows",
        "tweezer_bottom",
        "tweezer_top",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
}

#[test]
fn test_hammer_after_decline() {
    let w = window(hammer_after_decline());
    let signal = detector("hammer").evaluate(&w).unwrap().unwrap();
    assert_eq!(signal.direction, Direction::Bullish);
    assert_eq!(signal.category, SignalCategory::Candlestick);
    assert_eq!(signal.source_id, "candlestick.hammer");
    assert!(signal.strength > 0.35 && signal.strength <= 0.7);
}

#[test]
fn test_same_shape_after_advance_is_not_a_hammer() {
    let w = window(hammer_after_decline());
    assert!(detector("hanging_man").evaluate(&w).unwrap().is_none());

    let mut candles = rising(8);
    let prev = candles.last().unwrap().close;
    candles.push(Candle::new(prev + 0.5, prev + 0.75, prev - 1.5, prev + 0.7, 1_500.0, ts(8)));
    let w = window(candles);
    assert!(detector("hammer").evaluate(&w).unwrap().is_none());
    let hanging = detector("hanging_man").evaluate(&w).unwrap().unwrap();
    assert_eq!(hanging.direction, Direction::Bearish);
}

#[test]
fn test_bullish_engulfing() {
    let candles = vec![
        Candle::new(100.0, 100.2, 98.8, 99.0, 1_000.0, ts(0)),
        Candle::new(98.9, 100.6, 98.8, 100.5, 2_000.0, ts(1)),
    ];
    let w = window(candles);
    let signal = detector("bullish_engulfing").evaluate(&w).unwrap().unwrap();
    assert_eq!(signal.direction, Direction::Bullish);
    assert!(signal.strength > 0.4 && signal.strength <= 0.8);
    assert!(detector("bearish_engulfing").evaluate(&w).unwrap().is_none());
}

#[test]
fn test_strength_tracks_closeness() {
    let w = window(hammer_after_decline());
    let signal = detector("hammer").evaluate(&w).unwrap().unwrap();
    let closeness = signal.evidence["closeness"];
    assert!((signal.strength - 0.7 * (0.5 + 0.5 * closeness)).abs() < 1e-12);
}

#[test]
fn test_short_window_fails_closed() {
    let w = window(falling(3));
    assert!(detector("hammer").evaluate(&w).unwrap().is_none());
    assert_eq!(detector("hammer").kind(), DetectorKind::CandlestickPattern);
}
