//! Unit tests for candle windows and decision serialization

use crate::fixtures::{candles_from_closes, rising, ts};
use strelitzia::models::{
    Candle, CandleWindow, Decision, Direction, Rating, SetupStatus, SignalCategory, SignalReason,
};
use strelitzia::AnalysisError;

#[test]
fn test_window_accepts_valid_series() {
    let window = CandleWindow::new(rising(10)).unwrap();
    assert_eq!(window.len(), 10);
    assert_eq!(window.last().close, 109.0);
    assert_eq!(window.tail(3).len(), 3);
    assert_eq!(window.tail(50).len(), 10);
}

#[test]
fn test_empty_window_is_invalid() {
    assert!(matches!(
        CandleWindow::new(Vec::new()),
        Err(AnalysisError::InvalidWindow { .. })
    ));
}

#[test]
fn test_push_checks_only_the_new_candle() {
    let mut window = CandleWindow::new(rising(3)).unwrap();
    window
        .push(Candle::new(102.0, 103.2, 101.9, 103.0, 10.0, ts(3)))
        .unwrap();
    assert_eq!(window.len(), 4);

    let malformed = Candle::new(103.0, 104.0, 103.5, 103.8, 10.0, ts(4));
    assert!(matches!(
        window.push(malformed),
        Err(AnalysisError::InvalidWindow { .. })
    ));
    let stale = Candle::new(103.0, 104.0, 102.9, 103.8, 10.0, ts(3));
    assert!(window.push(stale).is_err());
    assert_eq!(window.len(), 4);
    assert_eq!(window.last().close, 103.0);
}

#[test]
fn test_keep_last_drops_oldest() {
    let mut window = CandleWindow::new(rising(10)).unwrap();
    window.keep_last(4);
    assert_eq!(window.closes(), vec![106.0, 107.0, 108.0, 109.0]);
    window.keep_last(0);
    assert_eq!(window.len(), 1);
}

#[test]
fn test_low_above_open_is_invalid() {
    let candles = vec![Candle::new(100.0, 102.0, 100.5, 101.0, 10.0, ts(0))];
    assert!(CandleWindow::new(candles).is_err());
}

#[test]
fn test_negative_volume_is_invalid() {
    let candles = vec![Candle::new(100.0, 102.0, 99.0, 101.0, -1.0, ts(0))];
    assert!(CandleWindow::new(candles).is_err());
}

#[test]
fn test_non_finite_price_is_invalid() {
    let candles = vec![Candle::new(100.0, f64::NAN, 99.0, 101.0, 1.0, ts(0))];
    assert!(CandleWindow::new(candles).is_err());
}

#[test]
fn test_out_of_order_timestamps_are_invalid() {
    let mut candles = candles_from_closes(&[100.0, 101.0, 102.0]);
    candles.swap(1, 2);
    let err = CandleWindow::new(candles).unwrap_err();
    assert!(err.to_string().contains("strictly increasing"));
}

#[test]
fn test_window_deserialization_validates() {
    let good = serde_json::json!({ "candles": candles_from_closes(&[100.0, 101.0]) });
    assert!(serde_json::from_value::<CandleWindow>(good).is_ok());

    let mut candles = candles_from_closes(&[100.0, 101.0]);
    candles[1].timestamp = candles[0].timestamp;
    let bad = serde_json::json!({ "candles": candles });
    assert!(serde_json::from_value::<CandleWindow>(bad).is_err());
}

#[test]
fn test_decision_serializes_to_flat_record() {
    let decision = Decision {
        direction: Direction::Bullish,
        confluence_score: 42.5,
        rating: Rating::Moderate,
        setup_status: SetupStatus::NoSetup,
        reasoning: vec![SignalReason {
            category: SignalCategory::SupportResistance,
            source_id: "support_resistance".to_string(),
            direction: Direction::Bullish,
            strength: 0.6,
            description: "support_resistance: support_resistance bullish (0.60)".to_string(),
        }],
    };
    let value = serde_json::to_value(&decision).unwrap();
    assert_eq!(value["direction"], "bullish");
    assert_eq!(value["rating"], "moderate");
    assert_eq!(value["setup_status"], "no_setup");
    assert_eq!(value["confluence_score"], 42.5);
    assert_eq!(value["reasoning"][0]["category"], "support_resistance");

    let back: Decision = serde_json::from_value(value).unwrap();
    assert_eq!(back, decision);
}

#[test]
fn test_rating_order_follows_conviction() {
    assert!(Rating::Strong > Rating::Moderate);
    assert!(Rating::Moderate > Rating::Weak);
    assert!(Rating::Weak > Rating::None);
}
