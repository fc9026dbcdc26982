//! Unit tests for the structure tracker

use crate::fixtures::*;
use strelitzia::detectors::Detector;
use strelitzia::models::{Direction, StructureEvent, SwingKind, SwingPoint, TrendLabel};
use strelitzia::structure::{extract_swings, StructureConfig, StructureTracker};

fn assert_swings(points: &[SwingPoint], expected: &[(SwingKind, usize, f64)]) {
    assert_eq!(points.len(), expected.len(), "swings: {:?}", points);
    for (point, &(kind, index, price)) in points.iter().zip(expected) {
        assert_eq!(point.kind, kind);
        assert_eq!(point.index, index);
        assert!((point.price - price).abs() < 1e-9, "{} != {}", point.price, price);
    }
}

fn assert_alternating(points: &[SwingPoint]) {
    for pair in points.windows(2) {
        assert_ne!(pair[0].kind, pair[1].kind, "adjacent swings share a kind: {:?}", pair);
    }
}

#[test]
fn test_steady_rise_labels_uptrend_without_event() {
    let state = StructureTracker::default().track(&window(rising(20)));
    assert_eq!(state.trend_label, TrendLabel::Uptrend);
    assert_eq!(state.last_event, StructureEvent::None);
    assert_eq!(state.event_direction, Direction::Neutral);
    assert!(state.last_swing_sequence.is_empty());
}

#[test]
fn test_steady_fall_labels_downtrend() {
    let state = StructureTracker::default().track(&window(falling(40)));
    assert_eq!(state.trend_label, TrendLabel::Downtrend);
    assert_eq!(state.last_event, StructureEvent::None);
}

#[test]
fn test_close_above_last_high_is_bullish_bos() {
    let state = StructureTracker::default().track(&window(uptrend_breaking_high()));
    assert_eq!(state.trend_label, TrendLabel::Uptrend);
    assert_eq!(state.last_event, StructureEvent::BreakOfStructure);
    assert_eq!(state.event_direction, Direction::Bullish);
    assert_eq!(state.event_index, Some(36));
    assert_swings(
        &state.last_swing_sequence,
        &[
            (SwingKind::High, 11, 110.1),
            (SwingKind::Low, 16, 104.9),
            (SwingKind::High, 26, 115.1),
            (SwingKind::Low, 31, 109.9),
        ],
    );
}

#[test]
fn test_close_below_last_low_in_uptrend_is_bearish_choch() {
    let state = StructureTracker::default().track(&window(uptrend_breaking_low()));
    assert_eq!(state.trend_label, TrendLabel::Uptrend);
    assert_eq!(state.last_event, StructureEvent::ChangeOfCharacter);
    assert_eq!(state.event_direction, Direction::Bearish);
    assert_eq!(state.event_index, Some(51));
}

#[test]
fn test_mirrored_downtrend_events() {
    let tracker = StructureTracker::default();

    let bos = tracker.track(&window(candles_from_closes(&legs(
        &[150.0, 140.0, 145.0, 135.0, 140.0, 129.0],
        1.0,
    ))));
    assert_eq!(bos.trend_label, TrendLabel::Downtrend);
    assert_eq!(bos.last_event, StructureEvent::BreakOfStructure);
    assert_eq!(bos.event_direction, Direction::Bearish);

    let choch = tracker.track(&window(candles_from_closes(&legs(
        &[150.0, 140.0, 145.0, 135.0, 140.0, 130.0, 142.0],
        1.0,
    ))));
    assert_eq!(choch.last_event, StructureEvent::ChangeOfCharacter);
    assert_eq!(choch.event_direction, Direction::Bullish);
    assert_eq!(choch.event_index, Some(51));
}

#[test]
fn test_choch_wins_when_one_close_reverses_and_continues() {
    let candles = reversal_and_continuation_on_one_close();
    let tracker = StructureTracker::default();

    let before = tracker.track_candles(&candles[..19]);
    assert_eq!(before.trend_label, TrendLabel::Uptrend);
    assert_eq!(before.last_event, StructureEvent::None);

    let state = tracker.track(&window(candles));
    assert_eq!(state.trend_label, TrendLabel::Downtrend);
    assert_eq!(state.last_event, StructureEvent::ChangeOfCharacter);
    assert_eq!(state.event_direction, Direction::Bearish);
    assert_eq!(state.event_index, Some(19));
    assert_swings(
        &state.last_swing_sequence,
        &[
            (SwingKind::Low, 4, 97.0),
            (SwingKind::High, 8, 105.0),
            (SwingKind::Low, 12, 96.0),
            (SwingKind::High, 16, 104.0),
        ],
    );
}

#[test]
fn test_ranging_clears_last_event() {
    let closes = legs(&[100.0, 110.0, 105.0, 115.0, 110.0, 120.0, 104.0, 112.0], 1.0);
    let tracker = StructureTracker::default();
    let state = tracker.track(&window(candles_from_closes(&closes)));
    assert_eq!(state.trend_label, TrendLabel::Ranging);
    assert_eq!(state.last_event, StructureEvent::None);
    assert_eq!(state.event_index, None);
    assert!(tracker.signal_for("structure", &state).is_none());
}

#[test]
fn test_tracking_is_idempotent() {
    let tracker = StructureTracker::default();
    let w = window(uptrend_breaking_low());
    assert_eq!(tracker.track(&w), tracker.track(&w));
}

#[test]
fn test_swing_sequence_alternates() {
    let closes = legs(
        &[100.0, 104.0, 103.0, 108.0, 107.5, 112.0, 101.0, 106.0, 99.0, 110.0],
        0.5,
    );
    let candles = candles_from_closes(&closes);
    let state = StructureTracker::default().track(&window(candles.clone()));
    assert_alternating(&state.last_swing_sequence);
    assert_alternating(&extract_swings(&candles, 3, 0.0005));
}

#[test]
fn test_swing_needs_width_candles_after_it() {
    let closes = legs(&[100.0, 110.0, 100.0], 1.0);
    let candles = candles_from_closes(&closes);
    let tracker = StructureTracker::default();
    // the peak sits at index 10 and is confirmed at index 13
    let unconfirmed = tracker.track_candles(&candles[..13]);
    assert!(unconfirmed
        .last_swing_sequence
        .iter()
        .all(|p| p.kind != SwingKind::High));
    let confirmed = tracker.track_candles(&candles[..14]);
    assert!(confirmed
        .last_swing_sequence
        .iter()
        .any(|p| p.kind == SwingKind::High && p.index == 10));
}

#[test]
fn test_signal_strengths() {
    let tracker = StructureTracker::default();

    let choch = tracker.evaluate(&window(uptrend_breaking_low())).unwrap().unwrap();
    assert_eq!(choch.direction, Direction::Bearish);
    assert!((choch.strength - 0.9).abs() < 1e-12);
    assert_eq!(choch.evidence.get("event_index"), Some(&51.0));

    let bos = tracker.evaluate(&window(uptrend_breaking_high())).unwrap().unwrap();
    assert_eq!(bos.direction, Direction::Bullish);
    assert!((bos.strength - 0.75).abs() < 1e-12);

    let drift = tracker.evaluate(&window(rising(20))).unwrap().unwrap();
    assert_eq!(drift.direction, Direction::Bullish);
    assert!((drift.strength - 0.5).abs() < 1e-12);
    assert_eq!(drift.source_id, "structure");
}

#[test]
fn test_short_window_yields_nothing() {
    let tracker = StructureTracker::new(StructureConfig {
        swing_width: 5,
        ..StructureConfig::default()
    });
    assert_eq!(tracker.min_lookback(), 11);
    assert!(tracker.evaluate(&window(rising(10))).unwrap().is_none());
}
