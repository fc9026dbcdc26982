//! Unit tests for the in-memory window source

use crate::fixtures::*;
use strelitzia::models::Candle;
use strelitzia::services::{InMemoryWindowSource, WindowSource};
use strelitzia::signals::Timeframe;
use strelitzia::AnalysisError;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_serves_window_with_enough_candles() {
    let source = InMemoryWindowSource::new();
    source.insert("EURUSD", Timeframe::H1, window(rising(30)));

    let served = assert_ok!(source.get_window("EURUSD", Timeframe::H1, 20));
    assert_eq!(served.len(), 30);
    assert_eq!(served.last().close, 129.0);
}

#[test]
fn test_short_or_missing_series_is_unavailable() {
    let source = InMemoryWindowSource::new();
    source.insert("EURUSD", Timeframe::H1, window(rising(10)));

    let err = assert_err!(source.get_window("EURUSD", Timeframe::H1, 20));
    assert_eq!(
        err,
        AnalysisError::DataUnavailable {
            symbol: "EURUSD".to_string(),
            timeframe: "H1".to_string(),
            available: 10,
            required: 20,
        }
    );

    let missing = assert_err!(source.get_window("EURUSD", Timeframe::M15, 1));
    assert!(matches!(missing, AnalysisError::DataUnavailable { available: 0, .. }));
}

#[test]
fn test_push_appends_in_time_order() {
    let source = InMemoryWindowSource::new();
    for candle in rising(5) {
        assert_ok!(source.push("AAPL", Timeframe::M15, candle));
    }
    assert_eq!(assert_ok!(source.get_window("AAPL", Timeframe::M15, 5)).len(), 5);

    let stale = Candle::new(100.0, 101.0, 99.0, 100.5, 1_000.0, ts(2));
    let err = assert_err!(source.push("AAPL", Timeframe::M15, stale));
    assert!(matches!(err, AnalysisError::InvalidWindow { .. }));
    assert_eq!(assert_ok!(source.get_window("AAPL", Timeframe::M15, 1)).len(), 5);
}

#[test]
fn test_push_rejects_malformed_candle_and_keeps_series() {
    let source = InMemoryWindowSource::with_capacity(20);
    source.insert("EURUSD", Timeframe::H1, window(rising(30)));

    let inverted = Candle::new(129.0, 128.0, 130.0, 129.5, 1_000.0, ts(30));
    let err = assert_err!(source.push("EURUSD", Timeframe::H1, inverted));
    assert!(matches!(err, AnalysisError::InvalidWindow { .. }));

    let served = assert_ok!(source.get_window("EURUSD", Timeframe::H1, 1));
    assert_eq!(served.len(), 20);
    assert_eq!(served.last().close, 129.0);
}

#[test]
fn test_first_push_starts_a_series() {
    let source = InMemoryWindowSource::new();
    let candle = Candle::new(1.1, 1.2, 1.0, 1.15, 500.0, ts(0));
    assert_ok!(source.push("EURUSD", Timeframe::M5, candle));
    assert_eq!(assert_ok!(source.get_window("EURUSD", Timeframe::M5, 1)).last(), &candle);
}

#[test]
fn test_capacity_keeps_latest_candles() {
    let source = InMemoryWindowSource::with_capacity(20);
    source.insert("AAPL", Timeframe::D1, window(rising(50)));
    let served = assert_ok!(source.get_window("AAPL", Timeframe::D1, 1));
    assert_eq!(served.len(), 20);
    assert_eq!(served.candles()[0].close, 130.0);

    let next = Candle::new(149.0, 150.2, 148.9, 150.0, 1_000.0, ts(50));
    assert_ok!(source.push("AAPL", Timeframe::D1, next));
    let served = assert_ok!(source.get_window("AAPL", Timeframe::D1, 1));
    assert_eq!(served.len(), 20);
    assert_eq!(served.last().close, 150.0);
    assert_eq!(served.candles()[0].close, 131.0);
}
