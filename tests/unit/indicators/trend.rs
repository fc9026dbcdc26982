//! Unit tests for trend indicators

use crate::fixtures::{candles_from_closes, falling, rising};
use strelitzia::indicators::trend::{calculate_adx, calculate_ema, calculate_slope, check_ema_cross};

#[test]
fn test_ema_calculation() {
    let candles = rising(30);
    let ema = calculate_ema(&candles, 10).unwrap();
    assert!(ema.value > 100.0);
    assert!(ema.value < 129.0);
    assert_eq!(ema.period, 10);
}

#[test]
fn test_ema_of_flat_series_equals_price() {
    let candles = candles_from_closes(&[50.0; 25]);
    let ema = calculate_ema(&candles, 20).unwrap();
    assert!((ema.value - 50.0).abs() < 1e-9);
}

#[test]
fn test_ema_insufficient_data() {
    assert!(calculate_ema(&rising(5), 10).is_none());
    assert!(calculate_ema(&rising(5), 0).is_none());
}

#[test]
fn test_ema_cross_direction() {
    assert_eq!(check_ema_cross(&rising(60), 20, 50), Some(1));
    assert_eq!(check_ema_cross(&falling(60), 20, 50), Some(-1));
    assert_eq!(check_ema_cross(&rising(30), 20, 50), None);
}

#[test]
fn test_adx_strong_trend() {
    let adx = calculate_adx(&rising(60), 14).unwrap();
    assert!(adx.value > 25.0, "adx {}", adx.value);
    assert!(adx.plus_di > adx.minus_di);
}

#[test]
fn test_adx_needs_two_periods() {
    assert!(calculate_adx(&rising(28), 14).is_none());
    assert!(calculate_adx(&rising(29), 14).is_some());
}

#[test]
fn test_slope_sign() {
    assert!(calculate_slope(&rising(20), 20).unwrap().slope > 0.0);
    assert!(calculate_slope(&falling(20), 20).unwrap().slope < 0.0);
}
