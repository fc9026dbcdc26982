//! Support and Resistance levels detection

use crate::common::math;
use crate::models::{Candle, SupportResistanceIndicator};

/// Calculate support and resistance levels
///
/// Support is the nearest pivot low below `current_price` within the last
/// `lookback` candles, resistance the nearest pivot high above it. Pivots use
/// a symmetric neighborhood of `pivot_width` bars.
pub fn calculate_support_resistance(
    candles: &[Candle],
    lookback: usize,
    pivot_width: usize,
    current_price: f64,
) -> Option<SupportResistanceIndicator> {
    if candles.len() < lookback || lookback < 2 * pivot_width + 1 || current_price <= 0.0 {
        return None;
    }

    let recent = &candles[candles.len() - lookback..];
    let highs: Vec<f64> = recent.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = recent.iter().map(|c| c.low).collect();

    let support_level = math::pivot_lows(&lows, pivot_width)
        .into_iter()
        .map(|i| lows[i])
        .filter(|&level| level <= current_price)
        .fold(None, |best: Option<f64>, level| {
            Some(best.map_or(level, |b| b.max(level)))
        });

    let resistance_level = math::pivot_highs(&highs, pivot_width)
        .into_iter()
        .map(|i| highs[i])
        .filter(|&level| level >= current_price)
        .fold(None, |best: Option<f64>, level| {
            Some(best.map_or(level, |b| b.min(level)))
        });

    let support_distance_pct =
        support_level.map(|support| ((current_price - support) / current_price) * 100.0);

    let resistance_distance_pct =
        resistance_level.map(|resistance| ((resistance - current_price) / current_price) * 100.0);

    Some(SupportResistanceIndicator {
        support_level,
        resistance_level,
        support_distance_pct,
        resistance_distance_pct,
    })
}
