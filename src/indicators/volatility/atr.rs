//! ATR (Average True Range) indicator

use crate::common::math;
use crate::models::{AtrIndicator, Candle};

/// True range of every bar after the first
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|pair| math::true_range(pair[1].high, pair[1].low, pair[0].close))
        .collect()
}

/// Calculate ATR (Average True Range)
///
/// Wilder-smoothed average of the true range over `period` bars.
pub fn calculate_atr(candles: &[Candle], period: u32) -> Option<AtrIndicator> {
    let p = period as usize;
    if p == 0 || candles.len() < p + 1 {
        return None;
    }

    let atr_value = *math::wilder_series(&true_ranges(candles), p).last()?;

    Some(AtrIndicator {
        value: atr_value,
        period,
    })
}
