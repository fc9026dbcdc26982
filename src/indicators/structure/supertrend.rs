//! SuperTrend indicator

use crate::common::math;
use crate::indicators::volatility::true_ranges;
use crate::models::{Candle, SuperTrendIndicator};

/// Calculate SuperTrend indicator
///
/// Bands are `hl2 ± multiplier * ATR` and ratchet with the trend: the lower
/// band only rises during an uptrend, the upper band only falls during a
/// downtrend. A close through the active band flips the trend.
pub fn calculate_supertrend(
    candles: &[Candle],
    period: u32,
    multiplier: f64,
) -> Option<SuperTrendIndicator> {
    let p = period as usize;
    if p == 0 || candles.len() < p + 1 {
        return None;
    }

    let atr = math::wilder_series(&true_ranges(candles), p);
    // atr[i] belongs to candles[p + i]
    let mut trend = 1;
    let mut final_upper = f64::MAX;
    let mut final_lower = f64::MIN;
    let mut prev_close = candles[p - 1].close;

    for (i, atr_value) in atr.iter().enumerate() {
        let candle = &candles[p + i];
        let hl2 = (candle.high + candle.low) / 2.0;
        let basic_upper = hl2 + multiplier * atr_value;
        let basic_lower = hl2 - multiplier * atr_value;

        final_upper = if basic_upper < final_upper || prev_close > final_upper {
            basic_upper
        } else {
            final_upper
        };
        final_lower = if basic_lower > final_lower || prev_close < final_lower {
            basic_lower
        } else {
            final_lower
        };

        if trend == 1 && candle.close < final_lower {
            trend = -1;
        } else if trend == -1 && candle.close > final_upper {
            trend = 1;
        }
        prev_close = candle.close;
    }

    let value = if trend == 1 { final_lower } else { final_upper };

    Some(SuperTrendIndicator {
        value,
        trend,
        upper_band: final_upper,
        lower_band: final_lower,
        period,
        multiplier,
    })
}
