//! MACD (Moving Average Convergence Divergence) indicator

use crate::common::math;
use crate::models::{Candle, MacdIndicator};

/// Calculate MACD indicator
///
/// MACD = EMA(fast) - EMA(slow)
/// Signal = EMA(signal) of MACD
/// Histogram = MACD - Signal
pub fn calculate_macd(
    candles: &[Candle],
    fast_period: u32,
    slow_period: u32,
    signal_period: u32,
) -> Option<MacdIndicator> {
    let (fast, slow, signal) = (
        fast_period as usize,
        slow_period as usize,
        signal_period as usize,
    );
    if fast == 0 || fast >= slow || candles.len() < slow + signal {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast_series = math::ema_series(&closes, fast);
    let slow_series = math::ema_series(&closes, slow);

    // Align both series on the close index: slow starts `slow - fast` bars later.
    let offset = slow - fast;
    let macd_values: Vec<f64> = slow_series
        .iter()
        .enumerate()
        .map(|(i, slow_ema)| fast_series[i + offset] - slow_ema)
        .collect();

    let signal_series = math::ema_series(&macd_values, signal);
    if signal_series.len() < 2 {
        return None;
    }

    let n = macd_values.len();
    let m = signal_series.len();
    let histogram = macd_values[n - 1] - signal_series[m - 1];
    let prev_histogram = macd_values[n - 2] - signal_series[m - 2];

    Some(MacdIndicator {
        macd: macd_values[n - 1],
        signal: signal_series[m - 1],
        histogram,
        prev_histogram,
        period: Some((fast_period, slow_period, signal_period)),
    })
}
