//! Stochastic oscillator

use crate::models::{Candle, StochasticIndicator};

/// %K over `period` bars, %D as the SMA of the last `smoothing` %K values
pub fn calculate_stochastic(
    candles: &[Candle],
    period: u32,
    smoothing: u32,
) -> Option<StochasticIndicator> {
    let (period, smoothing) = (period as usize, smoothing as usize);
    if period == 0 || smoothing == 0 || candles.len() < period + smoothing - 1 {
        return None;
    }

    let k_at = |end: usize| -> f64 {
        let span = &candles[end + 1 - period..=end];
        let highest = span.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let lowest = span.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        if highest == lowest {
            50.0
        } else {
            100.0 * (candles[end].close - lowest) / (highest - lowest)
        }
    };

    let last = candles.len() - 1;
    let ks: Vec<f64> = (last + 1 - smoothing..=last).map(k_at).collect();
    let k = *ks.last()?;
    let d = ks.iter().sum::<f64>() / smoothing as f64;

    Some(StochasticIndicator {
        k,
        d,
        period: period as u32,
    })
}
