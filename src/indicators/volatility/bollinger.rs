//! Bollinger Bands indicator

use crate::common::math;
use crate::models::{BollingerBandsIndicator, Candle};

/// Calculate Bollinger Bands
///
/// Middle Band = SMA(period)
/// Upper Band = Middle + (std_dev * standard deviation)
/// Lower Band = Middle - (std_dev * standard deviation)
pub fn calculate_bollinger_bands(
    candles: &[Candle],
    period: u32,
    std_dev: f64,
) -> Option<BollingerBandsIndicator> {
    let p = period as usize;
    if p == 0 || candles.len() < p {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let middle = math::sma(&closes, p)?;
    let std = math::standard_deviation(&closes, p)?;

    let upper = middle + (std_dev * std);
    let lower = middle - (std_dev * std);
    let bandwidth = if middle != 0.0 {
        (upper - lower) / middle
    } else {
        0.0
    };

    Some(BollingerBandsIndicator {
        upper,
        middle,
        lower,
        bandwidth,
        period,
        std_dev,
    })
}

/// Bandwidth at each of the last `history` bars, oldest first
pub fn bollinger_bandwidth_history(
    candles: &[Candle],
    period: u32,
    std_dev: f64,
    history: usize,
) -> Vec<f64> {
    let p = period as usize;
    if p == 0 || candles.len() < p {
        return Vec::new();
    }
    let first_end = (candles.len() + 1 - history.min(candles.len() - p + 1)).max(p);
    (first_end..=candles.len())
        .filter_map(|end| calculate_bollinger_bands(&candles[..end], period, std_dev))
        .map(|bands| bands.bandwidth)
        .collect()
}
