//! Rolling volume-weighted average price

use crate::models::{Candle, VwapIndicator};

/// VWAP of typical price over the last `period` bars; `None` without volume
pub fn calculate_vwap(candles: &[Candle], period: u32) -> Option<VwapIndicator> {
    let p = period as usize;
    if p == 0 || candles.len() < p {
        return None;
    }
    let span = &candles[candles.len() - p..];
    let volume: f64 = span.iter().map(|c| c.volume).sum();
    if volume <= 0.0 {
        return None;
    }
    let weighted: f64 = span
        .iter()
        .map(|c| (c.high + c.low + c.close) / 3.0 * c.volume)
        .sum();
    Some(VwapIndicator {
        value: weighted / volume,
        period,
    })
}
