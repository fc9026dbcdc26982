//! Donchian channel over the bars preceding the current one

use crate::models::{Candle, DonchianIndicator};

pub fn calculate_donchian(candles: &[Candle], period: u32) -> Option<DonchianIndicator> {
    let p = period as usize;
    if p == 0 || candles.len() < p + 1 {
        return None;
    }
    let prior = &candles[candles.len() - 1 - p..candles.len() - 1];
    Some(DonchianIndicator {
        upper: prior.iter().map(|c| c.high).fold(f64::MIN, f64::max),
        lower: prior.iter().map(|c| c.low).fold(f64::MAX, f64::min),
        period,
    })
}
