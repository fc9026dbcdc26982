//! Rate of change

use crate::models::{Candle, RocIndicator};

pub fn calculate_roc(candles: &[Candle], period: u32) -> Option<RocIndicator> {
    let period = period as usize;
    if period == 0 || candles.len() < period + 1 {
        return None;
    }
    let current = candles[candles.len() - 1].close;
    let past = candles[candles.len() - 1 - period].close;
    if past == 0.0 {
        return None;
    }
    Some(RocIndicator {
        value: (current - past) / past * 100.0,
        period: period as u32,
    })
}
