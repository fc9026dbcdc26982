//! Volume indicators: OBV, VWAP, volume moving average

pub mod obv;
pub mod vwap;

pub use obv::*;
pub use vwap::*;

use crate::models::{Candle, VolumeIndicator};

/// Current volume against the average of the `period` bars before it
pub fn calculate_volume_ma(candles: &[Candle], period: u32) -> Option<VolumeIndicator> {
    let p = period as usize;
    if p == 0 || candles.len() < p + 1 {
        return None;
    }
    let prior = &candles[candles.len() - 1 - p..candles.len() - 1];
    Some(VolumeIndicator {
        volume: candles[candles.len() - 1].volume,
        volume_ma: prior.iter().map(|c| c.volume).sum::<f64>() / p as f64,
        volume_ma_period: period,
    })
}
