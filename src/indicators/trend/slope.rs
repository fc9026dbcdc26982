//! Linear regression slope of closes

use crate::common::math;
use crate::models::{Candle, SlopeIndicator};

pub fn calculate_slope(candles: &[Candle], period: u32) -> Option<SlopeIndicator> {
    let p = period as usize;
    if p < 2 || candles.len() < p {
        return None;
    }
    let closes: Vec<f64> = candles[candles.len() - p..].iter().map(|c| c.close).collect();
    Some(SlopeIndicator {
        slope: math::linear_regression_slope(&closes)?,
        period,
    })
}
