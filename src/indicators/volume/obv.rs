//! On-balance volume

use crate::models::{Candle, ObvIndicator};

/// OBV over the window and its change across the last `period` bars
pub fn calculate_obv(candles: &[Candle], period: u32) -> Option<ObvIndicator> {
    let p = period as usize;
    if p == 0 || candles.len() < p + 1 {
        return None;
    }

    let mut obv = Vec::with_capacity(candles.len());
    obv.push(0.0);
    for pair in candles.windows(2) {
        let prev = obv[obv.len() - 1];
        let next = if pair[1].close > pair[0].close {
            prev + pair[1].volume
        } else if pair[1].close < pair[0].close {
            prev - pair[1].volume
        } else {
            prev
        };
        obv.push(next);
    }

    let n = obv.len();
    let traded: f64 = candles[n - p..].iter().map(|c| c.volume).sum();
    let change_ratio = if traded > 0.0 {
        (obv[n - 1] - obv[n - 1 - p]) / traded
    } else {
        0.0
    };

    Some(ObvIndicator {
        value: obv[n - 1],
        change_ratio,
        period,
    })
}
