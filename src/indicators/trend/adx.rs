//! ADX (Average Directional Index) indicator

use crate::common::math;
use crate::models::{AdxIndicator, Candle};

/// Calculate ADX indicator
///
/// ADX measures trend strength regardless of direction; +DI and -DI carry
/// the direction. Uses Wilder smoothing throughout, so it needs
/// `2 * period + 1` candles.
pub fn calculate_adx(candles: &[Candle], period: u32) -> Option<AdxIndicator> {
    let p = period as usize;
    if p == 0 || candles.len() < 2 * p + 1 {
        return None;
    }

    let mut tr_values = Vec::with_capacity(candles.len() - 1);
    let mut plus_dm_values = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm_values = Vec::with_capacity(candles.len() - 1);

    for pair in candles.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        tr_values.push(math::true_range(cur.high, cur.low, prev.close));

        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;
        plus_dm_values.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm_values.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
    }

    let atr = math::wilder_series(&tr_values, p);
    let plus_dm = math::wilder_series(&plus_dm_values, p);
    let minus_dm = math::wilder_series(&minus_dm_values, p);

    let mut dx_values = Vec::with_capacity(atr.len());
    let mut last_di = (0.0, 0.0);
    for i in 0..atr.len() {
        let (plus_di, minus_di) = if atr[i] > 0.0 {
            (100.0 * plus_dm[i] / atr[i], 100.0 * minus_dm[i] / atr[i])
        } else {
            (0.0, 0.0)
        };
        let di_sum = plus_di + minus_di;
        dx_values.push(if di_sum > 0.0 {
            100.0 * (plus_di - minus_di).abs() / di_sum
        } else {
            0.0
        });
        last_di = (plus_di, minus_di);
    }

    let adx_value = *math::wilder_series(&dx_values, p).last()?;

    Some(AdxIndicator {
        value: adx_value,
        plus_di: last_di.0,
        minus_di: last_di.1,
        period,
    })
}
