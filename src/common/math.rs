//! Numeric helpers shared by the indicator and pattern calculations.

/// Simple moving average of the last `period` values
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average, seeded with the SMA of the first `period` values
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    ema_series(values, period).last().copied()
}

/// One EMA step from the previous value
pub fn ema_from_previous(value: f64, previous: f64, period: usize) -> f64 {
    let k = 2.0 / (period as f64 + 1.0);
    value * k + previous * (1.0 - k)
}

/// Full EMA series. Element `i` corresponds to `values[period - 1 + i]`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &v in &values[period..] {
        prev = ema_from_previous(v, prev, period);
        out.push(prev);
    }
    out
}

/// Wilder smoothing (RMA) series, seeded like [`ema_series`]
pub fn wilder_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &v in &values[period..] {
        prev = (prev * (period as f64 - 1.0) + v) / period as f64;
        out.push(prev);
    }
    out
}

/// Population standard deviation of the last `period` values
pub fn standard_deviation(values: &[f64], period: usize) -> Option<f64> {
    let mean = sma(values, period)?;
    let tail = &values[values.len() - period..];
    let variance = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
    Some(variance.sqrt())
}

/// True range of a bar given the previous close
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Least-squares slope of `values` against their index
pub fn linear_regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

/// Indices that are the maximum of their symmetric `width` neighborhood.
///
/// Only indices with a full neighborhood on both sides qualify. Ties count,
/// so a flat top yields every bar of the plateau.
pub fn pivot_highs(values: &[f64], width: usize) -> Vec<usize> {
    pivots(values, width, |candidate, other| candidate >= other)
}

/// Indices that are the minimum of their symmetric `width` neighborhood
pub fn pivot_lows(values: &[f64], width: usize) -> Vec<usize> {
    pivots(values, width, |candidate, other| candidate <= other)
}

fn pivots(values: &[f64], width: usize, dominates: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    if width == 0 || values.len() < 2 * width + 1 {
        return Vec::new();
    }
    (width..values.len() - width)
        .filter(|&i| {
            (i - width..=i + width)
                .filter(|&j| j != i)
                .all(|j| dominates(values[i], values[j]))
        })
        .collect()
}

/// Clamp into [0, 1], mapping NaN to 0
pub fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
