//! Swing point extraction with strict high/low alternation.

use crate::models::{Candle, SwingKind, SwingPoint};

/// Alternating sequence of swing points.
///
/// Every insertion keeps the sequence strictly alternating: a candidate of
/// the same kind as the last point replaces it when it is more extreme, or
/// equally extreme within the tolerance band (the later point wins).
#[derive(Debug, Clone, Default)]
pub struct SwingSequence {
    points: Vec<SwingPoint>,
    tolerance_pct: f64,
}

impl SwingSequence {
    pub fn new(tolerance_pct: f64) -> Self {
        Self {
            points: Vec::new(),
            tolerance_pct: tolerance_pct.max(0.0),
        }
    }

    pub fn push(&mut self, point: SwingPoint) {
        let Some(last) = self.points.last_mut() else {
            self.points.push(point);
            return;
        };
        if last.kind != point.kind {
            self.points.push(point);
            return;
        }
        let band = self.tolerance_pct * last.price.abs().max(point.price.abs());
        let equal = (point.price - last.price).abs() <= band;
        let more_extreme = match point.kind {
            SwingKind::High => point.price > last.price,
            SwingKind::Low => point.price < last.price,
        };
        if equal || more_extreme {
            *last = point;
        }
    }

    pub fn points(&self) -> &[SwingPoint] {
        &self.points
    }

    pub fn last_of(&self, kind: SwingKind) -> Option<&SwingPoint> {
        self.points.iter().rev().find(|p| p.kind == kind)
    }

    /// Last two points of `kind`, oldest first
    pub fn last_pair(&self, kind: SwingKind) -> Option<(&SwingPoint, &SwingPoint)> {
        let mut iter = self.points.iter().rev().filter(|p| p.kind == kind);
        let newer = iter.next()?;
        let older = iter.next()?;
        Some((older, newer))
    }

    pub fn into_vec(self) -> Vec<SwingPoint> {
        self.points
    }
}

/// Swing candidates at `index` for a symmetric neighborhood of `width` bars.
///
/// The caller guarantees the neighborhood lies inside `candles`. An outside
/// bar can be both a high and a low candidate; the order follows the bar's
/// likely path (low first on a bullish bar).
pub fn candidates_at(candles: &[Candle], index: usize, width: usize) -> Vec<SwingPoint> {
    let neighborhood = &candles[index - width..=index + width];
    let candle = &candles[index];
    let is_high = neighborhood.iter().all(|c| candle.high >= c.high);
    let is_low = neighborhood.iter().all(|c| candle.low <= c.low);

    let point = |kind, price| SwingPoint {
        index,
        timestamp: candle.timestamp,
        price,
        kind,
    };
    let high = is_high.then(|| point(SwingKind::High, candle.high));
    let low = is_low.then(|| point(SwingKind::Low, candle.low));

    if candle.is_bullish() {
        low.into_iter().chain(high).collect()
    } else {
        high.into_iter().chain(low).collect()
    }
}

/// All confirmed swings of `candles`, reduced to an alternating sequence
pub fn extract_swings(candles: &[Candle], width: usize, tolerance_pct: f64) -> Vec<SwingPoint> {
    let width = width.max(1);
    let mut sequence = SwingSequence::new(tolerance_pct);
    if candles.len() < 2 * width + 1 {
        return Vec::new();
    }
    for index in width..candles.len() - width {
        for point in candidates_at(candles, index, width) {
            sequence.push(point);
        }
    }
    sequence.into_vec()
}
