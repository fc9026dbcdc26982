//! Chart patterns over the longer tail of the window.
//!
//! Patterns are located on pivot highs and lows. Two extremes count as
//! "equal" when they sit inside a tolerance band of `tolerance_atr * ATR`,
//! never by exact comparison.

use super::indicator::atr;
use super::{Detector, DetectorKind};
use crate::common::math;
use crate::error::DetectorError;
use crate::models::{Candle, CandleWindow, Direction, Signal, SignalCategory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartTemplate {
    DoubleTop,
    DoubleBottom,
    TripleTop,
    TripleBottom,
    HeadAndShoulders,
    InverseHeadAndShoulders,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
    RisingWedge,
    FallingWedge,
}

impl ChartTemplate {
    pub const ALL: [ChartTemplate; 11] = [
        ChartTemplate::DoubleTop,
        ChartTemplate::DoubleBottom,
        ChartTemplate::TripleTop,
        ChartTemplate::TripleBottom,
        ChartTemplate::HeadAndShoulders,
        ChartTemplate::InverseHeadAndShoulders,
        ChartTemplate::AscendingTriangle,
        ChartTemplate::DescendingTriangle,
        ChartTemplate::SymmetricalTriangle,
        ChartTemplate::RisingWedge,
        ChartTemplate::FallingWedge,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartTemplate::DoubleTop => "double_top",
            ChartTemplate::DoubleBottom => "double_bottom",
            ChartTemplate::TripleTop => "triple_top",
            ChartTemplate::TripleBottom => "triple_bottom",
            ChartTemplate::HeadAndShoulders => "head_and_shoulders",
            ChartTemplate::InverseHeadAndShoulders => "inverse_head_and_shoulders",
            ChartTemplate::AscendingTriangle => "ascending_triangle",
            ChartTemplate::DescendingTriangle => "descending_triangle",
            ChartTemplate::SymmetricalTriangle => "symmetrical_triangle",
            ChartTemplate::RisingWedge => "rising_wedge",
            ChartTemplate::FallingWedge => "falling_wedge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartParams {
    /// Bars scanned for the pattern
    pub lookback: usize,
    /// Neighborhood half-width for pivot detection
    pub pivot_width: usize,
    /// Width of the equality band, in ATRs
    pub tolerance_atr: f64,
    /// Minimum bars between two pivots of the same kind
    pub min_separation: usize,
}

impl Default for ChartParams {
    fn default() -> Self {
        Self {
            lookback: 60,
            pivot_width: 3,
            tolerance_atr: 0.5,
            min_separation: 4,
        }
    }
}

/// Pivots and scale of the scanned span
struct Geometry<'a> {
    candles: &'a [Candle],
    highs: Vec<f64>,
    lows: Vec<f64>,
    peaks: Vec<usize>,
    troughs: Vec<usize>,
    tolerance: f64,
    atr: f64,
    close: f64,
}

impl<'a> Geometry<'a> {
    fn new(candles: &'a [Candle], params: &ChartParams) -> Option<Self> {
        if candles.len() < params.lookback {
            return None;
        }
        let span = &candles[candles.len() - params.lookback..];
        let atr = atr(span)?;
        let highs: Vec<f64> = span.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = span.iter().map(|c| c.low).collect();
        let peaks = spaced(
            &math::pivot_highs(&highs, params.pivot_width),
            &highs,
            params.min_separation,
            |a, b| a >= b,
        );
        let troughs = spaced(
            &math::pivot_lows(&lows, params.pivot_width),
            &lows,
            params.min_separation,
            |a, b| a <= b,
        );
        Some(Self {
            candles: span,
            highs,
            lows,
            peaks,
            troughs,
            tolerance: params.tolerance_atr * atr,
            atr,
            close: span[span.len() - 1].close,
        })
    }

    fn last_peaks(&self, n: usize) -> Option<&[usize]> {
        (self.peaks.len() >= n).then(|| &self.peaks[self.peaks.len() - n..])
    }

    fn last_troughs(&self, n: usize) -> Option<&[usize]> {
        (self.troughs.len() >= n).then(|| &self.troughs[self.troughs.len() - n..])
    }

    fn lowest_low(&self, from: usize, to: usize) -> f64 {
        self.lows[from..=to].iter().copied().fold(f64::MAX, f64::min)
    }

    fn highest_high(&self, from: usize, to: usize) -> f64 {
        self.highs[from..=to].iter().copied().fold(f64::MIN, f64::max)
    }

    /// Any close after `index` beyond `level` (above when `above`)
    fn closed_beyond_after(&self, index: usize, level: f64, above: bool) -> bool {
        self.candles[index + 1..].iter().any(|c| {
            if above {
                c.close > level
            } else {
                c.close < level
            }
        })
    }
}

/// Collapse pivots closer than `min_separation`, keeping the more extreme
/// (the later one on ties).
fn spaced(
    pivots: &[usize],
    values: &[f64],
    min_separation: usize,
    at_least_as_extreme: impl Fn(f64, f64) -> bool,
) -> Vec<usize> {
    let mut out: Vec<usize> = Vec::with_capacity(pivots.len());
    for &i in pivots {
        match out.last_mut() {
            Some(last) if i - *last < min_separation => {
                if at_least_as_extreme(values[i], values[*last]) {
                    *last = i;
                }
            }
            _ => out.push(i),
        }
    }
    out
}

fn slope_of(points: &[usize], values: &[f64]) -> Option<f64> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }
    let mean_x = points.iter().map(|&i| i as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|&i| values[i]).sum::<f64>() / n;
    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), &i| {
        let dx = i as f64 - mean_x;
        (num + dx * (values[i] - mean_y), den + dx * dx)
    });
    (den > 0.0).then(|| num / den)
}

/// A located pattern before conversion to a signal
struct Found {
    direction: Direction,
    quality: f64,
    confirmed: bool,
    evidence: Vec<(&'static str, f64)>,
}

fn double_extreme(g: &Geometry, tops: bool) -> Option<Found> {
    let (pivots, values) = if tops {
        (g.last_peaks(2)?, &g.highs)
    } else {
        (g.last_troughs(2)?, &g.lows)
    };
    let (i1, i2) = (pivots[0], pivots[1]);
    let diff = (values[i1] - values[i2]).abs();
    if diff > g.tolerance {
        return None;
    }
    // Equal extremes against a sloping opposite side form a triangle.
    let triangle = if tops {
        ChartTemplate::AscendingTriangle
    } else {
        ChartTemplate::DescendingTriangle
    };
    if converging(g, triangle).is_some() {
        return None;
    }

    let (extreme, neckline) = if tops {
        (values[i1].max(values[i2]), g.lowest_low(i1, i2))
    } else {
        (values[i1].min(values[i2]), g.highest_high(i1, i2))
    };
    if (extreme - neckline).abs() < 2.0 * g.tolerance
        || g.closed_beyond_after(i2, extreme + if tops { g.tolerance } else { -g.tolerance }, tops)
    {
        return None;
    }

    let confirmed = if tops {
        g.close < neckline
    } else {
        g.close > neckline
    };
    Some(Found {
        direction: if tops {
            Direction::Bearish
        } else {
            Direction::Bullish
        },
        quality: 1.0 - diff / g.tolerance,
        confirmed,
        evidence: vec![
            ("first", values[i1]),
            ("second", values[i2]),
            ("neckline", neckline),
        ],
    })
}

fn triple_extreme(g: &Geometry, tops: bool) -> Option<Found> {
    let (pivots, values) = if tops {
        (g.last_peaks(3)?, &g.highs)
    } else {
        (g.last_troughs(3)?, &g.lows)
    };
    let levels: Vec<f64> = pivots.iter().map(|&i| values[i]).collect();
    let hi = levels.iter().copied().fold(f64::MIN, f64::max);
    let lo = levels.iter().copied().fold(f64::MAX, f64::min);
    if hi - lo > g.tolerance {
        return None;
    }

    // Reactions between the extremes must sit on one level too.
    let reactions: Vec<f64> = pivots
        .windows(2)
        .map(|pair| {
            if tops {
                g.lowest_low(pair[0], pair[1])
            } else {
                g.highest_high(pair[0], pair[1])
            }
        })
        .collect();
    let (deepest, shallowest) = if tops {
        (reactions[0].min(reactions[1]), reactions[0].max(reactions[1]))
    } else {
        (reactions[0].max(reactions[1]), reactions[0].min(reactions[1]))
    };
    if (shallowest - deepest).abs() > g.tolerance {
        return None;
    }

    let (extreme, neckline) = if tops { (hi, deepest) } else { (lo, deepest) };
    if (extreme - neckline).abs() < 2.0 * g.tolerance
        || g.closed_beyond_after(pivots[2], extreme + if tops { g.tolerance } else { -g.tolerance }, tops)
    {
        return None;
    }

    let confirmed = if tops {
        g.close < neckline
    } else {
        g.close > neckline
    };
    Some(Found {
        direction: if tops {
            Direction::Bearish
        } else {
            Direction::Bullish
        },
        quality: 1.0 - (hi - lo) / g.tolerance,
        confirmed,
        evidence: vec![("level", (hi + lo) / 2.0), ("neckline", neckline)],
    })
}

fn head_and_shoulders(g: &Geometry, inverse: bool) -> Option<Found> {
    let (pivots, values) = if inverse {
        (g.last_troughs(3)?, &g.lows)
    } else {
        (g.last_peaks(3)?, &g.highs)
    };
    let (l, h, r) = (pivots[0], pivots[1], pivots[2]);
    // Orient so the head is always the larger value.
    let sign = if inverse { -1.0 } else { 1.0 };
    let (left, head, right) = (values[l] * sign, values[h] * sign, values[r] * sign);

    let shoulder_diff = (left - right).abs();
    let head_margin = head - left.max(right);
    if shoulder_diff > g.tolerance || head_margin <= g.tolerance {
        return None;
    }
    if g.closed_beyond_after(r, values[h], !inverse) {
        return None;
    }

    let neckline = if inverse {
        (g.highest_high(l, h) + g.highest_high(h, r)) / 2.0
    } else {
        (g.lowest_low(l, h) + g.lowest_low(h, r)) / 2.0
    };
    let confirmed = if inverse {
        g.close > neckline
    } else {
        g.close < neckline
    };
    let quality = 0.5 * (1.0 - shoulder_diff / g.tolerance)
        + 0.5 * math::unit(head_margin / (3.0 * g.tolerance));

    Some(Found {
        direction: if inverse {
            Direction::Bullish
        } else {
            Direction::Bearish
        },
        quality,
        confirmed,
        evidence: vec![("head", values[h]), ("neckline", neckline)],
    })
}

/// Range of each third of the span must not widen, and must shrink overall
fn narrowing_ratio(g: &Geometry) -> Option<f64> {
    let n = g.candles.len();
    let third = n / 3;
    if third == 0 {
        return None;
    }
    let ranges: Vec<f64> = (0..3)
        .map(|k| {
            let from = k * third;
            let to = if k == 2 { n - 1 } else { (k + 1) * third - 1 };
            g.highest_high(from, to) - g.lowest_low(from, to)
        })
        .collect();
    let holds = ranges[1] <= ranges[0] + g.tolerance
        && ranges[2] <= ranges[1] + g.tolerance
        && ranges[2] < ranges[0];
    (holds && ranges[0] > 0.0).then(|| 1.0 - ranges[2] / ranges[0])
}

fn converging(g: &Geometry, template: ChartTemplate) -> Option<Found> {
    if g.peaks.len() < 2 || g.troughs.len() < 2 {
        return None;
    }
    let span = g.candles.len() as f64;
    let drift_high = slope_of(&g.peaks, &g.highs)? * span / g.atr;
    let drift_low = slope_of(&g.troughs, &g.lows)? * span / g.atr;
    let flat = 2.0 * g.tolerance / g.atr;
    let narrowing = narrowing_ratio(g)?;

    let last_peak = g.highs[g.peaks[g.peaks.len() - 1]];
    let last_trough = g.lows[g.troughs[g.troughs.len() - 1]];
    let broke_up = g.close > last_peak;
    let broke_down = g.close < last_trough;

    let (direction, confirmed) = match template {
        ChartTemplate::AscendingTriangle if drift_high.abs() <= flat && drift_low > flat => {
            (Direction::Bullish, broke_up)
        }
        ChartTemplate::DescendingTriangle if drift_high < -flat && drift_low.abs() <= flat => {
            (Direction::Bearish, broke_down)
        }
        ChartTemplate::SymmetricalTriangle if drift_high < -flat && drift_low > flat => {
            if broke_up {
                (Direction::Bullish, true)
            } else if broke_down {
                (Direction::Bearish, true)
            } else {
                (Direction::Neutral, false)
            }
        }
        ChartTemplate::RisingWedge if drift_low > drift_high && drift_high > flat => {
            (Direction::Bearish, broke_down)
        }
        ChartTemplate::FallingWedge if drift_high < drift_low && drift_low < -flat => {
            (Direction::Bullish, broke_up)
        }
        _ => return None,
    };

    let touches = ((g.peaks.len() + g.troughs.len()) as f64 - 4.0) / 4.0;
    Some(Found {
        direction,
        quality: 0.5 * narrowing + 0.5 * math::unit(touches),
        confirmed,
        evidence: vec![
            ("high_drift_atr", drift_high),
            ("low_drift_atr", drift_low),
            ("narrowing", narrowing),
        ],
    })
}

/// Detector for one chart template
#[derive(Debug, Clone)]
pub struct ChartPatternDetector {
    id: String,
    template: ChartTemplate,
    params: ChartParams,
}

impl ChartPatternDetector {
    pub fn new(template: ChartTemplate, params: ChartParams) -> Self {
        Self {
            id: format!("chart.{}", template.name()),
            template,
            params,
        }
    }

    pub fn template(&self) -> ChartTemplate {
        self.template
    }
}

impl Detector for ChartPatternDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DetectorKind {
        DetectorKind::ChartPattern
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::ChartPattern
    }

    fn min_lookback(&self) -> usize {
        self.params.lookback.max(2 * self.params.pivot_width + 1)
    }

    fn evaluate(&self, window: &CandleWindow) -> Result<Option<Signal>, DetectorError> {
        if self.params.tolerance_atr <= 0.0 {
            return Err(DetectorError::Computation(
                "tolerance_atr must be positive".to_string(),
            ));
        }
        let Some(geometry) = Geometry::new(window.candles(), &self.params) else {
            return Ok(None);
        };

        let found = match self.template {
            ChartTemplate::DoubleTop => double_extreme(&geometry, true),
            ChartTemplate::DoubleBottom => double_extreme(&geometry, false),
            ChartTemplate::TripleTop => triple_extreme(&geometry, true),
            ChartTemplate::TripleBottom => triple_extreme(&geometry, false),
            ChartTemplate::HeadAndShoulders => head_and_shoulders(&geometry, false),
            ChartTemplate::InverseHeadAndShoulders => head_and_shoulders(&geometry, true),
            template => converging(&geometry, template),
        };

        Ok(found.map(|f| {
            let confirmation = if f.confirmed { 0.25 } else { 0.0 };
            let strength = math::unit(0.4 + 0.35 * math::unit(f.quality) + confirmation);
            f.evidence.into_iter().fold(
                Signal::new(
                    self.id.clone(),
                    SignalCategory::ChartPattern,
                    f.direction,
                    strength,
                )
                .with_evidence("confirmed", if f.confirmed { 1.0 } else { 0.0 }),
                |signal, (key, value)| signal.with_evidence(key, value),
            )
        }))
    }
}
