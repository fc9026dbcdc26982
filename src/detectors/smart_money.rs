//! Smart-money zone detectors used by the forex profile: fair value gaps,
//! order blocks and liquidity sweeps.
//!
//! Each reads the last `lookback` candles and reports only the newest zone
//! that price has not yet invalidated.

use super::indicator::{atr, body_direction};
use crate::common::math;
use crate::models::{Candle, Direction, Signal, SignalCategory};

/// Price range left untraded between the first and third candle of a
/// three-candle run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairValueGap {
    /// Index of the third candle
    pub index: usize,
    pub direction: Direction,
    pub low: f64,
    pub high: f64,
}

impl FairValueGap {
    pub fn size(&self) -> f64 {
        self.high - self.low
    }

    /// A later candle traded through the whole gap
    pub fn filled_by(&self, later: &[Candle]) -> bool {
        match self.direction {
            Direction::Bullish => later.iter().any(|c| c.low <= self.low),
            Direction::Bearish => later.iter().any(|c| c.high >= self.high),
            Direction::Neutral => false,
        }
    }

    /// A later candle traded into the gap without filling it
    pub fn entered_by(&self, later: &[Candle]) -> bool {
        match self.direction {
            Direction::Bullish => later.iter().any(|c| c.low < self.high),
            Direction::Bearish => later.iter().any(|c| c.high > self.low),
            Direction::Neutral => false,
        }
    }
}

/// Every fair value gap in `candles`, oldest first
pub fn fair_value_gaps(candles: &[Candle]) -> Vec<FairValueGap> {
    candles
        .windows(3)
        .enumerate()
        .filter_map(|(i, run)| {
            let (first, third) = (&run[0], &run[2]);
            if third.low > first.high {
                Some(FairValueGap {
                    index: i + 2,
                    direction: Direction::Bullish,
                    low: first.high,
                    high: third.low,
                })
            } else if third.high < first.low {
                Some(FairValueGap {
                    index: i + 2,
                    direction: Direction::Bearish,
                    low: third.high,
                    high: first.low,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Newest unfilled gap of at least `min_gap_atr` ATR. A bullish gap below
/// price is demand, a bearish gap above price is supply.
pub(crate) fn fair_value_gap(
    id: &str,
    candles: &[Candle],
    lookback: usize,
    min_gap_atr: f64,
) -> Option<Signal> {
    let atr = atr(candles)?;
    let recent = &candles[candles.len().saturating_sub(lookback)..];

    let gap = fair_value_gaps(recent)
        .into_iter()
        .rev()
        .filter(|g| g.size() >= min_gap_atr * atr)
        .find(|g| !g.filled_by(&recent[g.index + 1..]))?;

    let later = &recent[gap.index + 1..];
    let age = later.len();
    let freshness = 1.0 - age as f64 / recent.len() as f64;
    let strength = 0.3 + 0.4 * math::unit(gap.size() / atr) + 0.3 * freshness;

    Some(
        Signal::new(
            id,
            SignalCategory::SupportResistance,
            gap.direction,
            math::unit(strength),
        )
        .with_evidence("gap_low", gap.low)
        .with_evidence("gap_high", gap.high)
        .with_evidence("age", age as f64)
        .with_evidence("entered", if gap.entered_by(later) { 1.0 } else { 0.0 }),
    )
}

/// Bars searched before an impulse for its origin candle
const ORIGIN_SEARCH: usize = 3;

/// Last opposite-bodied candle before an impulse of at least `impulse_atr`
/// ATR, reported while the last candle retests its range and no close has
/// gone through the far side.
pub(crate) fn order_block(
    id: &str,
    candles: &[Candle],
    lookback: usize,
    impulse_atr: f64,
) -> Option<Signal> {
    let atr = atr(candles)?;
    let n = candles.len();
    let start = n.saturating_sub(lookback);
    let last = &candles[n - 1];

    for k in (start + 1..n - 1).rev() {
        let impulse = &candles[k];
        let direction = body_direction(impulse);
        if direction == Direction::Neutral || impulse.body() < impulse_atr * atr {
            continue;
        }
        let Some(origin) = (start..k)
            .rev()
            .take(ORIGIN_SEARCH)
            .map(|j| &candles[j])
            .find(|c| body_direction(c) == direction.opposite())
        else {
            continue;
        };

        let (zone_low, zone_high) = (origin.low, origin.high);
        let after = &candles[k + 1..];
        let broken = match direction {
            Direction::Bullish => after.iter().any(|c| c.close < zone_low),
            _ => after.iter().any(|c| c.close > zone_high),
        };
        if broken {
            continue;
        }

        let depth = match direction {
            Direction::Bullish if last.low <= zone_high => zone_high - last.low,
            Direction::Bearish if last.high >= zone_low => last.high - zone_low,
            _ => return None,
        };
        let zone = (zone_high - zone_low).max(f64::EPSILON);
        let strength = 0.4
            + 0.3 * math::unit(impulse.body() / (2.0 * impulse_atr * atr))
            + 0.3 * math::unit(depth / zone);

        return Some(
            Signal::new(
                id,
                SignalCategory::SupportResistance,
                direction,
                math::unit(strength),
            )
            .with_evidence("zone_low", zone_low)
            .with_evidence("zone_high", zone_high)
            .with_evidence("impulse_atr", impulse.body() / atr)
            .with_evidence("age", (n - 1 - k) as f64),
        );
    }
    None
}

/// Newest pivot level in `values` that no later value has traded through
fn resting_level(values: &[f64], width: usize, above: bool) -> Option<f64> {
    let pivots = if above {
        math::pivot_highs(values, width)
    } else {
        math::pivot_lows(values, width)
    };
    pivots
        .into_iter()
        .rev()
        .map(|i| (values[i], &values[i + 1..]))
        .find(|(level, later)| {
            later
                .iter()
                .all(|v| if above { v <= level } else { v >= level })
        })
        .map(|(level, _)| level)
}

/// Last candle wicks through resting pivot liquidity and closes back inside.
/// A run above a swing high reads bearish, a run below a swing low bullish.
pub(crate) fn liquidity_sweep(
    id: &str,
    candles: &[Candle],
    lookback: usize,
    pivot_width: usize,
) -> Option<Signal> {
    let atr = atr(candles)?;
    let n = candles.len();
    let last = &candles[n - 1];
    let prior = &candles[n.saturating_sub(lookback)..n - 1];
    let highs: Vec<f64> = prior.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = prior.iter().map(|c| c.low).collect();

    let above = resting_level(&highs, pivot_width, true)
        .filter(|level| last.high > *level && last.close < *level)
        .map(|level| (Direction::Bullish, level, last.high - last.close));
    let below = resting_level(&lows, pivot_width, false)
        .filter(|level| last.low < *level && last.close > *level)
        .map(|level| (Direction::Bearish, level, last.close - last.low));

    let (swept, level, rejection) = match (above, below) {
        (Some(a), Some(b)) if a.2 == b.2 => return None,
        (Some(a), Some(b)) => {
            if a.2 > b.2 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    let penetration = match swept {
        Direction::Bullish => last.high - level,
        _ => level - last.low,
    };

    Some(
        Signal::new(
            id,
            SignalCategory::Structure,
            swept.opposite(),
            math::unit(0.4 + 0.6 * math::unit(rejection / atr)),
        )
        .with_evidence("level", level)
        .with_evidence("penetration", penetration)
        .with_evidence("rejection", rejection),
    )
}
