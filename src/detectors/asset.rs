//! Detectors specific to one asset class: forex trading sessions and the
//! jump / spike behaviour of synthetic indices.

use super::indicator::{atr, body_direction};
use crate::common::math;
use crate::indicators::volatility;
use crate::models::{Candle, Direction, Signal, SignalCategory};
use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Forex trading session, by UTC clock time of the candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    Sydney,
    Tokyo,
    London,
    NewYork,
    /// 13:00-16:30 UTC, London and New York both open
    LondonNewYork,
}

impl Session {
    /// Session active at `minute_of_day` (UTC). Overlaps resolve to the more
    /// liquid session.
    pub fn at(minute_of_day: u32) -> Session {
        const LONDON: (u32, u32) = (8 * 60, 16 * 60 + 30);
        const NEW_YORK: (u32, u32) = (13 * 60, 22 * 60);
        const TOKYO: (u32, u32) = (0, 9 * 60);

        let in_range = |(start, end): (u32, u32)| minute_of_day >= start && minute_of_day < end;
        match (in_range(LONDON), in_range(NEW_YORK)) {
            (true, true) => Session::LondonNewYork,
            (true, false) => Session::London,
            (false, true) => Session::NewYork,
            (false, false) if in_range(TOKYO) => Session::Tokyo,
            _ => Session::Sydney,
        }
    }

    pub fn of(candle: &Candle) -> Session {
        let t = candle.timestamp;
        Session::at(t.hour() * 60 + t.minute())
    }

    /// Relative participation used to scale session signals
    pub fn liquidity(&self) -> f64 {
        match self {
            Session::LondonNewYork => 1.0,
            Session::London | Session::NewYork => 0.9,
            Session::Tokyo => 0.7,
            Session::Sydney => 0.6,
        }
    }
}

/// Net move of the session the last candle belongs to, scaled by ATR and the
/// session's liquidity. Only candles of the same UTC day count.
pub(crate) fn session_momentum(id: &str, candles: &[Candle], lookback: usize) -> Option<Signal> {
    let last = &candles[candles.len() - 1];
    let session = Session::of(last);
    let day = last.timestamp.date_naive();

    let run = candles
        .iter()
        .rev()
        .take(lookback.max(1))
        .take_while(|c| Session::of(c) == session && c.timestamp.date_naive() == day)
        .count();
    if run < 2 {
        return None;
    }

    let first = &candles[candles.len() - run];
    let change = last.close - first.open;
    if change == 0.0 {
        return None;
    }
    let atr = atr(candles)?;
    let strength = math::unit(change.abs() / (2.0 * atr) * session.liquidity());

    Some(
        Signal::new(
            id,
            SignalCategory::Momentum,
            Direction::from_sign(change),
            strength,
        )
        .with_evidence("session_change", change)
        .with_evidence("session_bars", run as f64),
    )
}

/// Opening gap of the last candle against the average gap of the `period`
/// bars before it.
pub(crate) fn jump(id: &str, candles: &[Candle], period: u32, ratio: f64) -> Option<Signal> {
    let n = candles.len();
    let p = period as usize;
    let gaps: Vec<f64> = candles[n - 2 - p..n]
        .windows(2)
        .map(|pair| (pair[1].open - pair[0].close).abs())
        .collect();
    let average_gap = gaps[..p].iter().sum::<f64>() / p.max(1) as f64;
    let gap = candles[n - 1].open - candles[n - 2].close;

    // A feed with no gaps at all still needs a floor to measure against.
    let reference = average_gap.max(0.05 * atr(candles)?);
    let multiple = gap.abs() / reference;
    if multiple < ratio {
        return None;
    }

    Some(
        Signal::new(
            id,
            SignalCategory::Volatility,
            Direction::from_sign(gap),
            math::unit(0.5 * multiple / ratio),
        )
        .with_evidence("gap", gap)
        .with_evidence("average_gap", average_gap),
    )
}

/// Last candle's range against the ATR of the bars before it
pub(crate) fn spike(id: &str, candles: &[Candle], period: u32, ratio: f64) -> Option<Signal> {
    let n = candles.len();
    let prior_atr = volatility::calculate_atr(&candles[..n - 1], period)?.value;
    if prior_atr <= 0.0 {
        return None;
    }
    let last = &candles[n - 1];
    let multiple = last.range() / prior_atr;
    if multiple < ratio {
        return None;
    }
    let direction = match body_direction(last) {
        Direction::Neutral => Direction::from_sign(last.lower_wick() - last.upper_wick()),
        d => d,
    };
    Some(
        Signal::new(
            id,
            SignalCategory::Volatility,
            direction,
            math::unit(0.5 * multiple / ratio),
        )
        .with_evidence("range", last.range())
        .with_evidence("atr", prior_atr),
    )
}
