//! Ordered evaluation of market structure.
//!
//! The tracker walks the window candle by candle. A swing at index `j` is
//! confirmed once `j + swing_width` candles exist, after which every close is
//! tested against the most recent swing high and low:
//!
//! - with an established trend, a close through the prior swing in the trend's
//!   direction is a break of structure (BOS);
//! - a close through the prior swing against the trend held before the candle
//!   is a change of character (CHOCH). A candle whose new swing flips the
//!   label can satisfy both at once; CHOCH wins;
//! - a fresh `ranging` classification clears the last event.
//!
//! The state is rebuilt from scratch on every call, so tracking the same
//! window twice yields identical results.

use super::swings::{candidates_at, SwingSequence};
use crate::detectors::{Detector, DetectorKind};
use crate::error::DetectorError;
use crate::models::{
    Candle, CandleWindow, Direction, Signal, SignalCategory, StructureEvent, StructureState,
    SwingKind, SwingPoint, TrendLabel,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureConfig {
    /// Half-width of the neighborhood a swing must dominate
    pub swing_width: usize,
    /// Relative band within which two extremes count as equal
    pub equal_tolerance_pct: f64,
    /// Relative margin a close must clear to break a swing
    pub break_tolerance_pct: f64,
    /// Share of same-direction closes that reads as a trend before swings exist
    pub drift_ratio: f64,
    pub choch_strength: f64,
    pub bos_strength: f64,
    pub trend_strength: f64,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            swing_width: 3,
            equal_tolerance_pct: 0.0005,
            break_tolerance_pct: 0.0005,
            drift_ratio: 0.7,
            choch_strength: 0.9,
            bos_strength: 0.75,
            trend_strength: 0.5,
        }
    }
}

/// Close-to-close drift, used to label a trend before enough swings exist
#[derive(Debug, Default)]
struct Drift {
    first_close: Option<f64>,
    last_close: f64,
    ups: usize,
    downs: usize,
    moves: usize,
}

impl Drift {
    fn observe(&mut self, close: f64) {
        match self.first_close {
            None => self.first_close = Some(close),
            Some(_) => {
                self.moves += 1;
                if close > self.last_close {
                    self.ups += 1;
                } else if close < self.last_close {
                    self.downs += 1;
                }
            }
        }
        self.last_close = close;
    }

    fn label(&self, ratio: f64) -> TrendLabel {
        let Some(first) = self.first_close else {
            return TrendLabel::Undefined;
        };
        if self.moves < 2 {
            return TrendLabel::Undefined;
        }
        let moves = self.moves as f64;
        if self.ups as f64 / moves >= ratio && self.last_close > first {
            TrendLabel::Uptrend
        } else if self.downs as f64 / moves >= ratio && self.last_close < first {
            TrendLabel::Downtrend
        } else {
            TrendLabel::Undefined
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructureTracker {
    config: StructureConfig,
}

impl StructureTracker {
    pub fn new(config: StructureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    pub fn track(&self, window: &CandleWindow) -> StructureState {
        self.track_candles(window.candles())
    }

    pub fn track_candles(&self, candles: &[Candle]) -> StructureState {
        let width = self.config.swing_width.max(1);
        let mut swings = SwingSequence::new(self.config.equal_tolerance_pct);
        let mut drift = Drift::default();
        let mut state = StructureState::empty();
        let mut broken_high: Option<usize> = None;
        let mut broken_low: Option<usize> = None;

        for (t, candle) in candles.iter().enumerate() {
            if t >= 2 * width {
                for point in candidates_at(candles, t - width, width) {
                    swings.push(point);
                }
            }
            drift.observe(candle.close);

            let label = self.classify(&swings, &drift);
            let established = state.trend_label;
            if label != established {
                if label == TrendLabel::Ranging {
                    state.last_event = StructureEvent::None;
                    state.event_direction = Direction::Neutral;
                    state.event_index = None;
                }
                state.trend_label = label;
            }
            if !label.is_directional() {
                continue;
            }

            let bull_break = swings
                .last_of(SwingKind::High)
                .filter(|high| Some(high.index) != broken_high && self.closes_beyond(candle, high))
                .map(|high| high.index);
            let bear_break = swings
                .last_of(SwingKind::Low)
                .filter(|low| Some(low.index) != broken_low && self.closes_beyond(candle, low))
                .map(|low| low.index);

            // CHOCH is judged against the trend held before this candle and
            // checked first, so it wins over a BOS of a trend the same candle
            // just flipped to.
            let reference = if established.is_directional() {
                established
            } else {
                label
            };
            let (event, direction) = match (reference, label, bull_break, bear_break) {
                (TrendLabel::Uptrend, _, _, Some(low)) => {
                    broken_low = Some(low);
                    (StructureEvent::ChangeOfCharacter, Direction::Bearish)
                }
                (TrendLabel::Downtrend, _, Some(high), _) => {
                    broken_high = Some(high);
                    (StructureEvent::ChangeOfCharacter, Direction::Bullish)
                }
                (_, TrendLabel::Uptrend, Some(high), _) => {
                    broken_high = Some(high);
                    (StructureEvent::BreakOfStructure, Direction::Bullish)
                }
                (_, TrendLabel::Downtrend, _, Some(low)) => {
                    broken_low = Some(low);
                    (StructureEvent::BreakOfStructure, Direction::Bearish)
                }
                _ => continue,
            };
            trace!(index = t, event = ?event, direction = %direction, "StructureTracker: event");
            state.last_event = event;
            state.event_direction = direction;
            state.event_index = Some(t);
        }

        state.last_swing_sequence = swings.into_vec();
        state
    }

    /// Signal for a tracked state, `None` when there is no directional read
    pub fn signal_for(&self, id: &str, state: &StructureState) -> Option<Signal> {
        let (direction, strength) = match state.last_event {
            StructureEvent::ChangeOfCharacter => (state.event_direction, self.config.choch_strength),
            StructureEvent::BreakOfStructure => (state.event_direction, self.config.bos_strength),
            StructureEvent::None if state.trend_label.is_directional() => {
                let consistency = swing_consistency(&state.last_swing_sequence, state.trend_label);
                (
                    state.trend_label.direction(),
                    self.config.trend_strength * (0.5 + 0.5 * consistency),
                )
            }
            StructureEvent::None => return None,
        };

        let mut signal = Signal::new(id, SignalCategory::Structure, direction, strength.clamp(0.0, 1.0))
            .with_evidence("swings", state.last_swing_sequence.len() as f64);
        if let Some(index) = state.event_index {
            signal = signal.with_evidence("event_index", index as f64);
        }
        Some(signal)
    }

    fn classify(&self, swings: &SwingSequence, drift: &Drift) -> TrendLabel {
        let (Some((h1, h2)), Some((l1, l2))) = (
            swings.last_pair(SwingKind::High),
            swings.last_pair(SwingKind::Low),
        ) else {
            return drift.label(self.config.drift_ratio);
        };
        let highs = self.compare(h1.price, h2.price);
        let lows = self.compare(l1.price, l2.price);
        match (highs, lows) {
            (1, 1) => TrendLabel::Uptrend,
            (-1, -1) => TrendLabel::Downtrend,
            _ => TrendLabel::Ranging,
        }
    }

    /// 1 if `newer` is above `older` beyond tolerance, -1 if below, else 0
    fn compare(&self, older: f64, newer: f64) -> i32 {
        let band = self.config.equal_tolerance_pct * older.abs().max(newer.abs());
        if newer > older + band {
            1
        } else if newer < older - band {
            -1
        } else {
            0
        }
    }

    fn closes_beyond(&self, candle: &Candle, swing: &SwingPoint) -> bool {
        let margin = self.config.break_tolerance_pct * swing.price.abs();
        match swing.kind {
            SwingKind::High => candle.close > swing.price + margin,
            SwingKind::Low => candle.close < swing.price - margin,
        }
    }
}

impl Default for StructureTracker {
    fn default() -> Self {
        Self::new(StructureConfig::default())
    }
}

/// Share of consecutive same-kind swing pairs moving with `label`; 1.0 when
/// there are no pairs to judge.
fn swing_consistency(swings: &[SwingPoint], label: TrendLabel) -> f64 {
    let sign = label.direction().sign();
    let mut agreeing = 0usize;
    let mut total = 0usize;
    for kind in [SwingKind::High, SwingKind::Low] {
        let prices: Vec<f64> = swings.iter().filter(|p| p.kind == kind).map(|p| p.price).collect();
        for pair in prices.windows(2) {
            total += 1;
            if (pair[1] - pair[0]) * sign > 0.0 {
                agreeing += 1;
            }
        }
    }
    if total == 0 {
        1.0
    } else {
        agreeing as f64 / total as f64
    }
}

impl Detector for StructureTracker {
    fn id(&self) -> &str {
        "structure"
    }

    fn kind(&self) -> DetectorKind {
        DetectorKind::Structure
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Structure
    }

    fn min_lookback(&self) -> usize {
        2 * self.config.swing_width.max(1) + 1
    }

    fn evaluate(&self, window: &CandleWindow) -> Result<Option<Signal>, DetectorError> {
        self.evaluate_with_state(window).map(|(signal, _)| signal)
    }

    fn evaluate_with_state(
        &self,
        window: &CandleWindow,
    ) -> Result<(Option<Signal>, Option<StructureState>), DetectorError> {
        let state = self.track(window);
        let signal = if window.len() < self.min_lookback() {
            None
        } else {
            self.signal_for(self.id(), &state)
        };
        Ok((signal, Some(state)))
    }
}
