//! Indicator detectors.
//!
//! Each [`IndicatorRule`] row names an indicator and its parameters; the
//! detector turns the computed value into a directional [`Signal`]. Strengths
//! are normalised by ATR so thresholds carry across instruments.

use super::{asset, smart_money, Detector, DetectorKind};
use crate::common::math;
use crate::error::{ConfigError, DetectorError};
use crate::indicators::{momentum, structure, trend, volatility, volume};
use crate::models::{Candle, CandleWindow, Direction, Signal, SignalCategory};
use serde::{Deserialize, Serialize};

/// ATR period used to normalise strengths
pub const ATR_PERIOD: u32 = 14;

/// Blend of the three MACD components into one strength
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdWeights {
    pub crossover_weight: f64,
    pub distance_weight: f64,
    pub histogram_momentum_weight: f64,
}

impl Default for MacdWeights {
    fn default() -> Self {
        Self {
            crossover_weight: 0.4,
            distance_weight: 0.3,
            histogram_momentum_weight: 0.3,
        }
    }
}

impl MacdWeights {
    pub fn new(
        crossover_weight: f64,
        distance_weight: f64,
        histogram_momentum_weight: f64,
    ) -> Result<Self, ConfigError> {
        let weights = Self {
            crossover_weight,
            distance_weight,
            histogram_momentum_weight,
        };
        let total = crossover_weight + distance_weight + histogram_momentum_weight;
        if (total - 1.0).abs() > 0.001
            || crossover_weight < 0.0
            || distance_weight < 0.0
            || histogram_momentum_weight < 0.0
        {
            return Err(ConfigError::InvalidSetting {
                key: "macd_weights".to_string(),
                value: format!("{:?}", weights),
            });
        }
        Ok(weights)
    }
}

/// Configuration row for one indicator detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum IndicatorRule {
    EmaCross { fast: u32, slow: u32 },
    Adx { period: u32, threshold: f64 },
    Supertrend { period: u32, multiplier: f64 },
    PriceSlope { period: u32 },
    Rsi { period: u32, oversold: f64, overbought: f64 },
    Macd { fast: u32, slow: u32, signal: u32, weights: MacdWeights },
    Stochastic { period: u32, smoothing: u32, oversold: f64, overbought: f64 },
    Roc { period: u32 },
    Bollinger { period: u32, std_dev: f64, squeeze_history: usize },
    AtrExpansion { period: u32, ratio: f64 },
    Obv { period: u32, min_change: f64 },
    Vwap { period: u32 },
    VolumeSpike { period: u32, ratio: f64 },
    SupportResistance { lookback: usize, pivot_width: usize, proximity_atr: f64 },
    RangeBreakout { period: u32 },
    /// Forex: net move of the current trading session
    SessionMomentum { lookback: usize },
    /// Synthetic indices: open gap against the average gap
    Jump { period: u32, ratio: f64 },
    /// Synthetic indices: single-bar range against ATR
    Spike { period: u32, ratio: f64 },
    /// Forex: newest unfilled three-candle imbalance
    FairValueGap { lookback: usize, min_gap_atr: f64 },
    /// Forex: retest of the candle that launched an impulse
    OrderBlock { lookback: usize, impulse_atr: f64 },
    /// Forex: wick through resting swing liquidity that closes back inside
    LiquiditySweep { lookback: usize, pivot_width: usize },
}

impl IndicatorRule {
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorRule::EmaCross { .. } => "ema_cross",
            IndicatorRule::Adx { .. } => "adx",
            IndicatorRule::Supertrend { .. } => "supertrend",
            IndicatorRule::PriceSlope { .. } => "price_slope",
            IndicatorRule::Rsi { .. } => "rsi",
            IndicatorRule::Macd { .. } => "macd",
            IndicatorRule::Stochastic { .. } => "stochastic",
            IndicatorRule::Roc { .. } => "roc",
            IndicatorRule::Bollinger { .. } => "bollinger",
            IndicatorRule::AtrExpansion { .. } => "atr_expansion",
            IndicatorRule::Obv { .. } => "obv",
            IndicatorRule::Vwap { .. } => "vwap",
            IndicatorRule::VolumeSpike { .. } => "volume_spike",
            IndicatorRule::SupportResistance { .. } => "support_resistance",
            IndicatorRule::RangeBreakout { .. } => "range_breakout",
            IndicatorRule::SessionMomentum { .. } => "session_momentum",
            IndicatorRule::Jump { .. } => "jump",
            IndicatorRule::Spike { .. } => "spike",
            IndicatorRule::FairValueGap { .. } => "fair_value_gap",
            IndicatorRule::OrderBlock { .. } => "order_block",
            IndicatorRule::LiquiditySweep { .. } => "liquidity_sweep",
        }
    }

    pub fn category(&self) -> SignalCategory {
        match self {
            IndicatorRule::EmaCross { .. }
            | IndicatorRule::Adx { .. }
            | IndicatorRule::Supertrend { .. }
            | IndicatorRule::PriceSlope { .. } => SignalCategory::Trend,
            IndicatorRule::Rsi { .. }
            | IndicatorRule::Macd { .. }
            | IndicatorRule::Stochastic { .. }
            | IndicatorRule::Roc { .. }
            | IndicatorRule::SessionMomentum { .. } => SignalCategory::Momentum,
            IndicatorRule::Bollinger { .. }
            | IndicatorRule::AtrExpansion { .. }
            | IndicatorRule::Jump { .. }
            | IndicatorRule::Spike { .. } => SignalCategory::Volatility,
            IndicatorRule::Obv { .. }
            | IndicatorRule::Vwap { .. }
            | IndicatorRule::VolumeSpike { .. } => SignalCategory::Volume,
            IndicatorRule::SupportResistance { .. }
            | IndicatorRule::RangeBreakout { .. }
            | IndicatorRule::FairValueGap { .. }
            | IndicatorRule::OrderBlock { .. } => SignalCategory::SupportResistance,
            IndicatorRule::LiquiditySweep { .. } => SignalCategory::Structure,
        }
    }

    pub fn min_lookback(&self) -> usize {
        let atr_bars = ATR_PERIOD as usize + 1;
        match *self {
            IndicatorRule::EmaCross { slow, .. } => (slow as usize).max(atr_bars),
            IndicatorRule::Adx { period, .. } => 2 * period as usize + 1,
            IndicatorRule::Supertrend { period, .. } => (period as usize + 1).max(atr_bars),
            IndicatorRule::PriceSlope { period } => (period as usize).max(atr_bars),
            IndicatorRule::Rsi { period, .. } => period as usize + 1,
            IndicatorRule::Macd { slow, signal, .. } => {
                (slow as usize + signal as usize).max(atr_bars)
            }
            IndicatorRule::Stochastic {
                period, smoothing, ..
            } => period as usize + smoothing as usize - 1,
            IndicatorRule::Roc { period } => (period as usize + 1).max(atr_bars),
            IndicatorRule::Bollinger { period, .. } => period as usize,
            IndicatorRule::AtrExpansion { period, .. } => period as usize + 2,
            IndicatorRule::Obv { period, .. } => period as usize + 1,
            IndicatorRule::Vwap { period } => (period as usize).max(atr_bars),
            IndicatorRule::VolumeSpike { period, .. } => period as usize + 1,
            IndicatorRule::SupportResistance { lookback, .. } => lookback.max(atr_bars),
            IndicatorRule::RangeBreakout { period } => (period as usize + 1).max(atr_bars),
            IndicatorRule::SessionMomentum { .. } => atr_bars,
            IndicatorRule::Jump { period, .. } => (period as usize + 2).max(atr_bars),
            IndicatorRule::Spike { period, .. } => period as usize + 2,
            IndicatorRule::FairValueGap { lookback, .. } => lookback.max(atr_bars),
            IndicatorRule::OrderBlock { lookback, .. } => lookback.max(atr_bars),
            IndicatorRule::LiquiditySweep {
                lookback,
                pivot_width,
            } => lookback.max(2 * pivot_width + 2).max(atr_bars),
        }
    }
}

/// Detector wrapping one [`IndicatorRule`]
#[derive(Debug, Clone)]
pub struct IndicatorDetector {
    id: String,
    rule: IndicatorRule,
}

impl IndicatorDetector {
    pub fn new(rule: IndicatorRule) -> Self {
        Self {
            id: rule.name().to_string(),
            rule,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn rule(&self) -> &IndicatorRule {
        &self.rule
    }
}

impl Detector for IndicatorDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DetectorKind {
        DetectorKind::Indicator
    }

    fn category(&self) -> SignalCategory {
        self.rule.category()
    }

    fn min_lookback(&self) -> usize {
        self.rule.min_lookback()
    }

    fn evaluate(&self, window: &CandleWindow) -> Result<Option<Signal>, DetectorError> {
        if window.len() < self.min_lookback() {
            return Ok(None);
        }
        let candles = window.candles();
        let id = self.id.as_str();

        let signal = match &self.rule {
            IndicatorRule::EmaCross { fast, slow } => ema_cross(id, candles, *fast, *slow),
            IndicatorRule::Adx { period, threshold } => adx(id, candles, *period, *threshold),
            IndicatorRule::Supertrend { period, multiplier } => {
                supertrend(id, candles, *period, *multiplier)
            }
            IndicatorRule::PriceSlope { period } => price_slope(id, candles, *period),
            IndicatorRule::Rsi {
                period,
                oversold,
                overbought,
            } => rsi(id, candles, *period, *oversold, *overbought),
            IndicatorRule::Macd {
                fast,
                slow,
                signal,
                weights,
            } => macd(id, candles, (*fast, *slow, *signal), weights),
            IndicatorRule::Stochastic {
                period,
                smoothing,
                oversold,
                overbought,
            } => stochastic(id, candles, *period, *smoothing, *oversold, *overbought),
            IndicatorRule::Roc { period } => roc(id, candles, *period),
            IndicatorRule::Bollinger {
                period,
                std_dev,
                squeeze_history,
            } => bollinger(id, candles, *period, *std_dev, *squeeze_history),
            IndicatorRule::AtrExpansion { period, ratio } => {
                atr_expansion(id, candles, *period, *ratio)
            }
            IndicatorRule::Obv { period, min_change } => obv(id, candles, *period, *min_change),
            IndicatorRule::Vwap { period } => vwap(id, candles, *period),
            IndicatorRule::VolumeSpike { period, ratio } => {
                volume_spike(id, candles, *period, *ratio)
            }
            IndicatorRule::SupportResistance {
                lookback,
                pivot_width,
                proximity_atr,
            } => support_resistance(id, candles, *lookback, *pivot_width, *proximity_atr),
            IndicatorRule::RangeBreakout { period } => range_breakout(id, candles, *period),
            IndicatorRule::SessionMomentum { lookback } => {
                asset::session_momentum(id, candles, *lookback)
            }
            IndicatorRule::Jump { period, ratio } => asset::jump(id, candles, *period, *ratio),
            IndicatorRule::Spike { period, ratio } => asset::spike(id, candles, *period, *ratio),
            IndicatorRule::FairValueGap {
                lookback,
                min_gap_atr,
            } => smart_money::fair_value_gap(id, candles, *lookback, *min_gap_atr),
            IndicatorRule::OrderBlock {
                lookback,
                impulse_atr,
            } => smart_money::order_block(id, candles, *lookback, *impulse_atr),
            IndicatorRule::LiquiditySweep {
                lookback,
                pivot_width,
            } => smart_money::liquidity_sweep(id, candles, *lookback, *pivot_width),
        };

        match signal {
            Some(s) if !s.strength.is_finite() => Err(DetectorError::Computation(format!(
                "{} produced non-finite strength",
                id
            ))),
            other => Ok(other),
        }
    }
}

/// ATR over `candles`, `None` when flat
pub(crate) fn atr(candles: &[Candle]) -> Option<f64> {
    volatility::calculate_atr(candles, ATR_PERIOD)
        .map(|a| a.value)
        .filter(|v| *v > 0.0)
}

pub(crate) fn body_direction(candle: &Candle) -> Direction {
    Direction::from_sign(candle.close - candle.open)
}

fn last_close(candles: &[Candle]) -> f64 {
    candles[candles.len() - 1].close
}

fn ema_cross(id: &str, candles: &[Candle], fast: u32, slow: u32) -> Option<Signal> {
    let direction = match trend::check_ema_cross(candles, fast, slow)? {
        1 => Direction::Bullish,
        -1 => Direction::Bearish,
        _ => return None,
    };
    let fast_ema = trend::calculate_ema(candles, fast)?.value;
    let slow_ema = trend::calculate_ema(candles, slow)?.value;
    let atr = atr(candles)?;
    let strength = math::unit((fast_ema - slow_ema).abs() / (2.0 * atr));

    Some(
        Signal::new(id, SignalCategory::Trend, direction, strength)
            .with_evidence("fast_ema", fast_ema)
            .with_evidence("slow_ema", slow_ema)
            .with_evidence("atr", atr),
    )
}

fn adx(id: &str, candles: &[Candle], period: u32, threshold: f64) -> Option<Signal> {
    let adx = trend::calculate_adx(candles, period)?;
    if adx.value < threshold {
        return None;
    }
    let direction = Direction::from_sign(adx.plus_di - adx.minus_di);
    if direction == Direction::Neutral {
        return None;
    }
    Some(
        Signal::new(id, SignalCategory::Trend, direction, math::unit(adx.value / 50.0))
            .with_evidence("adx", adx.value)
            .with_evidence("plus_di", adx.plus_di)
            .with_evidence("minus_di", adx.minus_di),
    )
}

fn supertrend(id: &str, candles: &[Candle], period: u32, multiplier: f64) -> Option<Signal> {
    let st = structure::calculate_supertrend(candles, period, multiplier)?;
    let atr = atr(candles)?;
    let close = last_close(candles);
    let direction = if st.trend == 1 {
        Direction::Bullish
    } else {
        Direction::Bearish
    };
    let strength = math::unit((close - st.value).abs() / (multiplier * atr));
    Some(
        Signal::new(id, SignalCategory::Trend, direction, strength)
            .with_evidence("supertrend", st.value)
            .with_evidence("close", close),
    )
}

fn price_slope(id: &str, candles: &[Candle], period: u32) -> Option<Signal> {
    let slope = trend::calculate_slope(candles, period)?;
    let atr = atr(candles)?;
    let drift = slope.slope * (period as f64 - 1.0);
    if drift == 0.0 {
        return None;
    }
    Some(
        Signal::new(
            id,
            SignalCategory::Trend,
            Direction::from_sign(drift),
            math::unit(drift.abs() / (3.0 * atr)),
        )
        .with_evidence("slope", slope.slope)
        .with_evidence("drift_atr", drift / atr),
    )
}

fn rsi(id: &str, candles: &[Candle], period: u32, oversold: f64, overbought: f64) -> Option<Signal> {
    let rsi = momentum::calculate_rsi(candles, period)?;
    let (direction, strength) = if rsi.value <= oversold {
        (
            Direction::Bullish,
            0.5 + 0.5 * (oversold - rsi.value) / oversold,
        )
    } else if rsi.value >= overbought {
        (
            Direction::Bearish,
            0.5 + 0.5 * (rsi.value - overbought) / (100.0 - overbought),
        )
    } else {
        return None;
    };
    Some(
        Signal::new(id, SignalCategory::Momentum, direction, math::unit(strength))
            .with_evidence("rsi", rsi.value),
    )
}

fn macd(
    id: &str,
    candles: &[Candle],
    (fast, slow, signal): (u32, u32, u32),
    weights: &MacdWeights,
) -> Option<Signal> {
    let m = momentum::calculate_macd(candles, fast, slow, signal)?;
    if m.histogram == 0.0 {
        return None;
    }
    let atr = atr(candles)?;

    let fresh_cross = m.prev_histogram != 0.0 && m.histogram.signum() != m.prev_histogram.signum();
    let crossover_score = if fresh_cross { 1.0 } else { 0.5 };
    let distance_score = math::unit(m.histogram.abs() / (0.5 * atr));
    let momentum_score = if m.histogram.abs() > m.prev_histogram.abs() {
        1.0
    } else {
        0.3
    };
    let strength = weights.crossover_weight * crossover_score
        + weights.distance_weight * distance_score
        + weights.histogram_momentum_weight * momentum_score;

    Some(
        Signal::new(
            id,
            SignalCategory::Momentum,
            Direction::from_sign(m.histogram),
            math::unit(strength),
        )
        .with_evidence("macd", m.macd)
        .with_evidence("signal", m.signal)
        .with_evidence("histogram", m.histogram),
    )
}

fn stochastic(
    id: &str,
    candles: &[Candle],
    period: u32,
    smoothing: u32,
    oversold: f64,
    overbought: f64,
) -> Option<Signal> {
    let s = momentum::calculate_stochastic(candles, period, smoothing)?;
    let (direction, strength) = if s.k <= oversold {
        (Direction::Bullish, 0.5 + 0.5 * (oversold - s.k) / oversold)
    } else if s.k >= overbought {
        (
            Direction::Bearish,
            0.5 + 0.5 * (s.k - overbought) / (100.0 - overbought),
        )
    } else {
        return None;
    };
    Some(
        Signal::new(id, SignalCategory::Momentum, direction, math::unit(strength))
            .with_evidence("k", s.k)
            .with_evidence("d", s.d),
    )
}

fn roc(id: &str, candles: &[Candle], period: u32) -> Option<Signal> {
    let r = momentum::calculate_roc(candles, period)?;
    let atr = atr(candles)?;
    let past = candles[candles.len() - 1 - period as usize].close;
    let change = last_close(candles) - past;
    if change == 0.0 {
        return None;
    }
    let strength = math::unit(change.abs() / (atr * (period as f64).sqrt()));
    Some(
        Signal::new(
            id,
            SignalCategory::Momentum,
            Direction::from_sign(change),
            strength,
        )
        .with_evidence("roc_pct", r.value),
    )
}

fn bollinger(
    id: &str,
    candles: &[Candle],
    period: u32,
    std_dev: f64,
    squeeze_history: usize,
) -> Option<Signal> {
    let bands = volatility::calculate_bollinger_bands(candles, period, std_dev)?;
    let close = last_close(candles);
    let half_width = (bands.upper - bands.middle).max(f64::EPSILON);

    let (direction, strength) = if close > bands.upper {
        (
            Direction::Bullish,
            0.5 + 0.5 * (close - bands.upper) / half_width,
        )
    } else if close < bands.lower {
        (
            Direction::Bearish,
            0.5 + 0.5 * (bands.lower - close) / half_width,
        )
    } else {
        // Contraction to the narrowest band in the lookback reads as a squeeze.
        let history =
            volatility::bollinger_bandwidth_history(candles, period, std_dev, squeeze_history);
        let narrowest = history.iter().copied().fold(f64::MAX, f64::min);
        if history.len() < 10 || bands.bandwidth > narrowest {
            return None;
        }
        (Direction::Neutral, 0.5)
    };

    Some(
        Signal::new(id, SignalCategory::Volatility, direction, math::unit(strength))
            .with_evidence("upper", bands.upper)
            .with_evidence("lower", bands.lower)
            .with_evidence("bandwidth", bands.bandwidth),
    )
}

fn atr_expansion(id: &str, candles: &[Candle], period: u32, ratio: f64) -> Option<Signal> {
    let n = candles.len();
    let prior_atr = volatility::calculate_atr(&candles[..n - 1], period)?.value;
    if prior_atr <= 0.0 {
        return None;
    }
    let last = &candles[n - 1];
    let tr = math::true_range(last.high, last.low, candles[n - 2].close);
    let expansion = tr / prior_atr;
    if expansion < ratio {
        return None;
    }
    let strength = math::unit((expansion - 1.0) / (2.0 * (ratio - 1.0).max(f64::EPSILON)));
    Some(
        Signal::new(id, SignalCategory::Volatility, body_direction(last), strength)
            .with_evidence("true_range", tr)
            .with_evidence("atr", prior_atr),
    )
}

fn obv(id: &str, candles: &[Candle], period: u32, min_change: f64) -> Option<Signal> {
    let o = volume::calculate_obv(candles, period)?;
    if o.change_ratio.abs() < min_change {
        return None;
    }
    Some(
        Signal::new(
            id,
            SignalCategory::Volume,
            Direction::from_sign(o.change_ratio),
            math::unit(o.change_ratio.abs()),
        )
        .with_evidence("obv", o.value)
        .with_evidence("change_ratio", o.change_ratio),
    )
}

fn vwap(id: &str, candles: &[Candle], period: u32) -> Option<Signal> {
    let v = volume::calculate_vwap(candles, period)?;
    let atr = atr(candles)?;
    let diff = last_close(candles) - v.value;
    if diff == 0.0 {
        return None;
    }
    Some(
        Signal::new(
            id,
            SignalCategory::Volume,
            Direction::from_sign(diff),
            math::unit(diff.abs() / (2.0 * atr)),
        )
        .with_evidence("vwap", v.value),
    )
}

fn volume_spike(id: &str, candles: &[Candle], period: u32, ratio: f64) -> Option<Signal> {
    let v = volume::calculate_volume_ma(candles, period)?;
    if v.volume_ma <= 0.0 {
        return None;
    }
    let multiple = v.volume / v.volume_ma;
    if multiple < ratio {
        return None;
    }
    let last = &candles[candles.len() - 1];
    let strength = math::unit((multiple - 1.0) / (2.0 * (ratio - 1.0).max(f64::EPSILON)));
    Some(
        Signal::new(id, SignalCategory::Volume, body_direction(last), strength)
            .with_evidence("volume", v.volume)
            .with_evidence("volume_ma", v.volume_ma),
    )
}

fn support_resistance(
    id: &str,
    candles: &[Candle],
    lookback: usize,
    pivot_width: usize,
    proximity_atr: f64,
) -> Option<Signal> {
    let close = last_close(candles);
    let sr = structure::calculate_support_resistance(candles, lookback, pivot_width, close)?;
    let band = proximity_atr * atr(candles)?;

    let near_support = sr.support_level.map(|s| close - s).filter(|d| *d <= band);
    let near_resistance = sr.resistance_level.map(|r| r - close).filter(|d| *d <= band);

    let (direction, distance, level) = match (near_support, near_resistance) {
        (Some(ds), Some(dr)) if ds == dr => return None,
        (Some(ds), Some(dr)) if dr < ds => (Direction::Bearish, dr, sr.resistance_level?),
        (Some(ds), _) => (Direction::Bullish, ds, sr.support_level?),
        (None, Some(dr)) => (Direction::Bearish, dr, sr.resistance_level?),
        (None, None) => return None,
    };

    Some(
        Signal::new(
            id,
            SignalCategory::SupportResistance,
            direction,
            math::unit(0.5 + 0.5 * (1.0 - distance / band)),
        )
        .with_evidence("level", level)
        .with_evidence("distance", distance),
    )
}

fn range_breakout(id: &str, candles: &[Candle], period: u32) -> Option<Signal> {
    let channel = structure::calculate_donchian(candles, period)?;
    let atr = atr(candles)?;
    let close = last_close(candles);
    let (direction, excess) = if close > channel.upper {
        (Direction::Bullish, close - channel.upper)
    } else if close < channel.lower {
        (Direction::Bearish, channel.lower - close)
    } else {
        return None;
    };
    Some(
        Signal::new(
            id,
            SignalCategory::SupportResistance,
            direction,
            math::unit(0.5 + 0.5 * excess / atr),
        )
        .with_evidence("channel_high", channel.upper)
        .with_evidence("channel_low", channel.lower),
    )
}
