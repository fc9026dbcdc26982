//! Candles and the validated, read-only window detectors consume.

use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            timestamp,
        }
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.body_high()
    }

    pub fn lower_wick(&self) -> f64 {
        self.body_low() - self.low
    }

    pub fn body_midpoint(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    fn violation(&self) -> Option<&'static str> {
        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Some("non-finite price or volume");
        }
        if self.volume < 0.0 {
            return Some("negative volume");
        }
        if self.low > self.body_low() || self.body_high() > self.high {
            return Some("low <= min(open, close) <= max(open, close) <= high violated");
        }
        None
    }
}

/// Ordered series of candles, read-only to detectors.
///
/// Every candle satisfies the OHLC ordering and timestamps strictly increase.
/// [`CandleWindow::new`] checks the whole series; [`CandleWindow::push`]
/// checks only the appended candle against the last one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleWindow {
    candles: Vec<Candle>,
}

impl CandleWindow {
    pub fn new(candles: Vec<Candle>) -> Result<Self, AnalysisError> {
        if candles.is_empty() {
            return Err(AnalysisError::invalid_window("window is empty"));
        }
        for (i, candle) in candles.iter().enumerate() {
            if let Some(reason) = candle.violation() {
                return Err(AnalysisError::invalid_window(format!(
                    "candle {} at {}: {}",
                    i, candle.timestamp, reason
                )));
            }
        }
        if let Some(i) = candles
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(AnalysisError::invalid_window(format!(
                "timestamps not strictly increasing at index {}",
                i + 1
            )));
        }
        Ok(Self { candles })
    }

    /// Append `candle` after the current last candle
    pub fn push(&mut self, candle: Candle) -> Result<(), AnalysisError> {
        if let Some(reason) = candle.violation() {
            return Err(AnalysisError::invalid_window(format!(
                "candle {} at {}: {}",
                self.candles.len(),
                candle.timestamp,
                reason
            )));
        }
        if candle.timestamp <= self.last().timestamp {
            return Err(AnalysisError::invalid_window(format!(
                "timestamps not strictly increasing at index {}",
                self.candles.len()
            )));
        }
        self.candles.push(candle);
        Ok(())
    }

    /// Drop the oldest candles so at most `capacity` remain. A window never
    /// shrinks below one candle.
    pub fn keep_last(&mut self, capacity: usize) {
        let excess = self.candles.len().saturating_sub(capacity.max(1));
        self.candles.drain(..excess);
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Most recent candle. A window always holds at least one.
    pub fn last(&self) -> &Candle {
        &self.candles[self.candles.len() - 1]
    }

    /// The last `n` candles (or all of them if shorter)
    pub fn tail(&self, n: usize) -> &[Candle] {
        &self.candles[self.candles.len().saturating_sub(n)..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

impl<'de> Deserialize<'de> for CandleWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            candles: Vec<Candle>,
        }
        let raw = Raw::deserialize(deserializer)?;
        CandleWindow::new(raw.candles).map_err(serde::de::Error::custom)
    }
}
