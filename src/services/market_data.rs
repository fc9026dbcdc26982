//! Candle window supply for the engine.

use crate::error::AnalysisError;
use crate::models::{Candle, CandleWindow};
use crate::signals::timeframes::Timeframe;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Source of candle windows. Implementations own caching and staleness;
/// the engine only ever sees the returned window.
pub trait WindowSource: Send + Sync {
    /// Latest window for `symbol` on `timeframe`, or
    /// [`AnalysisError::DataUnavailable`] if fewer than `min_length` candles exist.
    fn get_window(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        min_length: usize,
    ) -> Result<CandleWindow, AnalysisError>;
}

/// Window source backed by a map, for tests and replay
#[derive(Debug, Default)]
pub struct InMemoryWindowSource {
    windows: RwLock<HashMap<(String, Timeframe), CandleWindow>>,
    /// Keep at most this many candles per series, 0 for unbounded
    capacity: usize,
}

impl InMemoryWindowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Replace the series for `symbol` / `timeframe`
    pub fn insert(&self, symbol: &str, timeframe: Timeframe, window: CandleWindow) {
        let mut window = window;
        self.trim(&mut window);
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        windows.insert((symbol.to_string(), timeframe), window);
    }

    /// Append one candle, keeping the series strictly time-ordered
    pub fn push(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candle: Candle,
    ) -> Result<(), AnalysisError> {
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        match windows.get_mut(&(symbol.to_string(), timeframe)) {
            Some(window) => {
                window.push(candle)?;
                self.trim(window);
            }
            None => {
                windows.insert(
                    (symbol.to_string(), timeframe),
                    CandleWindow::new(vec![candle])?,
                );
            }
        }
        Ok(())
    }

    fn trim(&self, window: &mut CandleWindow) {
        if self.capacity > 0 {
            window.keep_last(self.capacity);
        }
    }
}

impl WindowSource for InMemoryWindowSource {
    fn get_window(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        min_length: usize,
    ) -> Result<CandleWindow, AnalysisError> {
        let windows = self.windows.read().unwrap_or_else(|e| e.into_inner());
        let series = windows.get(&(symbol.to_string(), timeframe));
        let available = series.map(CandleWindow::len).unwrap_or(0);

        match series {
            Some(window) if window.len() >= min_length => {
                debug!(
                    symbol = %symbol,
                    timeframe = %timeframe,
                    candles = window.len(),
                    "InMemoryWindowSource: serving window"
                );
                Ok(window.clone())
            }
            _ => Err(AnalysisError::DataUnavailable {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
                available,
                required: min_length,
            }),
        }
    }
}
