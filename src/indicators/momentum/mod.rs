//! Momentum indicators: RSI, MACD, Stochastic, ROC

pub mod macd;
pub mod roc;
pub mod rsi;
pub mod stochastic;

pub use macd::*;
pub use roc::*;
pub use rsi::*;
pub use stochastic::*;
