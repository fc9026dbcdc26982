//! Trend indicators: EMA, ADX, regression slope

pub mod adx;
pub mod ema;
pub mod slope;

pub use adx::*;
pub use ema::*;
pub use slope::*;
