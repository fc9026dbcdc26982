//! Price-structure indicators: SuperTrend, support/resistance, Donchian channel

pub mod donchian;
pub mod supertrend;
pub mod support_resistance;

pub use donchian::*;
pub use supertrend::*;
pub use support_resistance::*;
