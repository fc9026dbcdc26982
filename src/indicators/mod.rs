//! Pure indicator calculations over candle slices.
//!
//! Every `calculate_*` function returns `None` when the slice is shorter than
//! the indicator's lookback.

pub mod momentum;
pub mod structure;
pub mod trend;
pub mod volatility;
pub mod volume;
