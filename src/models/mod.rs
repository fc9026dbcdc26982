//! Shared data models spanning the engine layers.

pub mod candle;
pub mod decision;
pub mod indicators;
pub mod signal;
pub mod structure;

pub use candle::{Candle, CandleWindow};
pub use decision::{Decision, Rating, SetupStatus, SignalReason};
pub use indicators::*;
pub use signal::{Direction, Signal, SignalCategory};
pub use structure::{StructureEvent, StructureState, SwingKind, SwingPoint, TrendLabel};
