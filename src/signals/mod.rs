//! Category weighting, confluence aggregation and the analysis engine.

pub mod aggregation;
pub mod categories;
pub mod engine;
pub mod scoring;
pub mod timeframes;

pub use aggregation::*;
pub use categories::*;
pub use engine::*;
pub use scoring::*;
pub use timeframes::*;
