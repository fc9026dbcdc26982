//! Collaborators that feed the engine.

pub mod market_data;

pub use market_data::*;
