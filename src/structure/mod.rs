//! Market structure: swing extraction and the BOS / CHOCH state machine.

pub mod swings;
pub mod tracker;

pub use swings::{extract_swings, SwingSequence};
pub use tracker::{StructureConfig, StructureTracker};
