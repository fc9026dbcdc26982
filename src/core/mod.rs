//! Runtime primitives around the engine.

pub mod runtime;

pub use runtime::*;
