//! Shared utilities.
//!
//! Currently hosts the deterministic RNG used for parameter initialization.

pub mod rng;

pub use rng::SimpleRng;
