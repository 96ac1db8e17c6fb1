//! Layer Configuration and Shape Inference Library
//!
//! This library provides declarative configuration for layered neural networks:
//! layer hyperparameters with fluent builders, input type propagation through a
//! layer chain, parameter layout over a single flat buffer, and assembly of
//! configured layers into a runnable network.
//!
//! # Modules
//!
//! - `architecture`: Architecture configuration, planning, and network assembly
//! - `config`: Layer configuration structures and builders (BatchNorm, Dense, Dropout)
//! - `error`: Configuration and assembly error types
//! - `inputs`: Input type descriptors (feed-forward, convolutional, flattened)
//! - `layers`: Layer trait and instantiated layer implementations
//! - `listeners`: Training progress listener trait
//! - `params`: Parameter views, tables, and initializers over the flat buffer
//! - `preprocessor`: Adapters between mismatched layer input layouts
//! - `utils`: Shared utilities (RNG)

pub mod architecture;
pub mod config;
pub mod error;
pub mod inputs;
pub mod layers;
pub mod listeners;
pub mod params;
pub mod preprocessor;
pub mod utils;
