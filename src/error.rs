//! Error types for configuration, shape inference, and instantiation.
//!
//! Failures split into two phases: `ConfigurationError` covers everything that
//! can go wrong while shapes are being reconciled, `ParameterSizeError` covers
//! the instantiation step that binds a layer to its parameter buffer view.
//! `NetworkError` wraps both plus the file-level failures of the assembly API.

use thiserror::Error;

use crate::inputs::InputType;

/// Raised while reconciling layer configurations against the shapes flowing
/// through the network. Never deferred: planning either completes with every
/// dimension resolved or fails with one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The layer or adapter cannot accept the given input layout.
    #[error("{component}: unsupported input type {got}, expected {expected}")]
    UnsupportedInputType {
        component: String,
        expected: &'static str,
        got: InputType,
    },

    /// A configured size disagrees with the size implied by the input.
    #[error("{component}: size mismatch, expected {expected} but got {actual}")]
    ShapeMismatch {
        component: String,
        expected: usize,
        actual: usize,
    },

    /// The architecture does not declare what enters the first layer.
    #[error("architecture does not declare an input type")]
    MissingInputType,

    /// The architecture has no layers.
    #[error("architecture must have at least one layer")]
    EmptyArchitecture,

    /// A dimension is still unresolved where a concrete value is required.
    #[error("{layer}: {dim} is unresolved")]
    InvalidDimension { layer: String, dim: &'static str },
}

/// Raised when a parameter buffer view is too small for the layer it is
/// supposed to back. Checked before any write, so a failed instantiation
/// leaves the buffer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{layer}: parameter view too small, required {required} but got {actual}")]
pub struct ParameterSizeError {
    pub layer: String,
    pub required: usize,
    pub actual: usize,
}

/// Umbrella error for network assembly and architecture file IO.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    ParameterSize(#[from] ParameterSizeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid architecture file: {0}")]
    Json(#[from] serde_json::Error),
}
