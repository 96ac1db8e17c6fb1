//! Layer configuration variants and builders.
//!
//! Every layer type has a configuration struct, a builder pre-populated with
//! that type's defaults, and a variant in the closed [`LayerConfig`] enum the
//! planner and serializer work with. Configurations are plain values: cheap
//! to clone, compare, and serialize, with no behavior beyond shape inference
//! and instantiation.

pub mod batchnorm;
pub mod dense;
pub mod dropout;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, NetworkError};
use crate::inputs::InputType;
use crate::layers::Layer;
use crate::listeners::TrainingListener;
use crate::preprocessor::InputPreProcessor;
use crate::utils::SimpleRng;

pub use batchnorm::{BatchNormBuilder, BatchNormConfig};
pub use dense::{DenseBuilder, DenseConfig};
pub use dropout::{DropoutBuilder, DropoutConfig};

/// Fields shared by every layer configuration.
///
/// `n_in == 0` means the input size has not been resolved yet; planning fills
/// it in through `set_n_in`. Once a network is planned, both dimensions are
/// concrete and the configuration is effectively immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerBase {
    /// Optional layer name used in logs and error messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Number of input features (0 = unresolved).
    #[serde(default)]
    pub n_in: usize,
    /// Number of output features (0 = unresolved).
    #[serde(default)]
    pub n_out: usize,
}

/// Closed set of layer configurations.
///
/// Serialized with an explicit `layer_type` discriminator:
///
/// ```json
/// { "layer_type": "batchnorm", "n_in": 256, "n_out": 256, "eps": 1e-5 }
/// ```
///
/// Unknown discriminators fail deserialization; missing hyperparameter fields
/// fall back to the same defaults the builders use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer_type", rename_all = "lowercase")]
pub enum LayerConfig {
    BatchNorm(BatchNormConfig),
    Dense(DenseConfig),
    Dropout(DropoutConfig),
}

impl LayerConfig {
    /// Shared base fields of the underlying variant.
    pub fn base(&self) -> &LayerBase {
        match self {
            LayerConfig::BatchNorm(c) => &c.base,
            LayerConfig::Dense(c) => &c.base,
            LayerConfig::Dropout(c) => &c.base,
        }
    }

    /// Layer name for logs and error messages: the configured name, or the
    /// variant noun when none was given.
    pub fn display_name(&self) -> &str {
        match self {
            LayerConfig::BatchNorm(c) => c.display_name(),
            LayerConfig::Dense(c) => c.display_name(),
            LayerConfig::Dropout(c) => c.display_name(),
        }
    }

    /// Output layout this layer produces for the given input layout.
    pub fn output_type(&self, input: InputType) -> Result<InputType, ConfigurationError> {
        match self {
            LayerConfig::BatchNorm(c) => c.output_type(input),
            LayerConfig::Dense(c) => c.output_type(input),
            LayerConfig::Dropout(c) => c.output_type(input),
        }
    }

    /// Input size this layer would resolve from `input`, without assigning it.
    pub fn resolve_n_in(&self, input: InputType) -> Result<usize, ConfigurationError> {
        match self {
            LayerConfig::BatchNorm(c) => c.resolve_n_in(input),
            LayerConfig::Dense(c) => c.resolve_n_in(input),
            LayerConfig::Dropout(c) => c.resolve_n_in(input),
        }
    }

    /// Resolve this layer's dimensions from the input layout.
    ///
    /// A no-op when `n_in` is already set, unless `force` re-resolves it.
    /// Assignment is all-or-nothing: a failed resolution changes nothing.
    pub fn set_n_in(&mut self, input: InputType, force: bool) -> Result<(), ConfigurationError> {
        match self {
            LayerConfig::BatchNorm(c) => c.set_n_in(input, force),
            LayerConfig::Dense(c) => c.set_n_in(input, force),
            LayerConfig::Dropout(c) => c.set_n_in(input, force),
        }
    }

    /// Adapter required in front of this layer for the given input, if any.
    pub fn preprocessor_for(&self, input: InputType) -> Option<InputPreProcessor> {
        match self {
            LayerConfig::BatchNorm(c) => c.preprocessor_for(input),
            LayerConfig::Dense(c) => c.preprocessor_for(input),
            LayerConfig::Dropout(c) => c.preprocessor_for(input),
        }
    }

    /// Length of the parameter buffer view this layer requires.
    pub fn param_len(&self) -> usize {
        match self {
            LayerConfig::BatchNorm(c) => c.param_len(),
            LayerConfig::Dense(c) => c.param_len(),
            LayerConfig::Dropout(c) => c.param_len(),
        }
    }

    /// Check that the layer's dimensions have been resolved.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            LayerConfig::BatchNorm(c) => c.validate(),
            LayerConfig::Dense(c) => c.validate(),
            LayerConfig::Dropout(c) => c.validate(),
        }
    }

    /// Bind this configuration to a region of the parameter buffer and
    /// produce the runtime layer.
    ///
    /// `view` is the layer's slice of the network-owned flat buffer. With
    /// `initialize` set the paired initializer writes initial values; without
    /// it the buffer contents are adopted as-is (restore). The listener set
    /// is recorded on the layer and is immutable afterwards.
    pub fn instantiate(
        &self,
        ctx: &NetworkContext,
        listeners: &[Arc<dyn TrainingListener>],
        index: usize,
        view: &mut [f32],
        initialize: bool,
    ) -> Result<Box<dyn Layer>, NetworkError> {
        match self {
            LayerConfig::BatchNorm(c) => c.instantiate(ctx, listeners, index, view, initialize),
            LayerConfig::Dense(c) => c.instantiate(ctx, listeners, index, view, initialize),
            LayerConfig::Dropout(c) => c.instantiate(ctx, listeners, index, view, initialize),
        }
    }
}

impl From<BatchNormConfig> for LayerConfig {
    fn from(conf: BatchNormConfig) -> Self {
        LayerConfig::BatchNorm(conf)
    }
}

impl From<DenseConfig> for LayerConfig {
    fn from(conf: DenseConfig) -> Self {
        LayerConfig::Dense(conf)
    }
}

impl From<DropoutConfig> for LayerConfig {
    fn from(conf: DropoutConfig) -> Self {
        LayerConfig::Dropout(conf)
    }
}

/// Network-wide settings handed to every layer at instantiation.
#[derive(Debug, Clone)]
pub struct NetworkContext {
    seed: u64,
}

impl NetworkContext {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Deterministic RNG for the layer at `index`.
    ///
    /// Each layer draws from its own stream, so layers can be instantiated in
    /// any order (or concurrently, spans being disjoint) with identical
    /// results.
    pub fn layer_rng(&self, index: usize) -> SimpleRng {
        let stream = (index as u64 + 1).wrapping_mul(0x9e3779b97f4a7c15);
        SimpleRng::new(self.seed ^ stream)
    }
}
