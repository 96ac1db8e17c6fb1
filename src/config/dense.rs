//! Dense (fully connected) layer configuration.
//!
//! A dense layer maps `n_in` input features to `n_out` output features
//! through a weight matrix and a bias vector. It consumes vector activations:
//! spatial input has to be flattened first, which the planner arranges by
//! inserting the appropriate adapter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{LayerBase, NetworkContext};
use crate::error::{ConfigurationError, NetworkError};
use crate::inputs::InputType;
use crate::layers::{DenseLayer, Layer};
use crate::listeners::TrainingListener;
use crate::params::{DenseInitializer, ParamInitializer};
use crate::preprocessor::InputPreProcessor;

/// Configuration of a dense layer.
///
/// Unlike the shape-preserving layers, `n_out` is chosen by the caller and is
/// never derived from the input; only `n_in` is resolved during planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseConfig {
    #[serde(flatten)]
    pub base: LayerBase,
}

impl DenseConfig {
    pub fn builder() -> DenseBuilder {
        DenseBuilder::new()
    }

    /// Layer name for logs and error messages.
    pub fn display_name(&self) -> &str {
        self.base.name.as_deref().unwrap_or("dense")
    }

    /// Output layout for the given input layout: always a feed-forward vector
    /// of `n_out` features.
    ///
    /// Spatial input is rejected; it must be flattened by an adapter before
    /// reaching this layer.
    pub fn output_type(&self, input: InputType) -> Result<InputType, ConfigurationError> {
        match input {
            InputType::FeedForward { .. } | InputType::ConvolutionalFlat { .. } => {
                Ok(InputType::feed_forward(self.base.n_out))
            }
            InputType::Convolutional { .. } => Err(self.unsupported(input)),
        }
    }

    /// Input size this layer would resolve from `input`.
    pub fn resolve_n_in(&self, input: InputType) -> Result<usize, ConfigurationError> {
        match input {
            InputType::FeedForward { size } => Ok(size),
            InputType::ConvolutionalFlat { .. } => Ok(input.flattened_size()),
            InputType::Convolutional { .. } => Err(self.unsupported(input)),
        }
    }

    /// Resolve `n_in` from the input layout; `n_out` is never touched.
    ///
    /// Takes effect only when `n_in` is unresolved or `force` is set. On
    /// failure nothing is assigned.
    pub fn set_n_in(&mut self, input: InputType, force: bool) -> Result<(), ConfigurationError> {
        if self.base.n_in > 0 && !force {
            return Ok(());
        }
        self.base.n_in = self.resolve_n_in(input)?;
        Ok(())
    }

    /// Adapter required in front of this layer for the given input, if any.
    ///
    /// Spatial input is flattened; everything else is already consumable.
    pub fn preprocessor_for(&self, input: InputType) -> Option<InputPreProcessor> {
        match input {
            InputType::Convolutional {
                height,
                width,
                depth,
            } => Some(InputPreProcessor::cnn_to_feed_forward(height, width, depth)),
            _ => None,
        }
    }

    /// Length of the parameter buffer view this layer requires.
    pub fn param_len(&self) -> usize {
        DenseInitializer.required_len(self)
    }

    /// Check that both dimensions have been resolved.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.base.n_in == 0 {
            return Err(ConfigurationError::InvalidDimension {
                layer: self.display_name().to_string(),
                dim: "n_in",
            });
        }
        if self.base.n_out == 0 {
            return Err(ConfigurationError::InvalidDimension {
                layer: self.display_name().to_string(),
                dim: "n_out",
            });
        }
        Ok(())
    }

    /// Bind this configuration to a region of the parameter buffer and
    /// produce the runtime layer.
    pub fn instantiate(
        &self,
        ctx: &NetworkContext,
        listeners: &[Arc<dyn TrainingListener>],
        index: usize,
        view: &mut [f32],
        initialize: bool,
    ) -> Result<Box<dyn Layer>, NetworkError> {
        self.validate()?;
        let table = DenseInitializer.init(self, ctx, index, view, initialize)?;
        Ok(Box::new(DenseLayer::new(
            self.clone(),
            index,
            listeners.to_vec(),
            table,
        )))
    }

    fn unsupported(&self, got: InputType) -> ConfigurationError {
        ConfigurationError::UnsupportedInputType {
            component: self.display_name().to_string(),
            expected: "feed-forward or flattened convolutional",
            got,
        }
    }
}

/// Builder for [`DenseConfig`]. Setters store without validation.
#[derive(Debug, Clone, Default)]
pub struct DenseBuilder {
    name: Option<String>,
    n_in: usize,
    n_out: usize,
}

impl DenseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn n_in(mut self, n_in: usize) -> Self {
        self.n_in = n_in;
        self
    }

    pub fn n_out(mut self, n_out: usize) -> Self {
        self.n_out = n_out;
        self
    }

    /// Freeze into an immutable configuration. No validation happens here.
    pub fn build(self) -> DenseConfig {
        DenseConfig {
            base: LayerBase {
                name: self.name,
                n_in: self.n_in,
                n_out: self.n_out,
            },
        }
    }
}
