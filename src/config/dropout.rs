//! Dropout layer configuration.
//!
//! Dropout zeroes a random fraction of activations during training as a
//! regularizer. It is element-wise and layout-agnostic: any input layout
//! passes through unchanged, and there are no parameters to allocate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{LayerBase, NetworkContext};
use crate::error::{ConfigurationError, NetworkError};
use crate::inputs::InputType;
use crate::layers::{DropoutLayer, Layer};
use crate::listeners::TrainingListener;
use crate::params::{DropoutInitializer, ParamInitializer};
use crate::preprocessor::InputPreProcessor;

fn default_drop_rate() -> f32 {
    0.5
}

/// Configuration of a dropout layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropoutConfig {
    #[serde(flatten)]
    pub base: LayerBase,

    /// Probability of dropping each unit during training. Meaningful range
    /// [0, 1); default 0.5. Stored as given, never validated.
    #[serde(default = "default_drop_rate")]
    pub drop_rate: f32,
}

impl DropoutConfig {
    pub fn builder() -> DropoutBuilder {
        DropoutBuilder::new()
    }

    /// Layer name for logs and error messages.
    pub fn display_name(&self) -> &str {
        self.base.name.as_deref().unwrap_or("dropout")
    }

    /// Output layout for the given input layout: identical to the input.
    pub fn output_type(&self, input: InputType) -> Result<InputType, ConfigurationError> {
        Ok(input)
    }

    /// Input size this layer would resolve from `input`: the size for
    /// feed-forward input, the channel depth for spatial input.
    pub fn resolve_n_in(&self, input: InputType) -> Result<usize, ConfigurationError> {
        Ok(match input {
            InputType::FeedForward { size } => size,
            InputType::Convolutional { depth, .. } => depth,
            InputType::ConvolutionalFlat { depth, .. } => depth,
        })
    }

    /// Resolve `n_in` and `n_out` from the input layout.
    ///
    /// Takes effect only when `n_in` is unresolved or `force` is set. Both
    /// dimensions are assigned together or not at all.
    pub fn set_n_in(&mut self, input: InputType, force: bool) -> Result<(), ConfigurationError> {
        if self.base.n_in > 0 && !force {
            return Ok(());
        }
        let n_in = self.resolve_n_in(input)?;
        self.base.n_in = n_in;
        self.base.n_out = n_in;
        Ok(())
    }

    /// Dropout is element-wise, so no adapter is ever needed.
    pub fn preprocessor_for(&self, _input: InputType) -> Option<InputPreProcessor> {
        None
    }

    /// Length of the parameter buffer view this layer requires: zero.
    pub fn param_len(&self) -> usize {
        DropoutInitializer.required_len(self)
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

    /// Bind this configuration to the network and produce the runtime layer.
    /// Dropout owns no parameters, so the view is only length-checked.
    pub fn instantiate(
        &self,
        ctx: &NetworkContext,
        listeners: &[Arc<dyn TrainingListener>],
        index: usize,
        view: &mut [f32],
        initialize: bool,
    ) -> Result<Box<dyn Layer>, NetworkError> {
        self.validate()?;
        let table = DropoutInitializer.init(self, ctx, index, view, initialize)?;
        Ok(Box::new(DropoutLayer::new(
            self.clone(),
            index,
            listeners.to_vec(),
            table,
        )))
    }
}

/// Builder for [`DropoutConfig`]. Setters store without validation.
#[derive(Debug, Clone)]
pub struct DropoutBuilder {
    name: Option<String>,
    n_in: usize,
    n_out: usize,
    drop_rate: f32,
}

impl Default for DropoutBuilder {
    fn default() -> Self {
        Self {
            name: None,
            n_in: 0,
            n_out: 0,
            drop_rate: default_drop_rate(),
        }
    }
}

impl DropoutBuilder {
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

    pub fn drop_rate(mut self, drop_rate: f32) -> Self {
        self.drop_rate = drop_rate;
        self
    }

    /// Freeze into an immutable configuration. No validation happens here.
    pub fn build(self) -> DropoutConfig {
        DropoutConfig {
            base: LayerBase {
                name: self.name,
                n_in: self.n_in,
                n_out: self.n_out,
            },
            drop_rate: self.drop_rate,
        }
    }
}
