//! Batch normalization layer configuration.
//!
//! Batch normalization rescales activations per feature using statistics of
//! the current batch, then applies a learnable affine transformation
//! `y = gamma * x_norm + beta`. Running statistics are maintained alongside
//! via exponential moving average for use outside of training. This module
//! describes the layer; the arithmetic lives in the execution engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{LayerBase, NetworkContext};
use crate::error::{ConfigurationError, NetworkError};
use crate::inputs::InputType;
use crate::layers::{BatchNormLayer, Layer};
use crate::listeners::TrainingListener;
use crate::params::{BatchNormInitializer, ParamInitializer};
use crate::preprocessor::InputPreProcessor;

fn default_decay() -> f32 {
    0.9
}

fn default_eps() -> f32 {
    1e-5
}

fn default_gamma() -> f32 {
    1.0
}

fn default_beta() -> f32 {
    0.0
}

fn default_use_batch_mean() -> bool {
    true
}

/// Configuration of a batch normalization layer.
///
/// Shape-preserving: accepts feed-forward, convolutional, and flattened
/// convolutional inputs and emits the same layout it receives. For spatial
/// inputs, normalization is per channel, so `n_in`/`n_out` resolve to the
/// channel depth rather than the flattened size.
///
/// Hyperparameters are stored as given; ranges are documented but never
/// validated, matching the builder contract.
///
/// # Examples
///
/// ```
/// use layernet::config::BatchNormConfig;
///
/// let conf = BatchNormConfig::builder().gamma(2.0).beta(0.5).build();
/// assert_eq!(conf.decay, 0.9); // default
/// assert_eq!(conf.gamma, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchNormConfig {
    #[serde(flatten)]
    pub base: LayerBase,

    /// Weight of the old value in the running-statistics moving average.
    /// Meaningful range (0, 1); default 0.9.
    #[serde(default = "default_decay")]
    pub decay: f32,

    /// Stability constant added to the variance before the square root.
    /// Default 1e-5.
    #[serde(default = "default_eps")]
    pub eps: f32,

    /// Scale constant. Initial value of the learned scale, or the fixed scale
    /// when `lock_gamma_beta` is set. Default 1.0.
    #[serde(default = "default_gamma")]
    pub gamma: f32,

    /// Shift constant. Initial value of the learned shift, or the fixed shift
    /// when `lock_gamma_beta` is set. Default 0.0.
    #[serde(default = "default_beta")]
    pub beta: f32,

    /// Freeze gamma and beta at their configured constants instead of
    /// learning them. Default false.
    #[serde(default)]
    pub lock_gamma_beta: bool,

    /// Use batch statistics rather than global statistics during training.
    /// Retained for compatibility with older saved configurations;
    /// default true.
    #[serde(default = "default_use_batch_mean")]
    pub use_batch_mean: bool,
}

impl BatchNormConfig {
    /// Builder pre-populated with the documented defaults.
    pub fn builder() -> BatchNormBuilder {
        BatchNormBuilder::new()
    }

    /// Layer name for logs and error messages.
    pub fn display_name(&self) -> &str {
        self.base.name.as_deref().unwrap_or("batchnorm")
    }

    /// Output layout for the given input layout.
    ///
    /// Batch normalization preserves the shape of whatever it receives, so
    /// all three layouts map to themselves.
    pub fn output_type(&self, input: InputType) -> Result<InputType, ConfigurationError> {
        Ok(input)
    }

    /// Input size this layer would resolve from `input`.
    ///
    /// Feed-forward inputs resolve to their size; spatial inputs, flattened
    /// or not, resolve to their channel depth.
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

    /// Adapter required in front of this layer for the given input, if any.
    ///
    /// Flattened convolutional input is reshaped back to its spatial form so
    /// that normalization happens per channel.
    pub fn preprocessor_for(&self, input: InputType) -> Option<InputPreProcessor> {
        match input {
            InputType::ConvolutionalFlat {
                height,
                width,
                depth,
            } => Some(InputPreProcessor::feed_forward_to_cnn(height, width, depth)),
            _ => None,
        }
    }

    /// Length of the parameter buffer view this layer requires.
    pub fn param_len(&self) -> usize {
        BatchNormInitializer.required_len(self)
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
    ///
    /// Fails with [`ConfigurationError::InvalidDimension`] when dimensions are
    /// unresolved and with [`crate::error::ParameterSizeError`] when `view` is
    /// too small; in both cases the buffer is left untouched.
    pub fn instantiate(
        &self,
        ctx: &NetworkContext,
        listeners: &[Arc<dyn TrainingListener>],
        index: usize,
        view: &mut [f32],
        initialize: bool,
    ) -> Result<Box<dyn Layer>, NetworkError> {
        self.validate()?;
        let table = BatchNormInitializer.init(self, ctx, index, view, initialize)?;
        Ok(Box::new(BatchNormLayer::new(
            self.clone(),
            index,
            listeners.to_vec(),
            table,
        )))
    }
}

/// Builder for [`BatchNormConfig`].
///
/// Setters store without validation and `build` freezes without validation;
/// problems surface during planning and instantiation, not construction.
#[derive(Debug, Clone)]
pub struct BatchNormBuilder {
    name: Option<String>,
    n_in: usize,
    n_out: usize,
    decay: f32,
    eps: f32,
    gamma: f32,
    beta: f32,
    lock_gamma_beta: bool,
    use_batch_mean: bool,
}

impl Default for BatchNormBuilder {
    fn default() -> Self {
        Self {
            name: None,
            n_in: 0,
            n_out: 0,
            decay: default_decay(),
            eps: default_eps(),
            gamma: default_gamma(),
            beta: default_beta(),
            lock_gamma_beta: false,
            use_batch_mean: default_use_batch_mean(),
        }
    }
}

impl BatchNormBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partial constructor fixing the affine constants up front.
    pub fn with_gamma_beta(gamma: f32, beta: f32) -> Self {
        Self {
            gamma,
            beta,
            ..Self::default()
        }
    }

    /// Partial constructor for configurations that predate the affine
    /// parameters: sets the moving-average decay and the statistics mode,
    /// leaves everything else at its default.
    pub fn with_decay(decay: f32, use_batch_mean: bool) -> Self {
        Self {
            decay,
            use_batch_mean,
            ..Self::default()
        }
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

    pub fn decay(mut self, decay: f32) -> Self {
        self.decay = decay;
        self
    }

    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    pub fn lock_gamma_beta(mut self, lock: bool) -> Self {
        self.lock_gamma_beta = lock;
        self
    }

    pub fn use_batch_mean(mut self, use_batch_mean: bool) -> Self {
        self.use_batch_mean = use_batch_mean;
        self
    }

    /// Freeze into an immutable configuration. No validation happens here.
    pub fn build(self) -> BatchNormConfig {
        BatchNormConfig {
            base: LayerBase {
                name: self.name,
                n_in: self.n_in,
                n_out: self.n_out,
            },
            decay: self.decay,
            eps: self.eps,
            gamma: self.gamma,
            beta: self.beta,
            lock_gamma_beta: self.lock_gamma_beta,
            use_batch_mean: self.use_batch_mean,
        }
    }
}
