//! Instantiated batch normalization layer.
//!
//! Owns the frozen configuration and the named views into its span of the
//! network parameter buffer: gamma, beta, and the two running statistics.
//! The normalization arithmetic itself runs in the execution engine; this
//! type is the binding between configuration and buffer.

use std::sync::Arc;

use crate::config::BatchNormConfig;
use crate::layers::Layer;
use crate::listeners::{ListenerSet, TrainingListener};
use crate::params::{self, ParamTable};

/// Batch normalization layer bound to its parameter views.
///
/// Created through [`BatchNormConfig::instantiate`]; the parameter table
/// always holds the four views in canonical order (gamma, beta, running mean,
/// running variance), each `n_out` long.
pub struct BatchNormLayer {
    conf: BatchNormConfig,
    index: usize,
    listeners: ListenerSet,
    table: ParamTable,
}

impl BatchNormLayer {
    pub(crate) fn new(
        conf: BatchNormConfig,
        index: usize,
        listeners: ListenerSet,
        table: ParamTable,
    ) -> Self {
        Self {
            conf,
            index,
            listeners,
            table,
        }
    }

    /// The frozen configuration this layer was built from.
    pub fn conf(&self) -> &BatchNormConfig {
        &self.conf
    }

    /// Scale parameters, sliced out of the layer's region of the buffer.
    pub fn gamma<'a>(&self, layer_params: &'a [f32]) -> &'a [f32] {
        self.table.slice(params::GAMMA, layer_params)
    }

    /// Shift parameters.
    pub fn beta<'a>(&self, layer_params: &'a [f32]) -> &'a [f32] {
        self.table.slice(params::BETA, layer_params)
    }

    /// Running mean statistics. Not trainable.
    pub fn running_mean<'a>(&self, layer_params: &'a [f32]) -> &'a [f32] {
        self.table.slice(params::RUNNING_MEAN, layer_params)
    }

    /// Running variance statistics. Not trainable.
    pub fn running_var<'a>(&self, layer_params: &'a [f32]) -> &'a [f32] {
        self.table.slice(params::RUNNING_VAR, layer_params)
    }
}

impl Layer for BatchNormLayer {
    fn index(&self) -> usize {
        self.index
    }

    fn display_name(&self) -> &str {
        self.conf.display_name()
    }

    fn input_size(&self) -> usize {
        self.conf.base.n_in
    }

    fn output_size(&self) -> usize {
        self.conf.base.n_out
    }

    /// Gamma and beta when unlocked, nothing otherwise. Running statistics
    /// are never trainable.
    fn parameter_count(&self) -> usize {
        self.table.trainable_len()
    }

    fn param_table(&self) -> &ParamTable {
        &self.table
    }

    fn listeners(&self) -> &[Arc<dyn TrainingListener>] {
        &self.listeners
    }
}
