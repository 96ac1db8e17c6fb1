//! Instantiated dense (fully connected) layer.
//!
//! Owns the frozen configuration and two named views into the network
//! parameter buffer: a row-major weight matrix and a bias vector.

use std::sync::Arc;

use crate::config::DenseConfig;
use crate::layers::Layer;
use crate::listeners::{ListenerSet, TrainingListener};
use crate::params::{self, ParamTable};

/// Dense layer bound to its parameter views.
///
/// Created through [`DenseConfig::instantiate`]. Weights occupy the first
/// `n_in * n_out` values of the layer's span, biases the `n_out` after.
pub struct DenseLayer {
    conf: DenseConfig,
    index: usize,
    listeners: ListenerSet,
    table: ParamTable,
}

impl DenseLayer {
    pub(crate) fn new(
        conf: DenseConfig,
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
    pub fn conf(&self) -> &DenseConfig {
        &self.conf
    }

    /// Weight matrix in row-major order (`n_in` rows of `n_out` values).
    pub fn weights<'a>(&self, layer_params: &'a [f32]) -> &'a [f32] {
        self.table.slice(params::WEIGHTS, layer_params)
    }

    /// Bias vector.
    pub fn biases<'a>(&self, layer_params: &'a [f32]) -> &'a [f32] {
        self.table.slice(params::BIASES, layer_params)
    }
}

impl Layer for DenseLayer {
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
