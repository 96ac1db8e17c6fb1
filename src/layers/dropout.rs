//! Instantiated dropout layer.
//!
//! Dropout owns no parameters; the layer is just the frozen configuration,
//! its position, and its listeners. The mask sampling happens in the
//! execution engine at run time.

use std::sync::Arc;

use crate::config::DropoutConfig;
use crate::layers::Layer;
use crate::listeners::{ListenerSet, TrainingListener};
use crate::params::ParamTable;

/// Dropout layer. Parameterless; its table is always empty.
pub struct DropoutLayer {
    conf: DropoutConfig,
    index: usize,
    listeners: ListenerSet,
    table: ParamTable,
}

impl DropoutLayer {
    pub(crate) fn new(
        conf: DropoutConfig,
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
    pub fn conf(&self) -> &DropoutConfig {
        &self.conf
    }

    /// Probability of dropping each unit during training.
    pub fn drop_rate(&self) -> f32 {
        self.conf.drop_rate
    }
}

impl Layer for DropoutLayer {
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
        0
    }

    fn param_table(&self) -> &ParamTable {
        &self.table
    }

    fn listeners(&self) -> &[Arc<dyn TrainingListener>] {
        &self.listeners
    }
}
