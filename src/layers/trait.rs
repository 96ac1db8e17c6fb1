//! Layer trait definition for instantiated network layers.
//!
//! This module defines the core Layer trait implemented by every layer type
//! once its configuration has been bound to a region of the network parameter
//! buffer. The trait exposes the structural view of a layer: its position,
//! its shape, and the layout of its parameters. The numeric passes over the
//! data are the execution engine's concern, not this crate's.

use std::fmt;
use std::sync::Arc;

use crate::listeners::TrainingListener;
use crate::params::ParamTable;

/// Core trait for instantiated network layers.
///
/// A layer does not own its parameter values; it owns a [`ParamTable`] of
/// named views into its span of the network's flat buffer. All methods are
/// cheap accessors over state fixed at instantiation time.
pub trait Layer {
    /// Position of the layer within the network.
    fn index(&self) -> usize;

    /// Layer name for logs and error messages.
    fn display_name(&self) -> &str;

    /// Expected number of input features per example.
    fn input_size(&self) -> usize;

    /// Number of output features per example.
    fn output_size(&self) -> usize;

    /// Number of trainable parameter values.
    ///
    /// Counts only trainable views; running statistics and locked parameters
    /// are excluded.
    fn parameter_count(&self) -> usize;

    /// Named views into the layer's region of the parameter buffer.
    fn param_table(&self) -> &ParamTable;

    /// Listeners recorded at instantiation; immutable afterwards.
    fn listeners(&self) -> &[Arc<dyn TrainingListener>];
}

impl fmt::Debug for dyn Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("index", &self.index())
            .field("name", &self.display_name())
            .field("input_size", &self.input_size())
            .field("output_size", &self.output_size())
            .field("parameter_count", &self.parameter_count())
            .finish_non_exhaustive()
    }
}
