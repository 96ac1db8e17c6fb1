//! Observer interface handed to layers at instantiation.
//!
//! Listeners are supplied to `instantiate` and are immutable afterwards; the
//! execution engine invokes them, this crate only records them on the layer.

use std::sync::Arc;

/// Observer of training progress for a single layer.
///
/// Implementations must be thread-safe: the same listener set is shared by
/// every layer of a network via [`Arc`].
pub trait TrainingListener: Send + Sync {
    /// Invoked by the execution engine after a parameter update.
    fn iteration_done(&self, layer_index: usize, iteration: usize);
}

/// Shared listener set as stored on instantiated layers.
pub type ListenerSet = Vec<Arc<dyn TrainingListener>>;
