//! Instantiated layer types.
//!
//! This module provides the Layer trait and the runtime counterparts of the
//! configuration variants, each bound to named views into the network's flat
//! parameter buffer.

mod r#trait;
pub mod batchnorm;
pub mod dense;
pub mod dropout;

// Re-export the Layer trait and the concrete layers for convenience
pub use batchnorm::BatchNormLayer;
pub use dense::DenseLayer;
pub use dropout::DropoutLayer;
pub use r#trait::Layer;
