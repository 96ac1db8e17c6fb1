//! Layout adapters inserted between layers with mismatched conventions.
//!
//! A preprocessor sits in front of a layer and converts the upstream output
//! layout into the layout the layer expects. Adapters are pure shape-level
//! values here: the planner records which adapter goes where, the execution
//! engine performs the actual data movement.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::inputs::InputType;

/// Adapter between tensor layout conventions.
///
/// Each variant carries the spatial dimensions it reshapes to or from, fixed
/// when the planner selects the adapter. Applying an adapter to an input it
/// was not built for is a [`ConfigurationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputPreProcessor {
    /// Reshape flat activations back into a spatial volume.
    FeedForwardToCnn {
        height: usize,
        width: usize,
        depth: usize,
    },
    /// Flatten a spatial volume into vector activations.
    CnnToFeedForward {
        height: usize,
        width: usize,
        depth: usize,
    },
}

impl InputPreProcessor {
    /// Adapter that reshapes flat activations into `height` × `width` × `depth`.
    pub fn feed_forward_to_cnn(height: usize, width: usize, depth: usize) -> Self {
        InputPreProcessor::FeedForwardToCnn {
            height,
            width,
            depth,
        }
    }

    /// Adapter that flattens a `height` × `width` × `depth` volume.
    pub fn cnn_to_feed_forward(height: usize, width: usize, depth: usize) -> Self {
        InputPreProcessor::CnnToFeedForward {
            height,
            width,
            depth,
        }
    }

    /// Adapter name used in error messages, matching the serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            InputPreProcessor::FeedForwardToCnn { .. } => "feed_forward_to_cnn",
            InputPreProcessor::CnnToFeedForward { .. } => "cnn_to_feed_forward",
        }
    }

    /// Shape-level effect of applying this adapter to `input`.
    ///
    /// Inputs that already have the target layout pass through unchanged, as
    /// long as their dimensions agree with the adapter's. Everything else is
    /// validated against the adapter's dimensions and converted, or rejected
    /// with a [`ConfigurationError::ShapeMismatch`].
    pub fn output_type(&self, input: InputType) -> Result<InputType, ConfigurationError> {
        match *self {
            InputPreProcessor::FeedForwardToCnn {
                height,
                width,
                depth,
            } => {
                let expected = height * width * depth;
                match input {
                    InputType::FeedForward { size } => {
                        if size != expected {
                            return Err(self.mismatch(expected, size));
                        }
                        Ok(InputType::convolutional(height, width, depth))
                    }
                    InputType::ConvolutionalFlat { .. } => {
                        if input.flattened_size() != expected {
                            return Err(self.mismatch(expected, input.flattened_size()));
                        }
                        Ok(InputType::convolutional(height, width, depth))
                    }
                    InputType::Convolutional { .. } => {
                        // Already spatial: pass through when the dimensions agree
                        if input.flattened_size() != expected {
                            return Err(self.mismatch(expected, input.flattened_size()));
                        }
                        Ok(input)
                    }
                }
            }
            InputPreProcessor::CnnToFeedForward {
                height,
                width,
                depth,
            } => {
                let expected = height * width * depth;
                if input.flattened_size() != expected {
                    return Err(self.mismatch(expected, input.flattened_size()));
                }
                Ok(InputType::feed_forward(expected))
            }
        }
    }

    fn mismatch(&self, expected: usize, actual: usize) -> ConfigurationError {
        ConfigurationError::ShapeMismatch {
            component: self.name().to_string(),
            expected,
            actual,
        }
    }
}
