//! Tensor layout descriptors threaded through the network during planning.
//!
//! Every layer declares what it does to the shape of the data via
//! [`InputType`]. The planner threads these descriptors through the layer
//! chain, inserting preprocessors where the conventions disagree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Layout of the data flowing between layers.
///
/// Three conventions are supported:
///
/// - `FeedForward`: a flat vector of `size` features per example
/// - `Convolutional`: a spatial volume of `height` × `width` × `depth`
/// - `ConvolutionalFlat`: a spatial volume stored row-flattened, carrying its
///   original dimensions so it can be reshaped back
///
/// # Examples
///
/// ```
/// use layernet::inputs::InputType;
///
/// let flat = InputType::convolutional_flat(28, 28, 1);
/// assert_eq!(flat.flattened_size(), 784);
/// assert_eq!(flat, InputType::convolutional_flat(28, 28, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputType {
    /// Flat vector activations.
    FeedForward { size: usize },
    /// Spatial activations (height, width, channel depth).
    Convolutional {
        height: usize,
        width: usize,
        depth: usize,
    },
    /// Spatial activations flattened to a vector, original dimensions kept.
    ConvolutionalFlat {
        height: usize,
        width: usize,
        depth: usize,
    },
}

impl InputType {
    /// Flat vector input of `size` features.
    pub fn feed_forward(size: usize) -> Self {
        InputType::FeedForward { size }
    }

    /// Spatial input of the given dimensions.
    pub fn convolutional(height: usize, width: usize, depth: usize) -> Self {
        InputType::Convolutional {
            height,
            width,
            depth,
        }
    }

    /// Flattened spatial input of the given original dimensions.
    pub fn convolutional_flat(height: usize, width: usize, depth: usize) -> Self {
        InputType::ConvolutionalFlat {
            height,
            width,
            depth,
        }
    }

    /// Total number of values per example, regardless of layout.
    pub fn flattened_size(&self) -> usize {
        match *self {
            InputType::FeedForward { size } => size,
            InputType::Convolutional {
                height,
                width,
                depth,
            }
            | InputType::ConvolutionalFlat {
                height,
                width,
                depth,
            } => height * width * depth,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InputType::FeedForward { size } => write!(f, "FeedForward(size={})", size),
            InputType::Convolutional {
                height,
                width,
                depth,
            } => write!(f, "Convolutional({}x{}x{})", height, width, depth),
            InputType::ConvolutionalFlat {
                height,
                width,
                depth,
            } => write!(f, "ConvolutionalFlat({}x{}x{})", height, width, depth),
        }
    }
}
