use optflow_image::{ImageError, ImageSize};

/// An error type for the motion module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FlowError {
    /// The two input images do not share the same size.
    #[error("Input image sizes differ: {0} != {1}")]
    ImageSizeMismatch(ImageSize, ImageSize),

    /// The seeded vector field does not cover the input images.
    #[error("Vector field size {0} does not match the image size {1}")]
    FieldSizeMismatch(ImageSize, ImageSize),

    /// The seeded vector field carries the wrong number of quality channels.
    #[error("Vector field has {0} quality channels, expected {1}")]
    QualityChannelMismatch(usize, usize),

    /// A parameter is outside of its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// A dual field was requested from a solver that only estimates one direction.
    #[error("{0} does not compute dual vector fields")]
    DualUnsupported(&'static str),

    /// Error raised by an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl FlowError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        FlowError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
