#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image representation for computer vision purposes.
pub mod image;

/// dense per-pixel motion vector fields.
pub mod vector_field;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{GrayImage, Image, ImageSize};
pub use crate::vector_field::VectorField;
