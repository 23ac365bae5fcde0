#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`error::IoError`] variants for file access, encoding/decoding
/// failures, and malformed vector field files.
pub mod error;

/// PNG image encoding and decoding.
pub mod png;

/// Binary dense vector field format.
///
/// Read and write [`optflow_image::VectorField`] values losslessly.
pub mod vector_field;

pub use crate::error::IoError;
