#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image filtering and derivative kernels.
pub mod filter;

/// utilities for interpolation.
pub mod interpolation;

/// drawing primitives and vector field illustration.
pub mod draw;

/// histogram equalization of vector field channels.
pub mod histogram;

/// module containing parallization utilities.
pub mod parallel;

/// image pyramid operations.
pub mod pyramid;

/// image warping driven by dense vector fields.
pub mod warp;
