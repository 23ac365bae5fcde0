//! Filter operations
//!
//! This module provides the derivative filters used by the motion solvers.

/// Filter kernels
pub mod kernels;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;

/// Image gradient operators
mod gradient;
pub use gradient::*;
