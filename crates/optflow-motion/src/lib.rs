#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Dense motion extraction
//!
//! Every algorithm refines a seeded [`optflow_image::VectorField`] at a single
//! resolution. The [`pyramidal::PyramidalExtractor`] wraps any of them and runs
//! the solver coarse to fine over an image pyramid.
//!
//! ```rust
//! use optflow_image::GrayImage;
//! use optflow_motion::{HornSchunck, HornSchunckParams, PyramidParams, PyramidalExtractor};
//!
//! let image1 = GrayImage::from_fn([32, 32].into(), |x, y, _| ((x * 7 + y * 3) % 256) as u8)?;
//! let image2 = image1.clone();
//!
//! let params = HornSchunckParams {
//!     num_iterations: 10,
//!     ..Default::default()
//! };
//! let extractor = PyramidalExtractor::new(
//!     HornSchunck::new(params)?,
//!     PyramidParams { num_levels: 2 },
//! )?;
//!
//! let field = extractor.compute(&image1, &image2)?;
//! assert_eq!(field.size(), image1.size());
//! assert_eq!(field.num_channels(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Boundary conditions applied to a vector field after every sweep.
pub mod boundary;

/// Configuration documents that select and parametrize an algorithm.
pub mod config;

/// Error types for the motion module.
pub mod error;

/// The capability model shared by all motion extractors.
pub mod extractor;

/// Horn-Schunck global smoothness solver.
pub mod horn_schunck;

/// Lucas-Kanade local least squares solver.
pub mod lucas_kanade;

/// Progress reporting for long running solvers.
pub mod progress;

/// Proesmans bidirectional non-linear diffusion solver.
pub mod proesmans;

/// Coarse-to-fine pyramidal driver.
pub mod pyramidal;

mod stencil;

pub use crate::boundary::BoundaryConditions;
pub use crate::config::{AlgorithmConfig, ExtractorConfig};
pub use crate::error::FlowError;
pub use crate::extractor::{
    DenseMotionExtractor, DualFieldSolver, MotionExtractor, SingleFieldSolver, Solver,
};
pub use crate::horn_schunck::{HornSchunck, HornSchunckParams};
pub use crate::lucas_kanade::{LucasKanade, LucasKanadeParams};
pub use crate::progress::{NoProgress, ProgressSink};
pub use crate::proesmans::{Proesmans, ProesmansParams};
pub use crate::pyramidal::{upsample_field, PyramidParams, PyramidalExtractor};
