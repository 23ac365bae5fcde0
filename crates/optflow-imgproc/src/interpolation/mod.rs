//! Pixel interpolation methods for sub-pixel sampling.
//!
//! All samplers replicate the border: coordinates outside the image are
//! clamped to the nearest valid pixel before interpolation.

mod bilinear;

pub use bilinear::{bilinear_interpolation, interpolate_pixel, interpolate_vector};
