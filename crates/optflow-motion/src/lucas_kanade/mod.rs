use log::{debug, trace};
use serde::{Deserialize, Serialize};

use optflow_image::{GrayImage, Image, VectorField};
use optflow_imgproc::{
    filter::{central_difference_gradients, kernels},
    interpolation::interpolate_pixel,
};

use crate::{
    error::FlowError,
    extractor::{check_inputs, compute_single, DenseMotionExtractor, SingleFieldSolver, Solver},
    progress::{iteration_fraction, ProgressSink},
};

mod roi;
pub use roi::Roi;

const INTENSITY_SCALE: f64 = 1.0 / 255.0;

/// Parameters of the Lucas-Kanade solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LucasKanadeParams {
    /// Radius of the square window, which spans `2 * window_radius + 1` pixels.
    pub window_radius: usize,
    /// Maximum number of Newton iterations per pixel.
    pub num_iterations: usize,
    /// Minimum eigenvalue of the structure tensor for a pixel to be solved.
    pub tau: f32,
    /// Regularization weight, reserved and currently not part of the update.
    pub sigma_p: f32,
    /// Weight the window with a Gaussian of standard deviation `window_radius / 3`.
    pub use_weighting_kernel: bool,
}

impl Default for LucasKanadeParams {
    fn default() -> Self {
        Self {
            window_radius: 16,
            num_iterations: 5,
            tau: 0.0025,
            sigma_p: 0.0,
            use_weighting_kernel: true,
        }
    }
}

impl LucasKanadeParams {
    /// Check the window and threshold parameters.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.window_radius == 0 {
            return Err(FlowError::invalid("window_radius", "must be at least 1"));
        }
        if !self.tau.is_finite() || self.tau < 0.0 {
            return Err(FlowError::invalid("tau", format!("must be non-negative, got {}", self.tau)));
        }
        if !self.sigma_p.is_finite() || self.sigma_p < 0.0 {
            return Err(FlowError::invalid(
                "sigma_p",
                format!("must be non-negative, got {}", self.sigma_p),
            ));
        }
        Ok(())
    }

    /// Side length of the window in pixels.
    pub fn window_size(&self) -> usize {
        2 * self.window_radius + 1
    }
}

/// Lucas-Kanade optical flow solved densely with an iterative local least squares fit.
///
/// Every pixel fits a constant displacement over the window around it. The fit
/// is refined with Newton steps on the warped second image while the structure
/// tensor of the first image stays fixed. The quality channels are
///
/// 0. the smallest eigenvalue of the structure tensor, clamped to `[0, 1]`;
/// 1. `min(255, 255 / (1000 * r + 1)) / 255` for the mean squared residual `r`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LucasKanade {
    params: LucasKanadeParams,
}

impl LucasKanade {
    /// Number of quality channels of the produced fields.
    pub const NUM_QUALITY_CHANNELS: usize = 2;

    /// Create a solver, validating the parameters.
    pub fn new(params: LucasKanadeParams) -> Result<Self, FlowError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The solver parameters.
    pub fn params(&self) -> &LucasKanadeParams {
        &self.params
    }

    /// Compute the vector field from `src1` to `src2` starting from a zero seed.
    pub fn compute(&self, src1: &GrayImage, src2: &GrayImage) -> Result<VectorField, FlowError> {
        compute_single(self, src1, src2, Self::NUM_QUALITY_CHANNELS)
    }

    /// Refine the displacement of one pixel and return the final residual sum.
    fn refine_pixel(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
        roi: &Roi,
        field: &mut VectorField,
        (x, y): (usize, usize),
        [a, b, c]: [f64; 3],
    ) -> f64 {
        let r = self.params.window_radius as isize;
        let det = a * c - b * b;

        let mut r_sum = 0.0;
        let mut prev_r_sum = 0.0;
        for i in 0..self.params.num_iterations {
            let [vx, vy] = field.vector(x, y);

            let (mut sum_dx, mut sum_dy) = (0.0f64, 0.0f64);
            r_sum = 0.0;
            for yw in -r..=r {
                for xw in -r..=r {
                    let w = roi.weight((xw + r) as usize, (yw + r) as usize) as f64;
                    let (xs, ys) = (x as isize + xw, y as isize + yw);

                    let warped = interpolate_pixel(src2, xs as f32 + vx, ys as f32 + vy, 0) as f64;
                    let anchor = src1.get_clamped(xs, ys, 0) as f64;
                    let diff = (warped - anchor) * INTENSITY_SCALE;

                    let gx = roi_gradient(roi, xs, ys, 0);
                    let gy = roi_gradient(roi, xs, ys, 1);

                    sum_dx += w * diff * gx;
                    sum_dy += w * diff * gy;
                    r_sum += w * diff * diff;
                }
            }

            // stop once the residual grows, keeping the previous estimate
            if i > 0 && r_sum > prev_r_sum {
                r_sum = prev_r_sum;
                break;
            }

            let dvx = (c * sum_dx - b * sum_dy) / det;
            let dvy = (-b * sum_dx + a * sum_dy) / det;
            field.set_vector(x, y, [vx - dvx as f32, vy - dvy as f32]);

            prev_r_sum = r_sum;
        }

        r_sum
    }
}

#[inline]
fn roi_gradient(roi: &Roi, x: isize, y: isize, ch: usize) -> f64 {
    roi.gradients().get_clamped(x, y, ch) as f64
}

/// Eigenvalues of the symmetric matrix `[a, b; b, c]`, smallest first.
pub fn symmetric_eigenvalues(a: f64, b: f64, c: f64) -> [f64; 2] {
    let root = (4.0 * b * b + (a - c) * (a - c)).sqrt();
    [0.5 * (a + c - root), 0.5 * (a + c + root)]
}

/// Map a mean squared residual to a quality in `[0, 1]`.
fn residual_quality(mean_residual: f64) -> f32 {
    ((255.0 / (1000.0 * mean_residual + 1.0)).min(255.0) / 255.0) as f32
}

impl SingleFieldSolver for LucasKanade {
    fn solve(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
        field: &mut VectorField,
        progress: &dyn ProgressSink,
    ) -> Result<(), FlowError> {
        check_inputs(src1, src2, field, Self::NUM_QUALITY_CHANNELS)?;

        let (w, h) = (src1.width(), src1.height());
        debug!("Lucas-Kanade solve on {}x{} with {:?}", w, h, self.params);
        if w == 0 || h == 0 {
            return Ok(());
        }

        let mut grads = Image::<f32, 2>::from_size_val(src1.size(), 0.0)?;
        central_difference_gradients(src1, &mut grads)?;

        let r = self.params.window_radius;
        let size = self.params.window_size();
        let window = kernels::gaussian_window_1d(size, r as f32 / 3.0);

        let mut roi = if self.params.use_weighting_kernel {
            Roi::with_separable_kernel(&grads, &window, &window)
        } else {
            Roi::new(&grads, size, size)
        };
        roi.initialize(-(r as isize), -(r as isize));

        let tau = self.params.tau as f64;
        let window_area = (size * size) as f64;

        for y in 0..h {
            for x in 0..w {
                let tensor = roi.structure_tensor();
                let [a, b, c] = tensor;
                let [min_eigenvalue, _] = symmetric_eigenvalues(a, b, c);

                let r_sum = if min_eigenvalue > tau {
                    self.refine_pixel(src1, src2, &roi, field, (x, y), tensor)
                } else {
                    0.0
                };

                field.set_quality(x, y, 0, min_eigenvalue.clamp(0.0, 1.0) as f32);
                field.set_quality(x, y, 1, residual_quality(r_sum / window_area));

                roi.translate(1, 0);
            }
            roi.translate(-(w as isize), 1);

            trace!("Lucas-Kanade row {}/{}", y + 1, h);
            progress.report(iteration_fraction(y, h));
        }

        Ok(())
    }
}

impl DenseMotionExtractor for LucasKanade {
    fn name(&self) -> &'static str {
        "Lucas-Kanade"
    }

    fn num_quality_channels(&self) -> usize {
        Self::NUM_QUALITY_CHANNELS
    }

    fn solver(&self) -> Solver<'_> {
        Solver::Single(self)
    }
}
