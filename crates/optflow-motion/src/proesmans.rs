use log::{debug, trace};
use serde::{Deserialize, Serialize};

use optflow_image::{GrayImage, Image, VectorField};
use optflow_imgproc::{
    filter::sobel_gradients,
    interpolation::{interpolate_pixel, interpolate_vector},
    parallel,
};

use crate::{
    boundary::BoundaryConditions,
    error::FlowError,
    extractor::{check_inputs, DenseMotionExtractor, DualFieldSolver, Solver},
    progress::{iteration_fraction, NoProgress, ProgressSink},
    stencil::weighted_neighbour_average,
};

const INTENSITY_SCALE: f32 = 1.0 / 255.0;

/// Parameters of the Proesmans solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProesmansParams {
    /// Number of diffusion sweeps.
    pub num_iterations: usize,
    /// Weight of the data term.
    pub lambda: f32,
    /// Boundary conditions applied after every sweep.
    pub boundary_conditions: BoundaryConditions,
}

impl Default for ProesmansParams {
    fn default() -> Self {
        Self {
            num_iterations: 200,
            lambda: 100.0,
            boundary_conditions: BoundaryConditions::Neumann,
        }
    }
}

impl ProesmansParams {
    /// Check that the data term weight is usable.
    pub fn validate(&self) -> Result<(), FlowError> {
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(FlowError::invalid(
                "lambda",
                format!("must be non-negative, got {}", self.lambda),
            ));
        }
        Ok(())
    }
}

/// Proesmans optical flow: forward and backward fields diffused jointly.
///
/// Each sweep first measures how well the two fields invert each other. The
/// consistency `gamma` of a pixel then weighs its contribution to the
/// neighbour averages, so inconsistent (occluded) regions do not leak into
/// their surroundings. The single quality channel stores `gamma`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Proesmans {
    params: ProesmansParams,
}

impl Proesmans {
    /// Number of quality channels of the produced fields.
    pub const NUM_QUALITY_CHANNELS: usize = 1;

    /// Create a solver, validating the parameters.
    pub fn new(params: ProesmansParams) -> Result<Self, FlowError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The solver parameters.
    pub fn params(&self) -> &ProesmansParams {
        &self.params
    }

    /// Compute the forward vector field from a zero seed.
    pub fn compute(&self, src1: &GrayImage, src2: &GrayImage) -> Result<VectorField, FlowError> {
        Ok(self.compute_dual(src1, src2)?.0)
    }

    /// Compute the forward and backward vector fields from a zero seed.
    pub fn compute_dual(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
    ) -> Result<(VectorField, VectorField), FlowError> {
        let mut forward = VectorField::new(src1.size(), Self::NUM_QUALITY_CHANNELS);
        let mut backward = VectorField::new(src1.size(), Self::NUM_QUALITY_CHANNELS);
        self.solve_dual(src1, src2, &mut forward, &mut backward, &NoProgress)?;
        Ok((forward, backward))
    }

    /// One in-place diffusion sweep over the interior of `field`.
    fn sweep(
        &self,
        own: &GrayImage,
        other: &GrayImage,
        grads: &Image<f32, 2>,
        gamma: &[f32],
        field: &mut VectorField,
    ) {
        let (w, h) = (field.width(), field.height());
        let num_channels = field.num_channels();
        let lambda = self.params.lambda;
        let (grads, own_data) = (grads.as_slice(), own.as_slice());
        let (max_x, max_y) = ((w - 1) as f32, (h - 1) as f32);

        let data = field.as_slice_mut();
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let [u_avg, v_avg] = weighted_neighbour_average(data, gamma, w, num_channels, x, y);

                let p = y * w + x;
                let (xd, yd) = (x as f32 + u_avg, y as f32 + v_avg);
                let next = if (0.0..=max_x).contains(&xd) && (0.0..=max_y).contains(&yd) {
                    let it = (interpolate_pixel(other, xd, yd, 0) - own_data[p] as f32) * INTENSITY_SCALE;
                    let (gx, gy) = (grads[2 * p], grads[2 * p + 1]);
                    let m = lambda * it / (1.0 + lambda * (gx * gx + gy * gy));
                    [u_avg - gx * m, v_avg - gy * m]
                } else {
                    [u_avg, v_avg]
                };

                data[p * num_channels] = next[0];
                data[p * num_channels + 1] = next[1];
            }
        }
    }
}

/// Compute the consistency weights of `field` against the `opposite` field.
///
/// A pixel displaced inside the image measures `c = |v(x) + opposite(x + v(x))|`
/// and gets the weight `1 / (1 + (c / K)^2)` with `K = 0.9 * mean(c)`. Pixels
/// displaced outside the image get weight zero. A perfectly consistent pair
/// (`K = 0`) weighs every inside pixel with one.
pub fn consistency_map(field: &VectorField, opposite: &VectorField, gamma: &mut [f32]) {
    let (w, h) = (field.width(), field.height());
    if w == 0 || h == 0 {
        return;
    }
    let (max_x, max_y) = ((w - 1) as f32, (h - 1) as f32);

    parallel::par_for_each_row(gamma, w, |y, row| {
        for (x, g) in row.iter_mut().enumerate() {
            let [u, v] = field.vector(x, y);
            let (xd, yd) = (x as f32 + u, y as f32 + v);
            *g = if (0.0..=max_x).contains(&xd) && (0.0..=max_y).contains(&yd) {
                let [ub, vb] = interpolate_vector(opposite, xd, yd);
                ((u + ub) * (u + ub) + (v + vb) * (v + vb)).sqrt()
            } else {
                -1.0
            };
        }
    });

    let (sum, count) = gamma
        .iter()
        .filter(|&&c| c >= 0.0)
        .fold((0.0f64, 0usize), |(s, n), &c| (s + c as f64, n + 1));
    let k = if count > 0 { (0.9 * sum / count as f64) as f32 } else { 0.0 };

    gamma.iter_mut().for_each(|g| {
        *g = if *g < 0.0 {
            0.0
        } else if k > 0.0 {
            1.0 / (1.0 + (*g / k) * (*g / k))
        } else {
            1.0
        };
    });
}

impl DualFieldSolver for Proesmans {
    fn solve_dual(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
        forward: &mut VectorField,
        backward: &mut VectorField,
        progress: &dyn ProgressSink,
    ) -> Result<(), FlowError> {
        check_inputs(src1, src2, forward, Self::NUM_QUALITY_CHANNELS)?;
        check_inputs(src1, src2, backward, Self::NUM_QUALITY_CHANNELS)?;

        let (w, h) = (src1.width(), src1.height());
        debug!("Proesmans solve on {}x{} with {:?}", w, h, self.params);
        if w < 3 || h < 3 {
            return Ok(());
        }

        let mut grads1 = Image::<f32, 2>::from_size_val(src1.size(), 0.0)?;
        sobel_gradients(src1, &mut grads1)?;
        let mut grads2 = Image::<f32, 2>::from_size_val(src2.size(), 0.0)?;
        sobel_gradients(src2, &mut grads2)?;

        let mut gamma_forward = vec![0.0f32; w * h];
        let mut gamma_backward = vec![0.0f32; w * h];

        let num_iterations = self.params.num_iterations;
        for i in 0..num_iterations {
            let (f, b) = (&*forward, &*backward);
            rayon::join(
                || consistency_map(f, b, &mut gamma_forward),
                || consistency_map(b, f, &mut gamma_backward),
            );

            // the two directions only share the consistency maps
            rayon::join(
                || self.sweep(src1, src2, &grads1, &gamma_forward, forward),
                || self.sweep(src2, src1, &grads2, &gamma_backward, backward),
            );

            for y in 1..h - 1 {
                for x in 1..w - 1 {
                    forward.set_quality(x, y, 0, gamma_forward[y * w + x]);
                    backward.set_quality(x, y, 0, gamma_backward[y * w + x]);
                }
            }

            self.params.boundary_conditions.apply(forward);
            self.params.boundary_conditions.apply(backward);

            trace!("Proesmans iteration {}/{}", i + 1, num_iterations);
            progress.report(iteration_fraction(i, num_iterations));
        }

        Ok(())
    }
}

impl DenseMotionExtractor for Proesmans {
    fn name(&self) -> &'static str {
        "Proesmans"
    }

    fn num_quality_channels(&self) -> usize {
        Self::NUM_QUALITY_CHANNELS
    }

    fn solver(&self) -> Solver<'_> {
        Solver::Dual(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optflow_image::ImageError;

    fn texture(shift: f32, phase: f32) -> Result<GrayImage, ImageError> {
        GrayImage::from_fn([24, 24].into(), |x, y, _| {
            let xf = x as f32 - shift;
            let yf = y as f32;
            (128.0 + 60.0 * (xf / 4.0 + phase).sin() + 40.0 * (yf / 5.0).cos()).round() as u8
        })
    }

    fn mean_u(field: &VectorField) -> f32 {
        let (mut sum, mut count) = (0.0, 0);
        for y in 6..18 {
            for x in 6..18 {
                sum += field.vector(x, y)[0];
                count += 1;
            }
        }
        sum / count as f32
    }

    #[test]
    fn consistent_fields_weigh_one() {
        let mut forward = VectorField::new([4, 3].into(), 1);
        let mut backward = VectorField::new([4, 3].into(), 1);
        for y in 0..3 {
            for x in 0..4 {
                forward.set_vector(x, y, [1.0, 0.0]);
                backward.set_vector(x, y, [-1.0, 0.0]);
            }
        }

        let mut gamma = vec![0.5f32; 12];
        consistency_map(&forward, &backward, &mut gamma);

        for y in 0..3 {
            for x in 0..4 {
                // the last column is displaced outside the image
                let expected = if x == 3 { 0.0 } else { 1.0 };
                assert_eq!(gamma[y * 4 + x], expected);
            }
        }
    }

    #[test]
    fn inconsistent_pixels_weigh_less() {
        let forward = VectorField::new([3, 1].into(), 1);
        let mut backward = VectorField::new([3, 1].into(), 1);
        backward.set_vector(2, 0, [0.0, 3.0]);

        let mut gamma = vec![0.0f32; 3];
        consistency_map(&forward, &backward, &mut gamma);

        // c = [0, 0, 3], K = 0.9, gamma = 1 / (1 + (3 / 0.9)^2)
        assert_eq!(gamma[0], 1.0);
        assert_eq!(gamma[1], 1.0);
        approx::assert_relative_eq!(gamma[2], 1.0 / (1.0 + (3.0f32 / 0.9).powi(2)), epsilon = 1e-6);
    }

    #[test]
    fn zero_lambda_ignores_images() -> Result<(), FlowError> {
        let solver = Proesmans::new(ProesmansParams {
            num_iterations: 15,
            lambda: 0.0,
            ..Default::default()
        })?;

        let seed = |x: usize, y: usize| [0.3 * (x as f32 / 5.0).sin(), -0.2 * (y as f32 / 3.0).cos()];
        let run = |a: &GrayImage, b: &GrayImage| -> Result<(VectorField, VectorField), FlowError> {
            let mut forward = VectorField::new(a.size(), 1);
            let mut backward = VectorField::new(a.size(), 1);
            for y in 0..a.height() {
                for x in 0..a.width() {
                    forward.set_vector(x, y, seed(x, y));
                    backward.set_vector(x, y, seed(y, x));
                }
            }
            solver.solve_dual(a, b, &mut forward, &mut backward, &NoProgress)?;
            Ok((forward, backward))
        };

        let first = run(&texture(0.0, 0.0)?, &texture(1.0, 0.0)?)?;
        let second = run(&texture(0.0, 2.0)?, &texture(-2.0, 1.0)?)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn forward_and_backward_point_opposite() -> Result<(), FlowError> {
        let solver = Proesmans::new(ProesmansParams {
            num_iterations: 100,
            ..Default::default()
        })?;
        let (forward, backward) = solver.compute_dual(&texture(0.0, 0.0)?, &texture(1.0, 0.0)?)?;

        assert!(mean_u(&forward) > 0.3);
        assert!(mean_u(&backward) < -0.3);

        for field in [&forward, &backward] {
            for pixel in field.as_slice().chunks_exact(3) {
                assert!((0.0..=1.0).contains(&pixel[2]));
            }
        }
        Ok(())
    }

    #[test]
    fn single_compute_returns_forward() -> Result<(), FlowError> {
        let solver = Proesmans::new(ProesmansParams {
            num_iterations: 10,
            ..Default::default()
        })?;
        let (a, b) = (texture(0.0, 0.0)?, texture(1.0, 0.0)?);
        assert_eq!(solver.compute(&a, &b)?, solver.compute_dual(&a, &b)?.0);
        Ok(())
    }

    #[test]
    fn negative_lambda_is_rejected() {
        let params = ProesmansParams {
            lambda: -1.0,
            ..Default::default()
        };
        assert!(Proesmans::new(params).is_err());
    }
}
