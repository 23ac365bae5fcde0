use log::{debug, trace};
use serde::{Deserialize, Serialize};

use optflow_image::{GrayImage, Image, VectorField};
use optflow_imgproc::filter::spatiotemporal_gradients;

use crate::{
    boundary::BoundaryConditions,
    error::FlowError,
    extractor::{check_inputs, compute_single, DenseMotionExtractor, SingleFieldSolver, Solver},
    progress::{iteration_fraction, ProgressSink},
    stencil::neighbour_average,
};

/// Parameters of the Horn-Schunck solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HornSchunckParams {
    /// Number of relaxation sweeps.
    pub num_iterations: usize,
    /// Weight of the smoothness term.
    pub alpha: f32,
    /// Successive over-relaxation coefficient.
    pub relax_coeff: f32,
    /// Boundary conditions applied after every sweep.
    pub boundary_conditions: BoundaryConditions,
}

impl Default for HornSchunckParams {
    fn default() -> Self {
        Self {
            num_iterations: 500,
            alpha: 0.7,
            relax_coeff: 1.9,
            boundary_conditions: BoundaryConditions::Neumann,
        }
    }
}

impl HornSchunckParams {
    /// Check that the parameters define a convergent relaxation.
    pub fn validate(&self) -> Result<(), FlowError> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(FlowError::invalid("alpha", format!("must be positive, got {}", self.alpha)));
        }
        if !self.relax_coeff.is_finite() || self.relax_coeff <= 0.0 || self.relax_coeff >= 2.0 {
            return Err(FlowError::invalid(
                "relax_coeff",
                format!("must lie in (0, 2), got {}", self.relax_coeff),
            ));
        }
        Ok(())
    }
}

/// Horn-Schunck optical flow with a global smoothness constraint.
///
/// The Euler-Lagrange equations are relaxed with successive over-relaxation:
/// every sweep visits the interior pixels in row-major order and updates the
/// field in place, so a pixel already sees the new values of its upper and left
/// neighbours. The single quality channel is the constant confidence `1.0`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HornSchunck {
    params: HornSchunckParams,
}

impl HornSchunck {
    /// Number of quality channels of the produced fields.
    pub const NUM_QUALITY_CHANNELS: usize = 1;

    /// Create a solver, validating the parameters.
    pub fn new(params: HornSchunckParams) -> Result<Self, FlowError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The solver parameters.
    pub fn params(&self) -> &HornSchunckParams {
        &self.params
    }

    /// Compute the vector field from `src1` to `src2` starting from a zero seed.
    pub fn compute(&self, src1: &GrayImage, src2: &GrayImage) -> Result<VectorField, FlowError> {
        compute_single(self, src1, src2, Self::NUM_QUALITY_CHANNELS)
    }
}

impl SingleFieldSolver for HornSchunck {
    fn solve(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
        field: &mut VectorField,
        progress: &dyn ProgressSink,
    ) -> Result<(), FlowError> {
        check_inputs(src1, src2, field, Self::NUM_QUALITY_CHANNELS)?;

        let (w, h) = (src1.width(), src1.height());
        debug!("Horn-Schunck solve on {}x{} with {:?}", w, h, self.params);

        field.fill_channel(2, 1.0)?;
        if w < 3 || h < 3 {
            return Ok(());
        }

        let mut grads = Image::<f32, 3>::from_size_val(src1.size(), 0.0)?;
        spatiotemporal_gradients(src1, src2, &mut grads)?;
        let grads = grads.as_slice();

        let alpha_sq = self.params.alpha * self.params.alpha;
        let omega = self.params.relax_coeff;
        let num_channels = field.num_channels();
        let num_iterations = self.params.num_iterations;

        for i in 0..num_iterations {
            let data = field.as_slice_mut();
            for y in 1..h - 1 {
                for x in 1..w - 1 {
                    let [u_avg, v_avg] = neighbour_average(data, w, num_channels, x, y);

                    let g = 3 * (y * w + x);
                    let (gx, gy, gt) = (grads[g], grads[g + 1], grads[g + 2]);

                    let numer = gx * u_avg + gy * v_avg + gt;
                    let denom = alpha_sq + gx * gx + gy * gy;

                    let o = num_channels * (y * w + x);
                    data[o] = (1.0 - omega) * data[o] + omega * (u_avg - gx * numer / denom);
                    data[o + 1] = (1.0 - omega) * data[o + 1] + omega * (v_avg - gy * numer / denom);
                }
            }

            self.params.boundary_conditions.apply(field);

            trace!("Horn-Schunck iteration {}/{}", i + 1, num_iterations);
            progress.report(iteration_fraction(i, num_iterations));
        }

        Ok(())
    }
}

impl DenseMotionExtractor for HornSchunck {
    fn name(&self) -> &'static str {
        "Horn-Schunck"
    }

    fn num_quality_channels(&self) -> usize {
        Self::NUM_QUALITY_CHANNELS
    }

    fn solver(&self) -> Solver<'_> {
        Solver::Single(self)
    }
}
