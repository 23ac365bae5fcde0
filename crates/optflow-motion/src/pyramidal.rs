use log::{debug, info};
use serde::{Deserialize, Serialize};

use optflow_image::{GrayImage, ImageSize, VectorField};
use optflow_imgproc::{interpolation::interpolate_vector, parallel, pyramid::ImagePyramid};

use crate::{
    error::FlowError,
    extractor::{DenseMotionExtractor, DualFieldSolver, SingleFieldSolver, Solver},
    progress::{LevelProgress, NoProgress, ProgressSink},
};

/// Parameters of the coarse-to-fine pyramid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidParams {
    /// Number of pyramid levels, the full resolution included.
    pub num_levels: usize,
}

impl Default for PyramidParams {
    fn default() -> Self {
        Self { num_levels: 4 }
    }
}

impl PyramidParams {
    /// Check that the pyramid has at least one level.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.num_levels == 0 {
            return Err(FlowError::invalid("num_levels", "must be at least 1"));
        }
        Ok(())
    }
}

/// Upsample a coarse vector field to the next finer pyramid level.
///
/// Pixels with even coordinates in both axes take the coarse vector at half
/// their coordinates, every other pixel interpolates the coarse field bilinearly
/// at the half-integer position. Coarse coordinates are clamped into the coarse
/// grid. All vectors are doubled to account for the finer pixel pitch, and the
/// quality channels of the result start at zero.
///
/// # Arguments
///
/// * `coarse` - The vector field of the coarser level.
/// * `size` - The size of the finer level.
///
/// # Example
///
/// ```
/// use optflow_image::VectorField;
/// use optflow_motion::upsample_field;
///
/// let mut coarse = VectorField::new([2, 1].into(), 1);
/// coarse.set_vector(1, 0, [1.0, -1.0]);
///
/// let fine = upsample_field(&coarse, [4, 2].into());
///
/// assert_eq!(fine.vector(0, 0), [0.0, 0.0]);
/// assert_eq!(fine.vector(1, 0), [1.0, -1.0]);
/// assert_eq!(fine.vector(2, 1), [2.0, -2.0]);
/// ```
pub fn upsample_field(coarse: &VectorField, size: ImageSize) -> VectorField {
    let mut fine = VectorField::new(size, coarse.num_quality_channels());
    if coarse.width() == 0 || coarse.height() == 0 {
        return fine;
    }

    let num_channels = fine.num_channels();
    let (max_x, max_y) = (coarse.width() - 1, coarse.height() - 1);

    parallel::par_for_each_row(fine.as_slice_mut(), size.width * num_channels, |yn, row| {
        for (xn, pixel) in row.chunks_exact_mut(num_channels).enumerate() {
            let [u, v] = if xn % 2 == 0 && yn % 2 == 0 {
                coarse.vector((xn / 2).min(max_x), (yn / 2).min(max_y))
            } else {
                interpolate_vector(coarse, xn as f32 / 2.0, yn as f32 / 2.0)
            };
            pixel[0] = 2.0 * u;
            pixel[1] = 2.0 * v;
        }
    });

    fine
}

/// Coarse-to-fine driver around a single resolution extractor.
///
/// Both images are decomposed into pyramids. The coarsest level is solved from
/// a zero field, and every finer level is seeded with the upsampled result of
/// the level above it.
#[derive(Clone, Debug)]
pub struct PyramidalExtractor<E> {
    extractor: E,
    params: PyramidParams,
}

impl<E: DenseMotionExtractor> PyramidalExtractor<E> {
    /// Wrap an extractor, validating the pyramid parameters.
    pub fn new(extractor: E, params: PyramidParams) -> Result<Self, FlowError> {
        params.validate()?;
        Ok(Self { extractor, params })
    }

    /// The wrapped single resolution extractor.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Number of pyramid levels.
    pub fn num_levels(&self) -> usize {
        self.params.num_levels
    }

    /// Compute the forward vector field from `src1` to `src2`.
    ///
    /// A dual extractor computes the backward field as well and discards it.
    pub fn compute(&self, src1: &GrayImage, src2: &GrayImage) -> Result<VectorField, FlowError> {
        self.compute_with_progress(src1, src2, &NoProgress)
    }

    /// Same as [`PyramidalExtractor::compute`], reporting progress over all levels.
    pub fn compute_with_progress(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
        progress: &dyn ProgressSink,
    ) -> Result<VectorField, FlowError> {
        match self.extractor.solver() {
            Solver::Single(solver) => self.run_single(solver, src1, src2, progress),
            Solver::Dual(solver) => Ok(self.run_dual(solver, src1, src2, progress)?.0),
        }
    }

    /// Compute the forward and backward vector fields.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::DualUnsupported`] for single field extractors, before
    /// any work is done.
    pub fn compute_dual(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
    ) -> Result<(VectorField, VectorField), FlowError> {
        self.compute_dual_with_progress(src1, src2, &NoProgress)
    }

    /// Same as [`PyramidalExtractor::compute_dual`], reporting progress over all levels.
    pub fn compute_dual_with_progress(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
        progress: &dyn ProgressSink,
    ) -> Result<(VectorField, VectorField), FlowError> {
        match self.extractor.solver() {
            Solver::Single(_) => Err(FlowError::DualUnsupported(self.extractor.name())),
            Solver::Dual(solver) => self.run_dual(solver, src1, src2, progress),
        }
    }

    fn build_pyramids(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
    ) -> Result<(ImagePyramid, ImagePyramid), FlowError> {
        if src1.size() != src2.size() {
            return Err(FlowError::ImageSizeMismatch(src1.size(), src2.size()));
        }

        info!(
            "{} on {}x{} images with {} pyramid levels",
            self.extractor.name(),
            src1.width(),
            src1.height(),
            self.params.num_levels
        );

        let pyramid1 = ImagePyramid::build(src1, self.params.num_levels)?;
        let pyramid2 = ImagePyramid::build(src2, self.params.num_levels)?;
        Ok((pyramid1, pyramid2))
    }

    /// Seed for a level: zero at the coarsest level, upsampled otherwise.
    fn seed(&self, coarse: Option<VectorField>, size: ImageSize) -> VectorField {
        match coarse {
            Some(coarse) => upsample_field(&coarse, size),
            None => VectorField::new(size, self.extractor.num_quality_channels()),
        }
    }

    fn run_single(
        &self,
        solver: &dyn SingleFieldSolver,
        src1: &GrayImage,
        src2: &GrayImage,
        progress: &dyn ProgressSink,
    ) -> Result<VectorField, FlowError> {
        let (pyramid1, pyramid2) = self.build_pyramids(src1, src2)?;
        let num_levels = pyramid1.num_levels();

        let mut field = None;
        let levels = pyramid1.levels().iter().zip(pyramid2.levels());
        for (done, (level, (i1, i2))) in levels.enumerate().rev().enumerate() {
            debug!("level {}: {}x{}", level, i1.width(), i1.height());

            let mut current = self.seed(field.take(), i1.size());
            let level_progress = LevelProgress {
                sink: progress,
                levels_done: done,
                num_levels,
            };
            solver.solve(i1, i2, &mut current, &level_progress)?;
            level_progress.report(1.0);

            field = Some(current);
        }

        field.ok_or_else(|| FlowError::invalid("num_levels", "must be at least 1"))
    }

    fn run_dual(
        &self,
        solver: &dyn DualFieldSolver,
        src1: &GrayImage,
        src2: &GrayImage,
        progress: &dyn ProgressSink,
    ) -> Result<(VectorField, VectorField), FlowError> {
        let (pyramid1, pyramid2) = self.build_pyramids(src1, src2)?;
        let num_levels = pyramid1.num_levels();

        let mut fields = None;
        let levels = pyramid1.levels().iter().zip(pyramid2.levels());
        for (done, (level, (i1, i2))) in levels.enumerate().rev().enumerate() {
            debug!("level {}: {}x{}", level, i1.width(), i1.height());

            let (coarse_forward, coarse_backward) = match fields.take() {
                Some((f, b)) => (Some(f), Some(b)),
                None => (None, None),
            };
            let mut forward = self.seed(coarse_forward, i1.size());
            let mut backward = self.seed(coarse_backward, i1.size());

            let level_progress = LevelProgress {
                sink: progress,
                levels_done: done,
                num_levels,
            };
            solver.solve_dual(i1, i2, &mut forward, &mut backward, &level_progress)?;
            level_progress.report(1.0);

            fields = Some((forward, backward));
        }

        fields.ok_or_else(|| FlowError::invalid("num_levels", "must be at least 1"))
    }
}
