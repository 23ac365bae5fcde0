use optflow_image::{GrayImage, VectorField};

use crate::{
    error::FlowError,
    horn_schunck::HornSchunck,
    lucas_kanade::LucasKanade,
    progress::{NoProgress, ProgressSink},
    proesmans::Proesmans,
};

/// A solver refining one seeded vector field at a single resolution.
pub trait SingleFieldSolver: Sync {
    /// Refine `field` in place for the motion from `src1` to `src2`.
    ///
    /// The incoming displacement vectors are the initial guess; the quality
    /// channels are overwritten.
    ///
    /// # Arguments
    ///
    /// * `src1` - The first image.
    /// * `src2` - The second image, with the same size as `src1`.
    /// * `field` - The seeded vector field with the size of the images.
    /// * `progress` - Receives the completed fraction after each iteration.
    fn solve(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
        field: &mut VectorField,
        progress: &dyn ProgressSink,
    ) -> Result<(), FlowError>;
}

/// A solver refining a forward and a backward vector field jointly.
pub trait DualFieldSolver: Sync {
    /// Refine `forward` (from `src1` to `src2`) and `backward` (from `src2` to
    /// `src1`) in place.
    ///
    /// # Arguments
    ///
    /// * `src1` - The first image.
    /// * `src2` - The second image, with the same size as `src1`.
    /// * `forward` - The seeded forward field.
    /// * `backward` - The seeded backward field.
    /// * `progress` - Receives the completed fraction after each iteration.
    fn solve_dual(
        &self,
        src1: &GrayImage,
        src2: &GrayImage,
        forward: &mut VectorField,
        backward: &mut VectorField,
        progress: &dyn ProgressSink,
    ) -> Result<(), FlowError>;
}

/// The solving capability of an extractor, fixed when the extractor is built.
#[derive(Clone, Copy)]
pub enum Solver<'a> {
    /// Estimates the forward field only.
    Single(&'a dyn SingleFieldSolver),
    /// Estimates forward and backward fields jointly.
    Dual(&'a dyn DualFieldSolver),
}

/// Common interface of the single resolution dense motion extractors.
pub trait DenseMotionExtractor {
    /// Human readable name of the algorithm.
    fn name(&self) -> &'static str;

    /// Number of quality channels following the displacement in every pixel.
    fn num_quality_channels(&self) -> usize;

    /// Total number of channels of the produced vector fields.
    fn num_channels(&self) -> usize {
        2 + self.num_quality_channels()
    }

    /// The solving capability of the extractor.
    fn solver(&self) -> Solver<'_>;

    /// Whether the extractor estimates forward and backward fields jointly.
    fn is_dual(&self) -> bool {
        matches!(self.solver(), Solver::Dual(_))
    }
}

/// The closed set of available motion extractors.
#[derive(Clone, Debug, PartialEq)]
pub enum MotionExtractor {
    /// Horn-Schunck global smoothness solver.
    HornSchunck(HornSchunck),
    /// Lucas-Kanade local least squares solver.
    LucasKanade(LucasKanade),
    /// Proesmans bidirectional non-linear diffusion solver.
    Proesmans(Proesmans),
}

impl MotionExtractor {
    /// Compute the forward vector field from a zero seed at a single resolution.
    ///
    /// The dual extractor discards its backward field.
    pub fn compute(&self, src1: &GrayImage, src2: &GrayImage) -> Result<VectorField, FlowError> {
        match self {
            MotionExtractor::HornSchunck(e) => e.compute(src1, src2),
            MotionExtractor::LucasKanade(e) => e.compute(src1, src2),
            MotionExtractor::Proesmans(e) => e.compute(src1, src2),
        }
    }

    fn inner(&self) -> &dyn DenseMotionExtractor {
        match self {
            MotionExtractor::HornSchunck(e) => e,
            MotionExtractor::LucasKanade(e) => e,
            MotionExtractor::Proesmans(e) => e,
        }
    }
}

impl DenseMotionExtractor for MotionExtractor {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn num_quality_channels(&self) -> usize {
        self.inner().num_quality_channels()
    }

    fn solver(&self) -> Solver<'_> {
        self.inner().solver()
    }
}

impl From<HornSchunck> for MotionExtractor {
    fn from(e: HornSchunck) -> Self {
        MotionExtractor::HornSchunck(e)
    }
}

impl From<LucasKanade> for MotionExtractor {
    fn from(e: LucasKanade) -> Self {
        MotionExtractor::LucasKanade(e)
    }
}

impl From<Proesmans> for MotionExtractor {
    fn from(e: Proesmans) -> Self {
        MotionExtractor::Proesmans(e)
    }
}

/// Run a single field solver from a zero seed.
pub(crate) fn compute_single<S: SingleFieldSolver>(
    solver: &S,
    src1: &GrayImage,
    src2: &GrayImage,
    num_quality_channels: usize,
) -> Result<VectorField, FlowError> {
    let mut field = VectorField::new(src1.size(), num_quality_channels);
    solver.solve(src1, src2, &mut field, &NoProgress)?;
    Ok(field)
}

/// Check that both images and the seeded field agree on size and layout.
pub(crate) fn check_inputs(
    src1: &GrayImage,
    src2: &GrayImage,
    field: &VectorField,
    num_quality_channels: usize,
) -> Result<(), FlowError> {
    if src1.size() != src2.size() {
        return Err(FlowError::ImageSizeMismatch(src1.size(), src2.size()));
    }
    if field.size() != src1.size() {
        return Err(FlowError::FieldSizeMismatch(field.size(), src1.size()));
    }
    if field.num_quality_channels() != num_quality_channels {
        return Err(FlowError::QualityChannelMismatch(
            field.num_quality_channels(),
            num_quality_channels,
        ));
    }
    Ok(())
}
