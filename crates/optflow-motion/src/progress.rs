/// A sink for the fraction of work completed by a solver.
///
/// The reported value lies in `[0, 1]`. Sinks only observe progress; nothing
/// they do feeds back into the computation.
pub trait ProgressSink {
    /// Report the completed fraction of work.
    fn report(&self, fraction: f64);
}

impl<F: Fn(f64)> ProgressSink for F {
    fn report(&self, fraction: f64) {
        self(fraction)
    }
}

/// A sink that discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f64) {}
}

/// Fraction completed after iteration `i` of `num_iterations`.
pub(crate) fn iteration_fraction(i: usize, num_iterations: usize) -> f64 {
    if num_iterations <= 1 {
        return 1.0;
    }
    (i as f64 / (num_iterations - 1) as f64).clamp(0.0, 1.0)
}

/// Maps the progress of one pyramid level into the progress of the whole pyramid.
pub(crate) struct LevelProgress<'a> {
    pub(crate) sink: &'a dyn ProgressSink,
    pub(crate) levels_done: usize,
    pub(crate) num_levels: usize,
}

impl ProgressSink for LevelProgress<'_> {
    fn report(&self, fraction: f64) {
        let total = (self.levels_done as f64 + fraction) / self.num_levels as f64;
        self.sink.report(total.clamp(0.0, 1.0));
    }
}
