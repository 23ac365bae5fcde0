/// Create a gaussian weighting window.
///
/// The window is not normalized: the center tap has weight one, so the outer
/// product of two windows also peaks at one.
///
/// # Arguments
///
/// * `kernel_size` - The size of the window.
/// * `sigma` - The sigma of the gaussian window.
pub fn gaussian_window_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mean = kernel_size.saturating_sub(1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    (0..kernel_size)
        .map(|i| {
            let x = i as f32 - mean;
            (-(x * x) / (2.0 * sigma_sq)).exp()
        })
        .collect()
}

/// Create a sobel kernel.
///
/// # Returns
///
/// The derivative and the smoothing taps, both scaled so that the 2D kernel
/// sums to `1/8` per side.
pub fn sobel_kernel_1d() -> (Vec<f32>, Vec<f32>) {
    (vec![-0.5, 0.0, 0.5], vec![0.25, 0.5, 0.25])
}

/// Create the 5-point central difference kernel `[1, -8, 0, 8, -1] / 12`.
pub fn central_difference_kernel_1d() -> Vec<f32> {
    vec![1.0 / 12.0, -8.0 / 12.0, 0.0, 8.0 / 12.0, -1.0 / 12.0]
}
