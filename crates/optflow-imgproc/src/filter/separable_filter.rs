use optflow_image::{Image, ImageError};

use crate::parallel;

/// A separable 2D correlation applying a horizontal then a vertical 1D pass.
///
/// Samples outside the image replicate the nearest border pixel.
struct SeparableFilter<'a> {
    kernel_x: &'a [f32],
    kernel_y: &'a [f32],
    half_x: isize,
    half_y: isize,
}

impl<'a> SeparableFilter<'a> {
    fn new(kernel_x: &'a [f32], kernel_y: &'a [f32]) -> Self {
        Self {
            kernel_x,
            kernel_y,
            half_x: (kernel_x.len() / 2) as isize,
            half_y: (kernel_y.len() / 2) as isize,
        }
    }

    fn apply(&self, src: &Image<f32, 1>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
        let (rows, cols) = (src.rows(), src.cols());
        if rows == 0 || cols == 0 {
            return Ok(());
        }

        let src_data = src.as_slice();
        let mut temp = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;

        // horizontal pass
        parallel::par_for_each_row(temp.as_slice_mut(), cols, |r, row| {
            let src_row = &src_data[r * cols..(r + 1) * cols];
            for (c, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (i, &k) in self.kernel_x.iter().enumerate() {
                    let x = (c as isize + i as isize - self.half_x).clamp(0, cols as isize - 1);
                    acc += src_row[x as usize] * k;
                }
                *out = acc;
            }
        });

        // vertical pass
        let temp_data = temp.as_slice();
        parallel::par_for_each_row(dst.as_slice_mut(), cols, |r, row| {
            for (c, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (i, &k) in self.kernel_y.iter().enumerate() {
                    let y = (r as isize + i as isize - self.half_y).clamp(0, rows as isize - 1);
                    acc += temp_data[y as usize * cols + c] * k;
                }
                *out = acc;
            }
        });

        Ok(())
    }
}

/// Apply a separable filter to a single channel image.
///
/// The kernels are applied as correlations (not flipped) and the border is
/// replicated.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, 1).
/// * `dst` - The destination image with shape (H, W, 1).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn separable_filter(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    SeparableFilter::new(kernel_x, kernel_y).apply(src, dst)
}
