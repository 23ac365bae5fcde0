use optflow_image::{GrayImage, Image, ImageError};

use super::{kernels, separable_filter};
use crate::parallel;

const INTENSITY_SCALE: f32 = 1.0 / 255.0;

fn check_same_size<const C: usize>(
    src: &GrayImage,
    dst: &Image<f32, C>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

/// Interleave two single channel derivative images into a two channel image.
fn interleave(gx: &Image<f32, 1>, gy: &Image<f32, 1>, dst: &mut Image<f32, 2>) {
    dst.as_slice_mut()
        .chunks_exact_mut(2)
        .zip(gx.as_slice().iter().zip(gy.as_slice()))
        .for_each(|(out, (&dx, &dy))| {
            out[0] = dx;
            out[1] = dy;
        });
}

fn separable_gradients(
    src: &GrayImage,
    dst: &mut Image<f32, 2>,
    derivative: &[f32],
    smoothing: &[f32],
) -> Result<(), ImageError> {
    check_same_size(src, dst)?;

    let src_f32 = src.cast_and_scale::<f32>(INTENSITY_SCALE)?;

    let mut gx = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    separable_filter(&src_f32, &mut gx, derivative, smoothing)?;

    let mut gy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    separable_filter(&src_f32, &mut gy, smoothing, derivative)?;

    interleave(&gx, &gy, dst);

    Ok(())
}

/// Compute spatial derivatives with the 5-point central difference stencil.
///
/// Intensities are scaled to `[0, 1]` before differentiation and the border
/// is replicated.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, 1).
/// * `dst` - The destination image with shape (H, W, 2) holding `(gx, gy)`.
pub fn central_difference_gradients(
    src: &GrayImage,
    dst: &mut Image<f32, 2>,
) -> Result<(), ImageError> {
    let kernel = kernels::central_difference_kernel_1d();
    separable_gradients(src, dst, &kernel, &[1.0])
}

/// Compute spatial derivatives with the 3x3 Sobel operator normalized by `1/8`.
///
/// Intensities are scaled to `[0, 1]` before differentiation and the border
/// is replicated.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, 1).
/// * `dst` - The destination image with shape (H, W, 2) holding `(gx, gy)`.
pub fn sobel_gradients(src: &GrayImage, dst: &mut Image<f32, 2>) -> Result<(), ImageError> {
    let (derivative, smoothing) = kernels::sobel_kernel_1d();
    separable_gradients(src, dst, &derivative, &smoothing)
}

/// Compute spatiotemporal derivatives over 2x2x2 pixel blocks.
///
/// For every pixel `(x, y)` the forward differences of the block spanning
/// `(x..=x+1, y..=y+1)` are averaged over both frames. The last row and column
/// have no forward neighbour and copy the adjacent interior row and column.
///
/// # Arguments
///
/// * `src1` - The first frame with shape (H, W, 1).
/// * `src2` - The second frame with shape (H, W, 1).
/// * `dst` - The destination image with shape (H, W, 3) holding `(gx, gy, gt)`.
pub fn spatiotemporal_gradients(
    src1: &GrayImage,
    src2: &GrayImage,
    dst: &mut Image<f32, 3>,
) -> Result<(), ImageError> {
    check_same_size(src1, dst)?;
    check_same_size(src2, dst)?;

    let (rows, cols) = (dst.rows(), dst.cols());
    dst.as_slice_mut().iter_mut().for_each(|v| *v = 0.0);
    if rows < 2 || cols < 2 {
        return Ok(());
    }

    let (a, b) = (src1.as_slice(), src2.as_slice());
    let px = |data: &[u8], x: usize, y: usize| data[y * cols + x] as f32 * INTENSITY_SCALE;

    parallel::par_for_each_row(dst.as_slice_mut(), 3 * cols, |y, row| {
        if y + 1 >= rows {
            return;
        }
        for x in 0..cols - 1 {
            let (i00, i10, i20, i30) = (px(a, x, y), px(a, x + 1, y), px(a, x, y + 1), px(a, x + 1, y + 1));
            let (i01, i11, i21, i31) = (px(b, x, y), px(b, x + 1, y), px(b, x, y + 1), px(b, x + 1, y + 1));

            let out = &mut row[3 * x..3 * x + 3];
            out[0] = (i10 - i00 + i30 - i20 + i11 - i01 + i31 - i21) / 4.0;
            out[1] = (i20 - i00 + i30 - i10 + i21 - i01 + i31 - i11) / 4.0;
            out[2] = (i01 - i00 + i11 - i10 + i21 - i20 + i31 - i30) / 4.0;
        }
    });

    // copy the edge values from the interior neighbours
    let data = dst.as_slice_mut();
    let stride = 3 * cols;
    let (interior, last_row) = data.split_at_mut((rows - 1) * stride);
    last_row.copy_from_slice(&interior[(rows - 2) * stride..]);
    for row in data.chunks_exact_mut(stride) {
        row.copy_within(3 * (cols - 2)..3 * (cols - 1), 3 * (cols - 1));
    }

    Ok(())
}
