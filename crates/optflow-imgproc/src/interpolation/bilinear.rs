use optflow_image::{Image, ImageSize, VectorField};

/// Kernel for bilinear interpolation over interleaved channel data.
///
/// # Arguments
///
/// * `data` - The interleaved samples with shape (height, width, num_channels).
/// * `size` - The size of the sampled grid.
/// * `num_channels` - The number of interleaved channels per pixel.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `c` - The channel to interpolate.
///
/// # Returns
///
/// The interpolated sample. Coordinates are clamped to the grid first, so the
/// border is replicated outside of it.
///
/// PRECONDITION: the grid is not empty and `c < num_channels`.
#[inline]
pub fn bilinear_interpolation<T>(
    data: &[T],
    size: ImageSize,
    num_channels: usize,
    u: f32,
    v: f32,
    c: usize,
) -> f32
where
    T: Copy + Into<f32>,
{
    let (rows, cols) = (size.height, size.width);

    let u = u.clamp(0.0, (cols - 1) as f32);
    let v = v.clamp(0.0, (rows - 1) as f32);

    let iu0 = u.floor() as usize;
    let iv0 = v.floor() as usize;

    let frac_u = u - iu0 as f32;
    let frac_v = v - iv0 as f32;

    let iu1 = (iu0 + 1).min(cols - 1);
    let iv1 = (iv0 + 1).min(rows - 1);

    let sample = |iu: usize, iv: usize| -> f32 { data[(iv * cols + iu) * num_channels + c].into() };

    let p00 = sample(iu0, iv0);
    let p01 = sample(iu1, iv0);
    let p10 = sample(iu0, iv1);
    let p11 = sample(iu1, iv1);

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    p00 * frac_uu * frac_vv + p01 * frac_u * frac_vv + p10 * frac_uu * frac_v + p11 * frac_u * frac_v
}

/// Interpolate a pixel value of an image at a sub-pixel position.
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `c` - The channel of the pixel to interpolate.
///
/// # Example
///
/// ```
/// use optflow_image::Image;
/// use optflow_imgproc::interpolation::interpolate_pixel;
///
/// let image = Image::<u8, 1>::new([2, 1].into(), vec![0, 100]).unwrap();
///
/// assert_eq!(interpolate_pixel(&image, 0.25, 0.0, 0), 25.0);
/// assert_eq!(interpolate_pixel(&image, -3.0, 0.0, 0), 0.0);
/// ```
#[inline]
pub fn interpolate_pixel<T, const C: usize>(image: &Image<T, C>, u: f32, v: f32, c: usize) -> f32
where
    T: Copy + Into<f32>,
{
    bilinear_interpolation(image.as_slice(), image.size(), C, u, v, c)
}

/// Interpolate the displacement vector of a field at a sub-pixel position.
#[inline]
pub fn interpolate_vector(field: &VectorField, u: f32, v: f32) -> [f32; 2] {
    let data = field.as_slice();
    let num_channels = field.num_channels();
    [
        bilinear_interpolation(data, field.size(), num_channels, u, v, 0),
        bilinear_interpolation(data, field.size(), num_channels, u, v, 1),
    ]
}
