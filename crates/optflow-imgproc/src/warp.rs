use optflow_image::{GrayImage, ImageError, VectorField};

use crate::interpolation::interpolate_pixel;
use crate::parallel;

/// Warp an image backwards along a dense vector field.
///
/// Every destination pixel `(x, y)` gathers the source intensity at
/// `(x + t * u(x, y), y + t * v(x, y))` with bilinear interpolation, where `t`
/// is the time step multiplier. Samples outside the source replicate its border.
///
/// # Arguments
///
/// * `src` - The image to warp.
/// * `field` - The vector field defined on the destination grid.
/// * `multiplier` - The time step multiplier `t`.
/// * `dst` - The warped image.
///
/// PRECONDITION: `src`, `field` and `dst` must have the same size.
///
/// # Example
///
/// ```
/// use optflow_image::{GrayImage, VectorField};
/// use optflow_imgproc::warp::extrapolate_inverse;
///
/// let src = GrayImage::new([3, 1].into(), vec![0, 100, 200]).unwrap();
/// let mut field = VectorField::new(src.size(), 0);
/// field.set_vector(0, 0, [1.0, 0.0]);
///
/// let mut dst = GrayImage::from_size_val(src.size(), 0).unwrap();
/// extrapolate_inverse(&src, &field, 0.5, &mut dst).unwrap();
///
/// assert_eq!(dst.as_slice(), &[50, 100, 200]);
/// ```
pub fn extrapolate_inverse(
    src: &GrayImage,
    field: &VectorField,
    multiplier: f32,
    dst: &mut GrayImage,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    if field.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            field.width(),
            field.height(),
            dst.width(),
            dst.height(),
        ));
    }

    parallel::par_for_each_row(dst.as_slice_mut(), src.width(), |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let [u, v] = field.vector(x, y);
            let xs = x as f32 + multiplier * u;
            let ys = y as f32 + multiplier * v;
            *out = interpolate_pixel(src, xs, ys, 0).round().clamp(0.0, 255.0) as u8;
        }
    });

    Ok(())
}

/// Morph between two images along their forward and backward vector fields.
///
/// The intermediate image at time `t` blends both images warped towards it:
/// `src1` is extrapolated along `backward` by `t`, `src2` along `forward` by
/// `1 - t`, and the two are mixed with weights `1 - t` and `t`. At `t = 0` the
/// result is `src1` and at `t = 1` it is `src2`.
///
/// # Arguments
///
/// * `src1` - The image at time 0.
/// * `src2` - The image at time 1.
/// * `forward` - The vector field from `src1` to `src2`.
/// * `backward` - The vector field from `src2` to `src1`.
/// * `t` - The time of the intermediate image in `[0, 1]`.
/// * `dst` - The intermediate image.
///
/// # Errors
///
/// Fails with [`ImageError::InvalidInterpolationParameter`] when `t` lies
/// outside of `[0, 1]`, and when the sizes of the inputs differ.
pub fn morph(
    src1: &GrayImage,
    src2: &GrayImage,
    forward: &VectorField,
    backward: &VectorField,
    t: f32,
    dst: &mut GrayImage,
) -> Result<(), ImageError> {
    if !(0.0..=1.0).contains(&t) {
        return Err(ImageError::InvalidInterpolationParameter(t));
    }

    let mut warped1 = GrayImage::from_size_val(dst.size(), 0)?;
    extrapolate_inverse(src1, backward, t, &mut warped1)?;
    let mut warped2 = GrayImage::from_size_val(dst.size(), 0)?;
    extrapolate_inverse(src2, forward, 1.0 - t, &mut warped2)?;

    let (a, b) = (warped1.as_slice(), warped2.as_slice());
    let width = dst.width();
    parallel::par_for_each_row(dst.as_slice_mut(), width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let i = y * width + x;
            let blend = (1.0 - t) * a[i] as f32 + t * b[i] as f32;
            *out = blend.round().clamp(0.0, 255.0) as u8;
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extrapolate_zero_field_is_identity() -> Result<(), ImageError> {
        let src = GrayImage::from_fn([7, 5].into(), |x, y, _| (x * 20 + y * 3) as u8)?;
        let field = VectorField::new(src.size(), 1);
        let mut dst = GrayImage::from_size_val(src.size(), 0)?;
        extrapolate_inverse(&src, &field, 3.0, &mut dst)?;
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn extrapolate_integer_shift() -> Result<(), ImageError> {
        let src = GrayImage::from_fn([8, 4].into(), |x, _, _| (x * 10) as u8)?;
        let mut field = VectorField::new(src.size(), 0);
        for y in 0..4 {
            for x in 0..8 {
                field.set_vector(x, y, [-2.0, 0.0]);
            }
        }
        let mut dst = GrayImage::from_size_val(src.size(), 0)?;
        extrapolate_inverse(&src, &field, 1.0, &mut dst)?;

        for x in 0..8 {
            let expected = (x.max(2) - 2) * 10;
            assert_eq!(dst.get_pixel(x, 1, 0)?, expected as u8);
        }
        Ok(())
    }

    fn shifted_pair() -> Result<(GrayImage, GrayImage, VectorField, VectorField), ImageError> {
        let src1 = GrayImage::from_fn([12, 3].into(), |x, _, _| (x * 20) as u8)?;
        let src2 = GrayImage::from_fn([12, 3].into(), |x, _, _| (x.max(2) * 20 - 40) as u8)?;
        let mut forward = VectorField::new(src1.size(), 1);
        let mut backward = VectorField::new(src1.size(), 1);
        for y in 0..3 {
            for x in 0..12 {
                forward.set_vector(x, y, [2.0, 0.0]);
                backward.set_vector(x, y, [-2.0, 0.0]);
            }
        }
        Ok((src1, src2, forward, backward))
    }

    #[test]
    fn morph_end_points_are_the_sources() -> Result<(), ImageError> {
        let (src1, src2, forward, backward) = shifted_pair()?;
        let mut dst = GrayImage::from_size_val(src1.size(), 0)?;

        morph(&src1, &src2, &forward, &backward, 0.0, &mut dst)?;
        assert_eq!(dst, src1);

        morph(&src1, &src2, &forward, &backward, 1.0, &mut dst)?;
        assert_eq!(dst, src2);
        Ok(())
    }

    #[test]
    fn morph_halfway_moves_half_the_distance() -> Result<(), ImageError> {
        let (src1, src2, forward, backward) = shifted_pair()?;
        let mut dst = GrayImage::from_size_val(src1.size(), 0)?;
        morph(&src1, &src2, &forward, &backward, 0.5, &mut dst)?;

        // away from the border both warped images agree on a one pixel shift
        for x in 1..11 {
            assert_eq!(dst.get_pixel(x, 1, 0)?, ((x - 1) * 20) as u8);
        }
        Ok(())
    }

    #[test]
    fn morph_rejects_time_outside_unit_interval() -> Result<(), ImageError> {
        let (src1, src2, forward, backward) = shifted_pair()?;
        let mut dst = GrayImage::from_size_val(src1.size(), 0)?;
        for t in [-0.1, 1.5, f32::NAN] {
            assert!(matches!(
                morph(&src1, &src2, &forward, &backward, t, &mut dst),
                Err(ImageError::InvalidInterpolationParameter(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn extrapolate_size_mismatch() -> Result<(), ImageError> {
        let src = GrayImage::from_size_val([4, 4].into(), 0)?;
        let field = VectorField::new([3, 4].into(), 0);
        let mut dst = GrayImage::from_size_val(src.size(), 0)?;
        assert!(extrapolate_inverse(&src, &field, 1.0, &mut dst).is_err());
        Ok(())
    }
}
