use optflow_image::{GrayImage, ImageError, VectorField};

use crate::parallel;

/// Number of histogram bins used by [`equalize_channel`].
pub const NUM_EQUALIZATION_BINS: usize = 256;

/// Smallest and largest value of one channel of a vector field.
///
/// # Errors
///
/// Fails when the channel does not exist or the field has no pixels.
pub fn channel_range(field: &VectorField, ch: usize) -> Result<(f32, f32), ImageError> {
    let num_channels = field.num_channels();
    if ch >= num_channels {
        return Err(ImageError::ChannelIndexOutOfBounds(ch, num_channels));
    }

    let mut values = field.as_slice().iter().skip(ch).step_by(num_channels);
    let first = *values.next().ok_or(ImageError::ImageDataNotInitialized)?;
    Ok(values.fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
}

/// Render one channel of a vector field as a histogram equalized grayscale image.
///
/// The channel values are binned into [`NUM_EQUALIZATION_BINS`] bins between
/// their minimum and maximum. Every pixel maps to the cumulative count of its
/// bin, stretched so that the first bin becomes 0 and the last becomes 255. A
/// constant channel renders black.
///
/// # Arguments
///
/// * `field` - The vector field.
/// * `ch` - The channel to render, 2 being the first quality channel.
/// * `dst` - The destination image with the size of the field.
///
/// # Example
///
/// ```
/// use optflow_image::{GrayImage, VectorField};
/// use optflow_imgproc::histogram::equalize_channel;
///
/// let mut field = VectorField::new([4, 1].into(), 1);
/// for (x, q) in [0.0, 0.01, 0.02, 100.0].into_iter().enumerate() {
///     field.set_quality(x, 0, 0, q);
/// }
///
/// let mut image = GrayImage::from_size_val(field.size(), 0).unwrap();
/// equalize_channel(&field, 2, &mut image).unwrap();
///
/// assert_eq!(image.as_slice(), &[0, 0, 0, 255]);
/// ```
pub fn equalize_channel(
    field: &VectorField,
    ch: usize,
    dst: &mut GrayImage,
) -> Result<(), ImageError> {
    if field.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            field.width(),
            field.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let (min, max) = channel_range(field, ch)?;
    if max <= min {
        dst.as_slice_mut().iter_mut().for_each(|v| *v = 0);
        return Ok(());
    }

    let num_channels = field.num_channels();
    let data = field.as_slice();
    let scale = (NUM_EQUALIZATION_BINS - 1) as f32 / (max - min);
    let bin = |v: f32| (((v - min) * scale) as usize).min(NUM_EQUALIZATION_BINS - 1);

    let mut cumulative = [0usize; NUM_EQUALIZATION_BINS];
    for &v in data.iter().skip(ch).step_by(num_channels) {
        cumulative[bin(v)] += 1;
    }
    for i in 1..NUM_EQUALIZATION_BINS {
        cumulative[i] += cumulative[i - 1];
    }

    // the smallest value sits in the first bin, the largest one in the last
    // occupied bin
    let lo = cumulative[0] as f32;
    let hi = cumulative[bin(max)] as f32;
    if hi <= lo {
        dst.as_slice_mut().iter_mut().for_each(|v| *v = 0);
        return Ok(());
    }

    let width = field.width();
    parallel::par_for_each_row(dst.as_slice_mut(), width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let v = data[(y * width + x) * num_channels + ch];
            let level = (cumulative[bin(v)] as f32 - lo) * 255.0 / (hi - lo);
            *out = level.clamp(0.0, 255.0) as u8;
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quality_field(values: &[f32], width: usize) -> VectorField {
        let mut field = VectorField::new([width, values.len() / width].into(), 1);
        for (i, &q) in values.iter().enumerate() {
            field.set_quality(i % width, i / width, 0, q);
        }
        field
    }

    #[test]
    fn range_of_quality_channel() -> Result<(), ImageError> {
        let field = quality_field(&[0.5, -2.0, 3.0, 1.0], 2);
        assert_eq!(channel_range(&field, 2)?, (-2.0, 3.0));
        assert_eq!(channel_range(&field, 0)?, (0.0, 0.0));
        assert_eq!(
            channel_range(&field, 3),
            Err(ImageError::ChannelIndexOutOfBounds(3, 3))
        );
        Ok(())
    }

    #[test]
    fn range_of_empty_field() {
        let field = VectorField::new([0, 3].into(), 1);
        assert_eq!(
            channel_range(&field, 2),
            Err(ImageError::ImageDataNotInitialized)
        );
    }

    #[test]
    fn equalization_spreads_ranks() -> Result<(), ImageError> {
        // evenly spaced values map to evenly spaced levels
        let field = quality_field(&[0.0, 1.0, 2.0, 3.0, 4.0], 5);
        let mut image = GrayImage::from_size_val(field.size(), 7)?;
        equalize_channel(&field, 2, &mut image)?;
        assert_eq!(image.as_slice(), &[0, 63, 127, 191, 255]);
        Ok(())
    }

    #[test]
    fn equalization_is_monotone() -> Result<(), ImageError> {
        let values: Vec<f32> = (0..64).map(|i| ((i * 37) % 64) as f32 * 0.1 + (i % 3) as f32).collect();
        let field = quality_field(&values, 8);
        let mut image = GrayImage::from_size_val(field.size(), 0)?;
        equalize_channel(&field, 2, &mut image)?;

        let levels = image.as_slice();
        for i in 0..values.len() {
            for j in 0..values.len() {
                if values[i] < values[j] {
                    assert!(levels[i] <= levels[j]);
                }
            }
        }
        assert_eq!(levels.iter().max(), Some(&255));
        Ok(())
    }

    #[test]
    fn constant_channel_is_black() -> Result<(), ImageError> {
        let field = quality_field(&[0.3; 6], 3);
        let mut image = GrayImage::from_size_val(field.size(), 9)?;
        equalize_channel(&field, 2, &mut image)?;
        assert!(image.as_slice().iter().all(|&v| v == 0));
        Ok(())
    }

    #[test]
    fn equalize_size_mismatch() -> Result<(), ImageError> {
        let field = quality_field(&[0.0, 1.0], 2);
        let mut image = GrayImage::from_size_val([1, 2].into(), 0)?;
        assert!(equalize_channel(&field, 2, &mut image).is_err());
        Ok(())
    }
}
