use optflow_image::{GrayImage, Image, ImageError, VectorField};

use crate::histogram::equalize_channel;

/// Brightness of the background image under an illustration.
const BACKGROUND_SCALE: f32 = 0.75;

/// Set a pixel if it lies inside the image.
#[inline]
fn set_pixel<const C: usize>(img: &mut Image<u8, C>, x: i64, y: i64, color: [u8; C]) {
    if x < 0 || y < 0 || x >= img.cols() as i64 || y >= img.rows() as i64 {
        return;
    }
    let start = (y as usize * img.cols() + x as usize) * C;
    img.as_slice_mut()[start..start + C].copy_from_slice(&color);
}

/// Draws a line on an image inplace using Bresenham's algorithm.
///
/// Pixels outside the image are skipped.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `p0` - The start point of the line as a tuple of (x, y).
/// * `p1` - The end point of the line as a tuple of (x, y).
/// * `color` - The color of the line as an array of `C` elements.
pub fn draw_line<const C: usize>(
    img: &mut Image<u8, C>,
    p0: (i64, i64),
    p1: (i64, i64),
    color: [u8; C],
) {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        set_pixel(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draws an arrow from `p0` to `p1` with a two stroke head.
///
/// The head strokes leave the tip at 45 degrees to the shaft and are
/// `head_length` pixels long. A zero length arrow is a single point.
pub fn draw_arrow<const C: usize>(
    img: &mut Image<u8, C>,
    p0: (i64, i64),
    p1: (i64, i64),
    color: [u8; C],
    head_length: f32,
) {
    draw_line(img, p0, p1, color);
    if p0 == p1 {
        return;
    }

    let back = ((p0.1 - p1.1) as f32).atan2((p0.0 - p1.0) as f32);
    for angle in [back - std::f32::consts::FRAC_PI_4, back + std::f32::consts::FRAC_PI_4] {
        let end = (
            p1.0 + (head_length * angle.cos()).round() as i64,
            p1.1 + (head_length * angle.sin()).round() as i64,
        );
        draw_line(img, p1, end, color);
    }
}

/// Illustrate a dense vector field with arrows over a darkened image.
///
/// One arrow is drawn every `spacing` pixels in both directions, starting
/// `spacing / 2` pixels from the top left corner. Each arrow spans the vector
/// of its start pixel. Arrows are colored by the first quality channel after
/// histogram equalization, from red for the lowest quality to green for the
/// highest. Fields without quality channels are drawn in green.
///
/// # Arguments
///
/// * `background` - The grayscale image drawn under the arrows.
/// * `field` - The vector field to illustrate.
/// * `spacing` - The distance between arrows in pixels.
/// * `dst` - The destination color image.
///
/// PRECONDITION: `background`, `field` and `dst` must have the same size.
pub fn render_vector_field(
    background: &GrayImage,
    field: &VectorField,
    spacing: usize,
    dst: &mut Image<u8, 3>,
) -> Result<(), ImageError> {
    for size in [background.size(), field.size()] {
        if size != dst.size() {
            return Err(ImageError::InvalidImageSize(
                size.width,
                size.height,
                dst.width(),
                dst.height(),
            ));
        }
    }

    dst.as_slice_mut()
        .chunks_exact_mut(3)
        .zip(background.as_slice())
        .for_each(|(pixel, &v)| pixel.fill((v as f32 * BACKGROUND_SCALE) as u8));

    let mut quality = GrayImage::from_size_val(field.size(), 255)?;
    if field.num_quality_channels() > 0 {
        equalize_channel(field, 2, &mut quality)?;
    }

    let spacing = spacing.max(1);
    let head_length = spacing as f32 / 5.0;
    for y in (spacing / 2..field.height()).step_by(spacing) {
        for x in (spacing / 2..field.width()).step_by(spacing) {
            let [u, v] = field.vector(x, y);
            let q = quality.get_pixel(x, y, 0)?;
            let start = (x as i64, y as i64);
            let tip = (start.0 + u.round() as i64, start.1 + v.round() as i64);
            draw_arrow(dst, start, tip, [255 - q, q, 127], head_length);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_is_clipped() -> Result<(), ImageError> {
        let mut img = Image::<u8, 1>::from_size_val([4, 3].into(), 0)?;
        draw_line(&mut img, (-2, 1), (5, 1), [9]);
        assert_eq!(img.as_slice(), &[0, 0, 0, 0, 9, 9, 9, 9, 0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn diagonal_line() -> Result<(), ImageError> {
        let mut img = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        draw_line(&mut img, (2, 2), (0, 0), [1]);
        assert_eq!(img.as_slice(), &[1, 0, 0, 0, 1, 0, 0, 0, 1]);
        Ok(())
    }

    #[test]
    fn zero_field_marks_sample_points() -> Result<(), ImageError> {
        let background = GrayImage::from_size_val([8, 8].into(), 200)?;
        let field = VectorField::new(background.size(), 0);
        let mut dst = Image::<u8, 3>::from_size_val(background.size(), 0)?;
        render_vector_field(&background, &field, 4, &mut dst)?;

        let pixel = |x: usize, y: usize| [0, 1, 2].map(|c| dst.get_pixel(x, y, c).unwrap_or(0));
        for y in 0..8 {
            for x in 0..8 {
                let expected = if x % 4 == 2 && y % 4 == 2 {
                    [0, 255, 127]
                } else {
                    [150, 150, 150]
                };
                assert_eq!(pixel(x, y), expected);
            }
        }
        Ok(())
    }

    #[test]
    fn arrow_follows_vector() -> Result<(), ImageError> {
        let background = GrayImage::from_size_val([16, 16].into(), 0)?;
        let mut field = VectorField::new(background.size(), 1);
        field.set_vector(8, 8, [3.0, 0.0]);
        let mut dst = Image::<u8, 3>::from_size_val(background.size(), 0)?;
        render_vector_field(&background, &field, 16, &mut dst)?;

        // a constant quality equalizes to the lowest level
        let red = [255, 0, 127];
        let pixel = |x: usize, y: usize| [0, 1, 2].map(|c| dst.get_pixel(x, y, c).unwrap_or(0));
        for x in 8..=11 {
            assert_eq!(pixel(x, 8), red);
        }
        assert_eq!(pixel(12, 8), [0, 0, 0]);
        assert_eq!(pixel(7, 8), [0, 0, 0]);
        // head strokes point back to the start
        assert_eq!(pixel(10, 7), red);
        assert_eq!(pixel(10, 9), red);
        Ok(())
    }

    #[test]
    fn render_size_mismatch() -> Result<(), ImageError> {
        let background = GrayImage::from_size_val([4, 4].into(), 0)?;
        let field = VectorField::new([4, 3].into(), 0);
        let mut dst = Image::<u8, 3>::from_size_val(background.size(), 0)?;
        assert!(render_vector_field(&background, &field, 2, &mut dst).is_err());
        Ok(())
    }
}
