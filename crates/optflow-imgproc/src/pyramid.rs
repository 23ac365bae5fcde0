use optflow_image::{GrayImage, ImageError, ImageSize};

use crate::parallel;

/// Size of the next coarser pyramid level.
///
/// Each dimension is halved with floor division and never drops below one pixel.
pub fn pyrdown_size(size: ImageSize) -> ImageSize {
    ImageSize {
        width: (size.width / 2).max(1),
        height: (size.height / 2).max(1),
    }
}

/// Downsample an image by averaging non-overlapping 2x2 blocks.
///
/// The block average uses truncating integer division. When the source has an
/// odd width or height the last column or row is dropped; a one pixel wide or
/// high source averages the replicated border pixel.
///
/// # Arguments
///
/// * `src` - The source image to be downsampled.
/// * `dst` - The destination image with size [`pyrdown_size`] of the source.
///
/// # Example
///
/// ```
/// use optflow_image::GrayImage;
/// use optflow_imgproc::pyramid::pyrdown;
///
/// let image = GrayImage::new([2, 2].into(), vec![0, 1, 2, 4]).unwrap();
/// let mut down = GrayImage::from_size_val([1, 1].into(), 0).unwrap();
///
/// pyrdown(&image, &mut down).unwrap();
///
/// assert_eq!(down.as_slice(), &[1]);
/// ```
pub fn pyrdown(src: &GrayImage, dst: &mut GrayImage) -> Result<(), ImageError> {
    let expected = pyrdown_size(src.size());
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            expected.width,
            expected.height,
            dst.width(),
            dst.height(),
        ));
    }
    if src.width() == 0 || src.height() == 0 {
        return Ok(());
    }

    let (src_cols, src_rows) = (src.cols(), src.rows());
    let src_data = src.as_slice();
    let px = |x: usize, y: usize| src_data[y.min(src_rows - 1) * src_cols + x.min(src_cols - 1)] as u32;

    parallel::par_for_each_row(dst.as_slice_mut(), expected.width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let sum = px(2 * x, 2 * y)
                + px(2 * x + 1, 2 * y)
                + px(2 * x, 2 * y + 1)
                + px(2 * x + 1, 2 * y + 1);
            *out = (sum / 4) as u8;
        }
    });

    Ok(())
}

/// A coarse-to-fine image pyramid.
///
/// Level 0 is the source image unchanged; level `i` is level `i - 1`
/// downsampled with [`pyrdown`]. Level sizes are fixed at construction.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    levels: Vec<GrayImage>,
}

impl ImagePyramid {
    /// Build a pyramid with `num_levels` levels from a source image.
    ///
    /// A pyramid with zero levels is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use optflow_image::GrayImage;
    /// use optflow_imgproc::pyramid::ImagePyramid;
    ///
    /// let image = GrayImage::from_size_val([64, 48].into(), 128).unwrap();
    /// let pyramid = ImagePyramid::build(&image, 4).unwrap();
    ///
    /// assert_eq!(pyramid.num_levels(), 4);
    /// assert_eq!(pyramid.level(3).unwrap().width(), 8);
    /// assert_eq!(pyramid.level(3).unwrap().height(), 6);
    /// ```
    pub fn build(image: &GrayImage, num_levels: usize) -> Result<Self, ImageError> {
        let mut levels: Vec<GrayImage> = Vec::with_capacity(num_levels);
        if num_levels == 0 {
            return Ok(Self { levels });
        }

        levels.push(image.clone());
        for l in 1..num_levels {
            let prev = &levels[l - 1];
            let mut next = GrayImage::from_size_val(pyrdown_size(prev.size()), 0)?;
            pyrdown(prev, &mut next)?;
            levels.push(next);
        }

        Ok(Self { levels })
    }

    /// Get a pyramid level, 0 being the finest.
    pub fn level(&self, i: usize) -> Option<&GrayImage> {
        self.levels.get(i)
    }

    /// Number of levels in the pyramid.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// All levels ordered from fine to coarse.
    pub fn levels(&self) -> &[GrayImage] {
        &self.levels
    }
}
