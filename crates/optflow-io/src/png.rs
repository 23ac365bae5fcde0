use std::path::Path;

use optflow_image::{GrayImage, Image, ImageSize};

use crate::error::IoError;

/// Read a PNG image with a single channel (mono8).
///
/// Color images are converted to luma.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// A grayscale image with a single channel (mono8).
pub fn read_image_png_mono8(file_path: impl AsRef<Path>) -> Result<GrayImage, IoError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?
        .into_luma8();

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(GrayImage::new(size, img.into_raw())?)
}

/// Write a single channel (mono8) image to a PNG file.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
/// * `image` - The grayscale image to write.
pub fn write_image_png_mono8(file_path: impl AsRef<Path>, image: &GrayImage) -> Result<(), IoError> {
    let [width, height]: [u32; 2] = image.size().into();
    let buffer = image::GrayImage::from_raw(width, height, image.as_slice().to_vec())
        .ok_or_else(|| IoError::PngEncodingError("buffer does not match the image size".into()))?;

    buffer.save_with_format(file_path, image::ImageFormat::Png)?;

    Ok(())
}

/// Write a three channel (rgb8) image to a PNG file.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
/// * `image` - The color image to write.
pub fn write_image_png_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
) -> Result<(), IoError> {
    let [width, height]: [u32; 2] = image.size().into();
    let buffer = image::RgbImage::from_raw(width, height, image.as_slice().to_vec())
        .ok_or_else(|| IoError::PngEncodingError("buffer does not match the image size".into()))?;

    buffer.save_with_format(file_path, image::ImageFormat::Png)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::create_dir_all;

    #[test]
    fn read_write_png_mono8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        create_dir_all(tmp_dir.path())?;

        let file_path = tmp_dir.path().join("ramp.png");
        let image = GrayImage::from_fn([13, 7].into(), |x, y, _| (x * 16 + y) as u8)?;
        write_image_png_mono8(&file_path, &image)?;

        let image_back = read_image_png_mono8(&file_path)?;
        assert!(file_path.exists(), "File does not exist: {:?}", file_path);

        assert_eq!(image_back.cols(), 13);
        assert_eq!(image_back.rows(), 7);
        assert_eq!(image_back, image);

        Ok(())
    }

    #[test]
    fn read_missing_file() {
        let result = read_image_png_mono8("does/not/exist.png");
        assert!(matches!(result, Err(IoError::FileDoesNotExist(_))));
    }

    #[test]
    fn write_png_rgb8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("motion.png");
        let rgb = Image::<u8, 3>::from_fn([5, 4].into(), |x, y, c| (x * 40 + y * 8 + c) as u8)?;
        write_image_png_rgb8(&file_path, &rgb)?;

        let decoded = image::open(&file_path)?.into_rgb8();
        assert_eq!(decoded.dimensions(), (5, 4));
        assert_eq!(decoded.as_raw().as_slice(), rgb.as_slice());

        // a color file reads back as luma
        let gray = read_image_png_mono8(&file_path)?;
        assert_eq!(gray.size(), rgb.size());
        Ok(())
    }
}
