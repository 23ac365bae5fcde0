/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image size is not valid.
    #[error("Invalid image size ({0}, {1}) mismatch ({2}, {3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the pixel index is out of bounds.
    #[error("Pixel index ({0}, {1}) out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index {0} out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when the image holds no pixel data.
    #[error("Image data is not initialized")]
    ImageDataNotInitialized,

    /// Error when an interpolation parameter lies outside of `[0, 1]`.
    #[error("Interpolation parameter {0} is outside of [0, 1]")]
    InvalidInterpolationParameter(f32),

    /// Error when the pixel data cannot be cast.
    #[error("Failed to cast image data")]
    CastError,
}
