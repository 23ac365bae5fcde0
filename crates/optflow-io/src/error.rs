/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error to open the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] optflow_image::ImageError),

    /// Error to decode or encode the image.
    #[error("Failed to decode the image. {0}")]
    ImageDecodeError(#[from] image::ImageError),

    /// Error to encode the PNG image.
    #[error("Failed to encode the png image. {0}")]
    PngEncodingError(String),

    /// The vector field data does not start with the expected magic.
    #[error("Invalid vector field magic, expected {expected:?}")]
    InvalidMagic {
        /// The magic the data should start with
        expected: &'static str,
    },

    /// A header line of the vector field data is malformed.
    #[error("Invalid vector field header: {0}")]
    InvalidHeader(String),

    /// The vector field payload is shorter than its header announces.
    #[error("Truncated vector field data: expected {expected} bytes, got {actual}")]
    TruncatedData {
        /// Payload length announced by the header
        expected: usize,
        /// Payload length available
        actual: usize,
    },
}
