//! The dense vector field format stores a short ASCII header
//!
//! ```text
//! PDV
//! <width> <height>
//! <num_quality_channels>
//! ```
//!
//! followed by the channels of every pixel in row-major order, each as a
//! little-endian `f32`.

use std::path::Path;

use optflow_image::{ImageSize, VectorField};

use crate::error::IoError;

const MAGIC: &str = "PDV";

/// Encode a vector field into bytes.
///
/// # Example
///
/// ```
/// use optflow_image::VectorField;
/// use optflow_io::vector_field::{decode_vector_field, encode_vector_field};
///
/// let mut field = VectorField::new([2, 1].into(), 1);
/// field.set_vector(1, 0, [0.25, -3.5]);
///
/// let bytes = encode_vector_field(&field);
/// assert!(bytes.starts_with(b"PDV\n2 1\n1\n"));
/// assert_eq!(decode_vector_field(&bytes).unwrap(), field);
/// ```
pub fn encode_vector_field(field: &VectorField) -> Vec<u8> {
    let header = format!(
        "{MAGIC}\n{} {}\n{}\n",
        field.width(),
        field.height(),
        field.num_quality_channels()
    );

    let mut bytes = Vec::with_capacity(header.len() + 4 * field.as_slice().len());
    bytes.extend_from_slice(header.as_bytes());
    for v in field.as_slice() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Split the next newline terminated header line off `bytes`.
fn next_line<'a>(bytes: &mut &'a [u8]) -> Result<&'a str, IoError> {
    let end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| IoError::InvalidHeader("missing line break".into()))?;
    let line = std::str::from_utf8(&bytes[..end])
        .map_err(|_| IoError::InvalidHeader("header is not valid text".into()))?;
    *bytes = &bytes[end + 1..];
    Ok(line.trim())
}

fn parse_number(token: Option<&str>, what: &str) -> Result<usize, IoError> {
    let token = token.ok_or_else(|| IoError::InvalidHeader(format!("missing {what}")))?;
    token
        .parse()
        .map_err(|_| IoError::InvalidHeader(format!("invalid {what} `{token}`")))
}

/// Decode a vector field from bytes.
///
/// # Errors
///
/// Fails on a wrong magic, a malformed header or a payload shorter than the
/// header announces.
pub fn decode_vector_field(bytes: &[u8]) -> Result<VectorField, IoError> {
    let mut rest = bytes;

    if !rest.starts_with(MAGIC.as_bytes()) || next_line(&mut rest)? != MAGIC {
        return Err(IoError::InvalidMagic { expected: MAGIC });
    }

    let mut dims = next_line(&mut rest)?.split_whitespace();
    let width = parse_number(dims.next(), "width")?;
    let height = parse_number(dims.next(), "height")?;
    let num_quality_channels = parse_number(next_line(&mut rest)?.split_whitespace().next(), "number of quality channels")?;

    let num_values = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(2 + num_quality_channels))
        .ok_or_else(|| IoError::InvalidHeader("field dimensions overflow".into()))?;
    let expected = num_values
        .checked_mul(4)
        .ok_or_else(|| IoError::InvalidHeader("field dimensions overflow".into()))?;
    if rest.len() < expected {
        return Err(IoError::TruncatedData {
            expected,
            actual: rest.len(),
        });
    }

    let data = rest[..expected]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok(VectorField::from_vec(
        ImageSize { width, height },
        num_quality_channels,
        data,
    )?)
}

/// Write a vector field to a file.
///
/// # Arguments
///
/// * `file_path` - The path of the file to write.
/// * `field` - The vector field to write.
pub fn write_vector_field(file_path: impl AsRef<Path>, field: &VectorField) -> Result<(), IoError> {
    std::fs::write(file_path, encode_vector_field(field))?;
    Ok(())
}

/// Read a vector field from a file.
///
/// # Arguments
///
/// * `file_path` - The path of the file to read.
pub fn read_vector_field(file_path: impl AsRef<Path>) -> Result<VectorField, IoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    decode_vector_field(&std::fs::read(file_path)?)
}
