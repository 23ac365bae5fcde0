use crate::{error::ImageError, image::Image, image::ImageSize};

/// A dense motion vector field.
///
/// Every pixel holds the displacement `(dx, dy)` followed by a fixed number of
/// quality channels, i.e. `2 + num_quality_channels` interleaved `f32` samples.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorField {
    size: ImageSize,
    num_quality_channels: usize,
    data: Vec<f32>,
}

impl VectorField {
    /// Create a zero initialized vector field.
    ///
    /// # Examples
    ///
    /// ```
    /// use optflow_image::VectorField;
    ///
    /// let field = VectorField::new([4, 3].into(), 1);
    ///
    /// assert_eq!(field.width(), 4);
    /// assert_eq!(field.height(), 3);
    /// assert_eq!(field.num_channels(), 3);
    /// assert_eq!(field.vector(3, 2), [0.0, 0.0]);
    /// ```
    pub fn new(size: ImageSize, num_quality_channels: usize) -> Self {
        Self {
            size,
            num_quality_channels,
            data: vec![0.0; size.area() * (2 + num_quality_channels)],
        }
    }

    /// Create a vector field from interleaved channel data.
    ///
    /// # Errors
    ///
    /// If the length of the data does not match the field size, an error is returned.
    pub fn from_vec(
        size: ImageSize,
        num_quality_channels: usize,
        data: Vec<f32>,
    ) -> Result<Self, ImageError> {
        let expected = size.area() * (2 + num_quality_channels);
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self {
            size,
            num_quality_channels,
            data,
        })
    }

    /// Get the size of the field in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the field in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the field in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Number of quality channels stored after the two displacement channels.
    pub fn num_quality_channels(&self) -> usize {
        self.num_quality_channels
    }

    /// Total number of channels per pixel.
    pub fn num_channels(&self) -> usize {
        2 + self.num_quality_channels
    }

    /// Get the interleaved channel data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Get the interleaved channel data mutably.
    pub fn as_slice_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.size.width + x) * self.num_channels()
    }

    /// Get a channel sample.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the field or `ch` is not a valid channel.
    #[inline]
    pub fn at(&self, x: usize, y: usize, ch: usize) -> f32 {
        debug_assert!(ch < self.num_channels());
        self.data[self.offset(x, y) + ch]
    }

    /// Set a channel sample.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the field or `ch` is not a valid channel.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, ch: usize, val: f32) {
        debug_assert!(ch < self.num_channels());
        let idx = self.offset(x, y) + ch;
        self.data[idx] = val;
    }

    /// Get a channel sample, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize, ch: usize) -> Option<f32> {
        if x >= self.width() || y >= self.height() || ch >= self.num_channels() {
            return None;
        }
        Some(self.at(x, y, ch))
    }

    /// Get the displacement vector at a pixel.
    #[inline]
    pub fn vector(&self, x: usize, y: usize) -> [f32; 2] {
        let o = self.offset(x, y);
        [self.data[o], self.data[o + 1]]
    }

    /// Set the displacement vector at a pixel.
    #[inline]
    pub fn set_vector(&mut self, x: usize, y: usize, v: [f32; 2]) {
        let o = self.offset(x, y);
        self.data[o] = v[0];
        self.data[o + 1] = v[1];
    }

    /// Get the `q`-th quality channel at a pixel.
    #[inline]
    pub fn quality(&self, x: usize, y: usize, q: usize) -> f32 {
        self.at(x, y, 2 + q)
    }

    /// Set the `q`-th quality channel at a pixel.
    #[inline]
    pub fn set_quality(&mut self, x: usize, y: usize, q: usize, val: f32) {
        self.set(x, y, 2 + q, val);
    }

    /// Fill one channel with a constant value.
    ///
    /// # Errors
    ///
    /// If the channel index is out of bounds, an error is returned.
    pub fn fill_channel(&mut self, ch: usize, val: f32) -> Result<(), ImageError> {
        let num_channels = self.num_channels();
        if ch >= num_channels {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, num_channels));
        }
        self.data
            .chunks_exact_mut(num_channels)
            .for_each(|pixel| pixel[ch] = val);
        Ok(())
    }

    /// Extract one channel as a single channel image.
    ///
    /// # Errors
    ///
    /// If the channel index is out of bounds, an error is returned.
    pub fn channel(&self, ch: usize) -> Result<Image<f32, 1>, ImageError> {
        let num_channels = self.num_channels();
        if ch >= num_channels {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, num_channels));
        }
        let data = self
            .data
            .chunks_exact(num_channels)
            .map(|pixel| pixel[ch])
            .collect();
        Image::new(self.size, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_field_layout() -> Result<(), ImageError> {
        let mut field = VectorField::new([3, 2].into(), 2);
        assert_eq!(field.num_channels(), 4);
        assert_eq!(field.as_slice().len(), 3 * 2 * 4);

        field.set_vector(2, 1, [1.5, -0.5]);
        field.set_quality(2, 1, 1, 0.25);
        assert_eq!(field.vector(2, 1), [1.5, -0.5]);
        assert_eq!(field.quality(2, 1, 1), 0.25);
        assert_eq!(&field.as_slice()[20..24], &[1.5, -0.5, 0.0, 0.25]);
        assert_eq!(field.get(3, 0, 0), None);
        assert_eq!(field.get(0, 0, 4), None);

        Ok(())
    }

    #[test]
    fn vector_field_from_vec() {
        let res = VectorField::from_vec([2, 2].into(), 1, vec![0.0; 11]);
        assert_eq!(res, Err(ImageError::InvalidChannelShape(11, 12)));
    }

    #[test]
    fn vector_field_channels() -> Result<(), ImageError> {
        let mut field = VectorField::new([2, 2].into(), 1);
        field.fill_channel(2, 1.0)?;
        field.set(1, 1, 0, 3.0);

        let quality = field.channel(2)?;
        assert_eq!(quality.as_slice(), &[1.0; 4]);

        let dx = field.channel(0)?;
        assert_eq!(dx.as_slice(), &[0.0, 0.0, 0.0, 3.0]);

        assert!(field.fill_channel(3, 0.0).is_err());

        Ok(())
    }
}
