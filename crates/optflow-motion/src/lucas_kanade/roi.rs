use std::ops::Range;

use optflow_image::Image;

/// Sliding window accumulator of the structure tensor of a gradient field.
///
/// The window is anchored at its top-left corner and may extend past the image,
/// in which case samples replicate the nearest border gradient. The running
/// tensor `G = sum w * [gx*gx, gx*gy; gx*gy, gy*gy]` is kept in `f64`.
///
/// Without a weighting kernel, [`Roi::translate`] updates the tensor by removing
/// the strip of columns or rows leaving the window and adding the strip entering
/// it. Moves of at least the window extent, and every move of a weighted window,
/// recompute the tensor over the whole window.
pub struct Roi<'a> {
    grads: &'a Image<f32, 2>,
    width: usize,
    height: usize,
    weights: Option<Vec<f32>>,
    x: isize,
    y: isize,
    sum_xx: f64,
    sum_xy: f64,
    sum_yy: f64,
}

impl<'a> Roi<'a> {
    /// Create a uniformly weighted window of `width` x `height` pixels over a
    /// two channel `(gx, gy)` gradient image.
    ///
    /// The window starts anchored at `(0, 0)` with a zero tensor; call
    /// [`Roi::initialize`] before reading it.
    pub fn new(grads: &'a Image<f32, 2>, width: usize, height: usize) -> Self {
        Self {
            grads,
            width,
            height,
            weights: None,
            x: 0,
            y: 0,
            sum_xx: 0.0,
            sum_xy: 0.0,
            sum_yy: 0.0,
        }
    }

    /// Create a window weighted by the outer product of two 1D kernels.
    ///
    /// The window size is `kernel_x.len()` x `kernel_y.len()`.
    pub fn with_separable_kernel(
        grads: &'a Image<f32, 2>,
        kernel_x: &[f32],
        kernel_y: &[f32],
    ) -> Self {
        let weights = kernel_y
            .iter()
            .flat_map(|&ky| kernel_x.iter().map(move |&kx| kx * ky))
            .collect();
        Self {
            weights: Some(weights),
            ..Self::new(grads, kernel_x.len(), kernel_y.len())
        }
    }

    /// Anchor the window at `(x, y)` and recompute the tensor from scratch.
    pub fn initialize(&mut self, x: isize, y: isize) {
        self.x = x;
        self.y = y;
        self.sum_xx = 0.0;
        self.sum_xy = 0.0;
        self.sum_yy = 0.0;

        for j in 0..self.height {
            for i in 0..self.width {
                let w = self.weight(i, j) as f64;
                let [gx, gy] = self.gradient(x + i as isize, y + j as isize);
                self.sum_xx += w * gx * gx;
                self.sum_xy += w * gx * gy;
                self.sum_yy += w * gy * gy;
            }
        }
    }

    /// Move the window by `(dx, dy)` pixels.
    pub fn translate(&mut self, dx: isize, dy: isize) {
        if self.weights.is_some()
            || dx.unsigned_abs() >= self.width
            || dy.unsigned_abs() >= self.height
        {
            self.initialize(self.x + dx, self.y + dy);
            return;
        }

        if dx != 0 {
            let (w, ys) = (self.width as isize, self.y..self.y + self.height as isize);
            let (leaving, entering) = if dx > 0 {
                (self.x..self.x + dx, self.x + w..self.x + w + dx)
            } else {
                (self.x + w + dx..self.x + w, self.x + dx..self.x)
            };
            self.accumulate(leaving, ys.clone(), -1.0);
            self.accumulate(entering, ys, 1.0);
            self.x += dx;
        }

        if dy != 0 {
            let (h, xs) = (self.height as isize, self.x..self.x + self.width as isize);
            let (leaving, entering) = if dy > 0 {
                (self.y..self.y + dy, self.y + h..self.y + h + dy)
            } else {
                (self.y + h + dy..self.y + h, self.y + dy..self.y)
            };
            self.accumulate(xs.clone(), leaving, -1.0);
            self.accumulate(xs, entering, 1.0);
            self.y += dy;
        }
    }

    /// Top-left corner of the window in image coordinates.
    pub fn anchor(&self) -> (isize, isize) {
        (self.x, self.y)
    }

    /// The gradient image the window slides over.
    pub fn gradients(&self) -> &'a Image<f32, 2> {
        self.grads
    }

    /// Window width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Window height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Weight of the window pixel at column `i` and row `j`.
    #[inline]
    pub fn weight(&self, i: usize, j: usize) -> f32 {
        match &self.weights {
            Some(weights) => weights[j * self.width + i],
            None => 1.0,
        }
    }

    /// Element `(row, col)` of the symmetric 2x2 structure tensor, or `None`
    /// when the index is out of bounds.
    pub fn gwg_element(&self, row: usize, col: usize) -> Option<f64> {
        match (row, col) {
            (0, 0) => Some(self.sum_xx),
            (0, 1) | (1, 0) => Some(self.sum_xy),
            (1, 1) => Some(self.sum_yy),
            _ => None,
        }
    }

    /// The structure tensor as `[sum_xx, sum_xy, sum_yy]`.
    pub fn structure_tensor(&self) -> [f64; 3] {
        [self.sum_xx, self.sum_xy, self.sum_yy]
    }

    #[inline]
    fn gradient(&self, x: isize, y: isize) -> [f64; 2] {
        [
            self.grads.get_clamped(x, y, 0) as f64,
            self.grads.get_clamped(x, y, 1) as f64,
        ]
    }

    fn accumulate(&mut self, xs: Range<isize>, ys: Range<isize>, sign: f64) {
        for y in ys {
            for x in xs.clone() {
                let [gx, gy] = self.gradient(x, y);
                self.sum_xx += sign * gx * gx;
                self.sum_xy += sign * gx * gy;
                self.sum_yy += sign * gy * gy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use optflow_image::ImageError;
    use rand::Rng;

    fn random_gradients(width: usize, height: usize) -> Result<Image<f32, 2>, ImageError> {
        let mut rng = rand::rng();
        let data = (0..width * height * 2)
            .map(|_| rng.random_range(-1.0f32..1.0))
            .collect();
        Image::new([width, height].into(), data)
    }

    fn assert_matches_fresh(roi: &Roi, fresh: &mut Roi) {
        let (x, y) = roi.anchor();
        fresh.initialize(x, y);
        for (a, b) in roi.structure_tensor().iter().zip(fresh.structure_tensor()) {
            assert_relative_eq!(*a, b, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn uniform_window_sums_outer_products() -> Result<(), ImageError> {
        let grads = Image::<f32, 2>::new([2, 1].into(), vec![1.0, 2.0, 3.0, -1.0])?;
        let mut roi = Roi::new(&grads, 2, 1);
        roi.initialize(0, 0);

        assert_eq!(roi.gwg_element(0, 0), Some(10.0));
        assert_eq!(roi.gwg_element(0, 1), Some(-1.0));
        assert_eq!(roi.gwg_element(1, 0), Some(-1.0));
        assert_eq!(roi.gwg_element(1, 1), Some(5.0));
        assert_eq!(roi.gwg_element(2, 0), None);
        Ok(())
    }

    #[test]
    fn window_outside_replicates_border() -> Result<(), ImageError> {
        let grads = Image::<f32, 2>::new([1, 1].into(), vec![2.0, 1.0])?;
        let mut roi = Roi::new(&grads, 3, 3);
        roi.initialize(-1, -1);
        assert_eq!(roi.structure_tensor(), [36.0, 18.0, 9.0]);
        Ok(())
    }

    #[test]
    fn raster_scan_matches_fresh_sums() -> Result<(), ImageError> {
        let grads = random_gradients(23, 17)?;
        let radius = 4isize;
        let size = 2 * radius as usize + 1;

        let mut roi = Roi::new(&grads, size, size);
        let mut fresh = Roi::new(&grads, size, size);
        roi.initialize(-radius, -radius);

        for _ in 0..grads.height() {
            for _ in 0..grads.width() {
                assert_matches_fresh(&roi, &mut fresh);
                roi.translate(1, 0);
            }
            roi.translate(-(grads.width() as isize), 1);
        }
        Ok(())
    }

    #[test]
    fn random_moves_match_fresh_sums() -> Result<(), ImageError> {
        let grads = random_gradients(31, 29)?;
        let mut rng = rand::rng();

        let mut roi = Roi::new(&grads, 7, 5);
        let mut fresh = Roi::new(&grads, 7, 5);
        roi.initialize(3, -2);

        for _ in 0..500 {
            let dx = rng.random_range(-9i32..=9) as isize;
            let dy = rng.random_range(-7i32..=7) as isize;
            roi.translate(dx, dy);
            assert_matches_fresh(&roi, &mut fresh);
        }
        Ok(())
    }

    #[test]
    fn weighted_window_matches_fresh_sums() -> Result<(), ImageError> {
        let grads = random_gradients(12, 10)?;
        let kernel = [0.25f32, 1.0, 0.25];

        let mut roi = Roi::with_separable_kernel(&grads, &kernel, &kernel);
        let mut fresh = Roi::with_separable_kernel(&grads, &kernel, &kernel);
        assert_eq!(roi.weight(1, 1), 1.0);
        assert_eq!(roi.weight(0, 2), 0.0625);

        roi.initialize(-1, -1);
        for step in 0..40 {
            roi.translate(if step % 5 == 4 { -4 } else { 1 }, (step % 3 == 0) as isize);
            assert_matches_fresh(&roi, &mut fresh);
        }
        Ok(())
    }
}
