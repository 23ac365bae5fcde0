//! Neighbour averages used by the diffusion solvers.

const DIRECT_WEIGHT: f32 = 1.0 / 6.0;
const DIAGONAL_WEIGHT: f32 = 1.0 / 12.0;

/// Weight sums at or below this value fall back to the current vector.
const MIN_WEIGHT_SUM: f32 = 1e-8;

/// Offsets of the four direct neighbours.
const DIRECT: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Offsets of the four diagonal neighbours.
const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

#[inline]
fn offset(width: usize, x: usize, y: usize, dx: isize, dy: isize) -> usize {
    (y as isize + dy) as usize * width + (x as isize + dx) as usize
}

/// Average the displacement of the 8-neighbourhood of an interior pixel.
///
/// Direct neighbours weigh `1/6` and diagonal neighbours `1/12`.
///
/// PRECONDITION: `0 < x < width - 1` and `0 < y < height - 1`.
#[inline]
pub(crate) fn neighbour_average(
    data: &[f32],
    width: usize,
    num_channels: usize,
    x: usize,
    y: usize,
) -> [f32; 2] {
    let mut direct = [0.0f32; 2];
    let mut diagonal = [0.0f32; 2];
    for &(dx, dy) in DIRECT.iter() {
        let o = offset(width, x, y, dx, dy) * num_channels;
        direct[0] += data[o];
        direct[1] += data[o + 1];
    }
    for &(dx, dy) in DIAGONAL.iter() {
        let o = offset(width, x, y, dx, dy) * num_channels;
        diagonal[0] += data[o];
        diagonal[1] += data[o + 1];
    }
    [
        direct[0] * DIRECT_WEIGHT + diagonal[0] * DIAGONAL_WEIGHT,
        direct[1] * DIRECT_WEIGHT + diagonal[1] * DIAGONAL_WEIGHT,
    ]
}

/// Average the 8-neighbourhood of an interior pixel with per-pixel weights.
///
/// The stencil weights of [`neighbour_average`] are multiplied by `weights` and
/// the result is normalized by their sum. A vanishing weight sum returns the
/// current vector of the pixel.
///
/// PRECONDITION: `0 < x < width - 1` and `0 < y < height - 1`.
#[inline]
pub(crate) fn weighted_neighbour_average(
    data: &[f32],
    weights: &[f32],
    width: usize,
    num_channels: usize,
    x: usize,
    y: usize,
) -> [f32; 2] {
    let mut sum_weights = 0.0f32;
    let mut acc = [0.0f32; 2];
    for (offsets, stencil) in [(&DIRECT, DIRECT_WEIGHT), (&DIAGONAL, DIAGONAL_WEIGHT)] {
        for &(dx, dy) in offsets.iter() {
            let p = offset(width, x, y, dx, dy);
            let w = weights[p] * stencil;
            sum_weights += w;
            acc[0] += w * data[p * num_channels];
            acc[1] += w * data[p * num_channels + 1];
        }
    }

    if sum_weights > MIN_WEIGHT_SUM {
        [acc[0] / sum_weights, acc[1] / sum_weights]
    } else {
        let o = (y * width + x) * num_channels;
        [data[o], data[o + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_field_average() {
        // 3x3 field, 2 channels, constant (2, -1)
        let data: Vec<f32> = (0..9).flat_map(|_| [2.0, -1.0]).collect();
        let avg = neighbour_average(&data, 3, 2, 1, 1);
        // the stencil weights sum to 1
        assert_relative_eq!(avg[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(avg[1], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn weighted_average_normalizes() {
        let mut data = vec![0.0f32; 9 * 3];
        let mut weights = vec![0.0f32; 9];
        // only the right neighbour carries weight
        data[5 * 3] = 4.0;
        data[5 * 3 + 1] = 8.0;
        weights[5] = 0.5;

        let avg = weighted_neighbour_average(&data, &weights, 3, 3, 1, 1);
        assert_relative_eq!(avg[0], 4.0, epsilon = 1e-6);
        assert_relative_eq!(avg[1], 8.0, epsilon = 1e-6);
    }

    #[test]
    fn weighted_average_falls_back() {
        let mut data = vec![1.0f32; 9 * 2];
        data[4 * 2] = 7.0;
        data[4 * 2 + 1] = -7.0;
        let weights = vec![0.0f32; 9];

        let avg = weighted_neighbour_average(&data, &weights, 3, 2, 1, 1);
        assert_eq!(avg, [7.0, -7.0]);
    }
}
