use rayon::prelude::*;

use optflow_image::Image;

/// Apply a function to each pixel in the image in parallel.
///
/// Rows are distributed over the global Rayon thread pool; pixels within a row
/// are visited sequentially.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Copy + Send + Sync,
    T2: Copy + Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each output row in parallel.
///
/// The closure receives the row index and the mutable row slice of length
/// `row_stride`. Every row is written by exactly one task, so the result does
/// not depend on scheduling.
pub fn par_for_each_row<T>(
    dst: &mut [T],
    row_stride: usize,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send,
{
    if row_stride == 0 {
        return;
    }
    dst.par_chunks_exact_mut(row_stride)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}
