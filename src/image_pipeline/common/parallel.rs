//! Row-parallel loops on the global rayon pool.
//!
//! Every helper returns only after all rows have been processed, so two
//! consecutive calls are separated by a full barrier.

use rayon::prelude::*;

/// Runs `f(y, row)` for each of the first `height` rows of `data`.
///
/// Rows are `row_stride` elements apart. The last row may be shorter than
/// `row_stride` when the buffer carries no trailing padding.
pub fn for_each_row<T, F>(data: &mut [T], row_stride: usize, height: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    data.par_chunks_mut(row_stride)
        .take(height)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Transposes a dense `width x height` grid of `channels`-sample pixels into
/// a `height x width` grid. Samples within a pixel keep their order.
pub fn transpose<T>(src: &[T], width: usize, height: usize, channels: usize) -> Vec<T>
where
    T: Copy + Default + Send + Sync,
{
    debug_assert!(src.len() >= width * height * channels);
    let mut dst = vec![T::default(); width * height * channels];
    if dst.is_empty() {
        return dst;
    }
    dst.par_chunks_mut(height * channels).enumerate().for_each(|(x, column)| {
        for (y, pixel) in column.chunks_exact_mut(channels).enumerate() {
            let start = (y * width + x) * channels;
            pixel.copy_from_slice(&src[start..start + channels]);
        }
    });
    dst
}
