//! Sums over square windows in time linear in the pixel count.

use rayon::prelude::*;

use crate::image_pipeline::common::parallel::transpose;
use crate::image_pipeline::denoise::types::Plane;

/// Sliding sums of width `2 * radius + 1` along every row of a single-channel
/// plane, returned transposed: the result is `height` wide and
/// `width - 2 * radius` high.
pub fn box_sum_transposed(plane: &Plane, radius: usize) -> Plane {
    debug_assert_eq!(plane.channels, 1);
    let (width, height) = (plane.width, plane.height);
    let window = 2 * radius + 1;
    let out_len = width.saturating_sub(2 * radius);
    if out_len == 0 || height == 0 {
        return Plane::mono(height, out_len);
    }

    let mut sums = vec![0.0f32; out_len * height];
    sums.par_chunks_mut(out_len)
        .zip(plane.data.par_chunks(width))
        .for_each(|(out, row)| {
            let mut acc: f64 = row[..window].iter().map(|&v| f64::from(v)).sum();
            out[0] = acc as f32;
            for x in 1..out_len {
                acc += f64::from(row[x + window - 1]) - f64::from(row[x - 1]);
                out[x] = acc as f32;
            }
        });

    Plane {
        width: height,
        height: out_len,
        channels: 1,
        data: transpose(&sums, out_len, height, 1),
    }
}

/// Sums over every `(2 * radius + 1)^2` window fully inside `plane`. The
/// result is `(width - 2 * radius) x (height - 2 * radius)`, indexed by the
/// window's top-left corner.
pub fn box_sum(plane: &Plane, radius: usize) -> Plane {
    // each pass transposes, so two passes restore the orientation
    box_sum_transposed(&box_sum_transposed(plane, radius), radius)
}
