//! Bilateral filtering of YST planes.
//!
//! The separable filter runs a row pass, then the same pass on the transposed
//! plane. Pixels closer than the window radius to an edge keep their value.
//! Planes with several channels share one weight computed from the summed
//! squared differences, which is how S and T are filtered jointly.

use crate::image_pipeline::common::math::fast_exp;
use crate::image_pipeline::common::parallel::for_each_row;
use crate::image_pipeline::denoise::types::{FilterParams, MAX_CHANNELS, Plane};

#[inline]
pub(crate) fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(p, q)| (p - q) * (p - q)).sum()
}

/// Separable bilateral filter, in place.
pub fn bilateral_separable(plane: &mut Plane, params: &FilterParams) {
    if params.is_negligible() || plane.data.is_empty() {
        return;
    }
    filter_rows(plane, params);
    let mut columns = plane.transposed();
    filter_rows(&mut columns, params);
    *plane = columns.transposed();
}

fn filter_rows(plane: &mut Plane, params: &FilterParams) {
    let wr = params.radius;
    let (width, height, nc) = (plane.width, plane.height, plane.channels);
    if width <= 2 * wr || height <= 2 * wr {
        return;
    }
    let a = params.range_coefficient();
    let kernel = params.kernel.as_slice();

    for_each_row(&mut plane.data, width * nc, height, |y, row| {
        if y < wr || y + wr >= height {
            return;
        }
        let src = row.to_vec();
        for x in wr..width - wr {
            let center = &src[x * nc..(x + 1) * nc];
            let mut num = [0.0f32; MAX_CHANNELS];
            let mut denom = 0.0f32;
            for (k, &spatial) in kernel.iter().enumerate() {
                let tap = &src[(x + k - wr) * nc..(x + k - wr + 1) * nc];
                let f = fast_exp(a * squared_distance(tap, center) - spatial);
                for (n, &s) in num.iter_mut().zip(tap) {
                    *n += f * s;
                }
                denom += f;
            }
            if denom == 0.0 {
                denom = 1.0;
            }
            for (out, n) in row[x * nc..(x + 1) * nc].iter_mut().zip(num) {
                *out = n / denom;
            }
        }
    });
}

/// Non-separable bilateral filter over the full square window, in place.
pub fn bilateral_full(plane: &mut Plane, params: &FilterParams) {
    let wr = params.radius;
    let (width, height, nc) = (plane.width, plane.height, plane.channels);
    if params.is_negligible() || width <= 2 * wr || height <= 2 * wr {
        return;
    }
    let a = params.range_coefficient();
    let kernel = params.kernel.as_slice();
    let src = plane.data.clone();
    let row_len = width * nc;

    for_each_row(&mut plane.data, row_len, height, |y, row| {
        if y < wr || y + wr >= height {
            return;
        }
        for x in wr..width - wr {
            let c0 = (y * width + x) * nc;
            let center = &src[c0..c0 + nc];
            let mut num = [0.0f32; MAX_CHANNELS];
            let mut denom = 0.0f32;
            for (ky, &spatial_y) in kernel.iter().enumerate() {
                let tap_row = &src[(y + ky - wr) * row_len..];
                for (kx, &spatial_x) in kernel.iter().enumerate() {
                    let i = (x + kx - wr) * nc;
                    let tap = &tap_row[i..i + nc];
                    let f = fast_exp(a * squared_distance(tap, center) - spatial_y - spatial_x);
                    for (n, &s) in num.iter_mut().zip(tap) {
                        *n += f * s;
                    }
                    denom += f;
                }
            }
            if denom < f32::EPSILON {
                denom = 1.0;
            }
            for (out, n) in row[x * nc..(x + 1) * nc].iter_mut().zip(num) {
                *out = n / denom;
            }
        }
    });
}
