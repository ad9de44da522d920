//! Non-local means filtering of YST planes.
//!
//! [`nlm_box_sum`] visits every unordered pixel pair once per search offset
//! and gets patch distances from box sums, so its cost does not depend on the
//! patch size. [`nlm_separable`] is the cheaper row-then-column approximation
//! with one-dimensional patches.

use rayon::prelude::*;

use crate::image_pipeline::common::math::fast_exp;
use crate::image_pipeline::common::parallel::for_each_row;
use crate::image_pipeline::denoise::bilateral::squared_distance;
use crate::image_pipeline::denoise::box_sum::box_sum;
use crate::image_pipeline::denoise::types::{FilterParams, MAX_CHANNELS, Plane};

/// Offsets `(dx, dy)` of the upper half of the search disk of radius
/// `radius`. Each unordered pair of pixels is reached by exactly one of them.
pub fn search_offsets(radius: usize) -> Vec<(isize, usize)> {
    let r = radius as isize;
    let mut offsets = Vec::new();
    for dy in 0..=r {
        for dx in -r..=r {
            if (dy > 0 || dx > 0) && dx * dx + dy * dy <= r * r {
                offsets.push((dx, dy as usize));
            }
        }
    }
    offsets
}

#[inline]
fn clamp_coord(v: isize, len: usize) -> usize {
    v.clamp(0, len as isize - 1) as usize
}

/// Symmetric-pair non-local means, in place.
///
/// The pixel itself is never paired, so it enters the average with the
/// largest weight any of its pairs received, or 1 when none contributed.
pub fn nlm_box_sum(plane: &mut Plane, params: &FilterParams) {
    let (sr, pr) = (params.radius, params.patch_radius);
    if params.is_negligible() || sr < 1 || plane.data.is_empty() {
        return;
    }
    let (width, height, nc) = (plane.width, plane.height, plane.channels);
    let a = params.range_coefficient();
    let inv_patch_area = 1.0 / ((2 * pr + 1) * (2 * pr + 1)) as f32;
    let kernel = &params.kernel;
    let src = &plane.data;

    let mut acc = vec![0.0f32; width * height * nc];
    let mut weight_sum = vec![0.0f32; width * height];
    let mut weight_max = vec![0.0f32; width * height];

    // squared differences over the plane grown by the patch radius on every
    // side, with edge samples replicated
    let (padded_w, padded_h) = (width + 2 * pr, height + 2 * pr);
    let mut diff = Plane::mono(padded_w, padded_h);

    for (dx, dy) in search_offsets(sr) {
        diff.data.par_chunks_mut(padded_w).enumerate().for_each(|(py, row)| {
            let y = clamp_coord(py as isize - pr as isize, height);
            let qy = clamp_coord((y + dy) as isize, height);
            for (px, out) in row.iter_mut().enumerate() {
                let x = clamp_coord(px as isize - pr as isize, width);
                let qx = clamp_coord(x as isize + dx, width);
                let p = (y * width + x) * nc;
                let q = (qy * width + qx) * nc;
                *out = squared_distance(&src[p..p + nc], &src[q..q + nc]);
            }
        });

        let ssd = box_sum(&diff, pr);
        let spatial = fast_exp(-kernel[sr + dy] - kernel[(sr as isize + dx) as usize]);
        let weights: Vec<f32> = ssd
            .data
            .par_iter()
            .map(|&d| spatial * fast_exp(d * inv_patch_area * a))
            .collect();

        // row y receives from its forward partner (x + dx, y + dy) and from
        // its backward partner (x - dx, y - dy), which owns the pair weight
        acc.par_chunks_mut(width * nc)
            .zip(weight_sum.par_chunks_mut(width))
            .zip(weight_max.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, ((acc_row, sum_row), max_row))| {
                let x_lo = (-dx).max(0) as usize;
                let x_hi = (width as isize - dx.max(0)).max(0) as usize;
                if y + dy < height {
                    for x in x_lo..x_hi {
                        let f = weights[y * width + x];
                        let q = ((y + dy) * width + (x as isize + dx) as usize) * nc;
                        accumulate(&mut acc_row[x * nc..(x + 1) * nc], &src[q..q + nc], f);
                        sum_row[x] += f;
                        max_row[x] = max_row[x].max(f);
                    }
                }
                if y >= dy {
                    let py = y - dy;
                    for px in x_lo..x_hi {
                        let x = (px as isize + dx) as usize;
                        let f = weights[py * width + px];
                        let p = (py * width + px) * nc;
                        accumulate(&mut acc_row[x * nc..(x + 1) * nc], &src[p..p + nc], f);
                        sum_row[x] += f;
                        max_row[x] = max_row[x].max(f);
                    }
                }
            });
    }

    let row_len = width * nc;
    for_each_row(&mut plane.data, row_len, height, |y, row| {
        for x in 0..width {
            let i = y * width + x;
            let self_weight = if weight_max[i] == 0.0 { 1.0 } else { weight_max[i] };
            let denom = weight_sum[i] + self_weight;
            for c in 0..nc {
                let s = x * nc + c;
                row[s] = (acc[y * row_len + s] + self_weight * row[s]) / denom;
            }
        }
    });
}

#[inline]
fn accumulate(acc: &mut [f32], partner: &[f32], f: f32) {
    for (a, &u) in acc.iter_mut().zip(partner) {
        *a += f * u;
    }
}

/// Separable non-local means, in place. Pixels closer than twice the window
/// radius to an edge keep their value.
pub fn nlm_separable(plane: &mut Plane, params: &FilterParams) {
    if params.is_negligible() || params.radius < 1 || plane.data.is_empty() {
        return;
    }
    filter_rows(plane, params);
    let mut columns = plane.transposed();
    filter_rows(&mut columns, params);
    *plane = columns.transposed();
}

fn filter_rows(plane: &mut Plane, params: &FilterParams) {
    let wr = params.radius;
    let margin = 2 * wr;
    let (width, height, nc) = (plane.width, plane.height, plane.channels);
    if width <= 2 * margin || height <= 2 * margin {
        return;
    }
    let a = params.range_coefficient();
    let kernel = params.kernel.as_slice();
    let inv_patch_len = 1.0 / (2 * wr + 1) as f32;

    for_each_row(&mut plane.data, width * nc, height, |y, row| {
        if y < margin || y + margin >= height {
            return;
        }
        let src = row.to_vec();
        let px = |x: usize| &src[x * nc..(x + 1) * nc];
        for x in margin..width - margin {
            let mut num = [0.0f32; MAX_CHANNELS];
            let mut denom = 0.0f32;
            for (k, &spatial) in kernel.iter().enumerate() {
                let idx = x + k - wr;
                let d_sq: f32 = (0..=2 * wr)
                    .map(|i| squared_distance(px(idx + i - wr), px(x + i - wr)))
                    .sum::<f32>()
                    * inv_patch_len;
                let f = fast_exp(a * d_sq - spatial);
                for (n, &s) in num.iter_mut().zip(px(idx)) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::denoise::types::HalfKernel;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noisy_plane(width: usize, height: usize, seed: u64) -> Plane {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..width * height)
            .map(|_| 0.5 + rng.random_range(-0.05f32..0.05))
            .collect();
        Plane::from_vec(width, height, 1, data).unwrap()
    }

    fn variance(plane: &Plane) -> f32 {
        let n = plane.data.len() as f32;
        let mean = plane.data.iter().sum::<f32>() / n;
        plane.data.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n
    }

    /// Direct evaluation of the pair weights without box sums.
    fn reference(plane: &Plane, params: &FilterParams) -> Vec<f32> {
        let (w, h) = (plane.width, plane.height);
        let (sr, pr) = (params.radius as isize, params.patch_radius as isize);
        let a = params.range_coefficient();
        let area = ((2 * pr + 1) * (2 * pr + 1)) as f32;
        let u = |x: isize, y: isize| plane.get(clamp_coord(x, w), clamp_coord(y, h), 0);
        let pair_weight = |x: isize, y: isize, dx: isize, dy: isize| {
            let mut ssd = 0.0;
            for j in -pr..=pr {
                for i in -pr..=pr {
                    let (cx, cy) = (clamp_coord(x + i, w) as isize, clamp_coord(y + j, h) as isize);
                    let d = u(cx, cy) - u(cx + dx, cy + dy);
                    ssd += d * d;
                }
            }
            let spatial = fast_exp(-params.kernel[(sr + dy) as usize] - params.kernel[(sr + dx) as usize]);
            spatial * fast_exp(ssd / area * a)
        };
        let inside = |x: isize, y: isize| x >= 0 && y >= 0 && x < w as isize && y < h as isize;

        let mut out = Vec::with_capacity(w * h);
        for y in 0..h as isize {
            for x in 0..w as isize {
                let (mut acc, mut sum, mut max) = (0.0f32, 0.0f32, 0.0f32);
                for (dx, dy) in search_offsets(params.radius) {
                    let dy = dy as isize;
                    if inside(x + dx, y + dy) {
                        let f = pair_weight(x, y, dx, dy);
                        acc += f * u(x + dx, y + dy);
                        sum += f;
                        max = max.max(f);
                    }
                    if inside(x - dx, y - dy) {
                        let f = pair_weight(x - dx, y - dy, dx, dy);
                        acc += f * u(x - dx, y - dy);
                        sum += f;
                        max = max.max(f);
                    }
                }
                let m = if max == 0.0 { 1.0 } else { max };
                out.push((acc + m * u(x, y)) / (sum + m));
            }
        }
        out
    }

    #[test]
    fn search_offsets_cover_half_disk() {
        assert_eq!(search_offsets(1), vec![(1, 0), (0, 1)]);
        let offsets = search_offsets(2);
        assert_eq!(offsets.len(), 6);
        assert!(offsets.contains(&(-1, 1)));
        assert!(!offsets.contains(&(-2, 2)));
        // 49 lattice points in the radius 4 disk, minus the center, halved
        assert_eq!(search_offsets(4).len(), 24);
    }

    #[test]
    fn box_sum_variant_matches_direct_evaluation() {
        let plane = noisy_plane(11, 9, 5);
        let params = FilterParams::gaussian(2, 1, 0.05, 1.5).unwrap();
        let expected = reference(&plane, &params);
        let mut filtered = plane.clone();
        nlm_box_sum(&mut filtered, &params);
        for (i, (a, b)) in filtered.data.iter().zip(&expected).enumerate() {
            assert!((a - b).abs() < 1.0e-4, "sample {i}: {a} vs {b}");
        }
    }

    #[test]
    fn constant_plane_is_unchanged() {
        let mut plane = Plane::from_vec(8, 8, 1, vec![0.25; 64]).unwrap();
        nlm_box_sum(&mut plane, &FilterParams::gaussian(2, 1, 0.1, 1.0).unwrap());
        assert!(plane.data.iter().all(|v| (v - 0.25).abs() < 1.0e-6));

        let mut plane = Plane::from_vec(12, 12, 1, vec![0.25; 144]).unwrap();
        nlm_separable(&mut plane, &FilterParams::gaussian(2, 0, 0.1, 1.0).unwrap());
        assert!(plane.data.iter().all(|v| (v - 0.25).abs() < 1.0e-6));
    }

    #[test]
    fn disabled_filter_is_a_no_op() {
        let plane = noisy_plane(10, 10, 1);
        let mut filtered = plane.clone();
        nlm_box_sum(&mut filtered, &FilterParams::gaussian(2, 1, 0.0, 1.0).unwrap());
        assert_eq!(filtered, plane);

        let zero_radius = FilterParams::new(0, 1, 0.1, HalfKernel::flat(0)).unwrap();
        nlm_box_sum(&mut filtered, &zero_radius);
        nlm_separable(&mut filtered, &zero_radius);
        assert_eq!(filtered, plane);
    }

    #[test]
    fn noise_variance_drops() {
        let plane = noisy_plane(24, 24, 9);
        let params = FilterParams::gaussian(3, 1, 0.1, 2.0).unwrap();

        let mut boxed = plane.clone();
        nlm_box_sum(&mut boxed, &params);
        assert!(variance(&boxed) < 0.5 * variance(&plane));

        let mut separable = plane.clone();
        nlm_separable(&mut separable, &FilterParams::gaussian(1, 0, 0.1, 2.0).unwrap());
        assert!(variance(&separable) < variance(&plane));
    }

    #[test]
    fn joint_planes_stay_consistent() {
        let s = noisy_plane(10, 10, 2);
        let t = s.clone();
        let mut st = Plane::stack(&[&s, &t]);
        nlm_box_sum(&mut st, &FilterParams::gaussian(2, 1, 0.1, 1.0).unwrap());
        let planes = st.split();
        assert_eq!(planes[0], planes[1]);
    }
}
