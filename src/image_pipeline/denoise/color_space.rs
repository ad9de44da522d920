//! RGB to YST conversion and back.

use rayon::prelude::*;

use crate::image_pipeline::common::math::{U16_MAX_F, clamp_u16_f32};
use crate::image_pipeline::common::parallel::for_each_row;
use crate::image_pipeline::debayer::types::DenseRaster;
use crate::image_pipeline::denoise::types::{ColorMatrix, PlanarYst};
use crate::image_pipeline::raw::types::Channel;

/// Offset added to both chroma planes so neutral gray sits at 0.5.
pub const CHROMA_OFFSET: f32 = 0.5;

#[inline]
fn apply(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    m.map(|row| row[0] * v[0] + row[1] * v[1] + row[2] * v[2])
}

/// Normalizes `raster` to [0, 1] and maps it through the forward matrix.
pub fn to_planar_yst(raster: &DenseRaster, matrix: &ColorMatrix) -> PlanarYst {
    let layout = raster.layout;
    let (width, height) = (layout.width, layout.height);
    let mut yst = PlanarYst::new(width, height);
    let norm = 1.0 / U16_MAX_F;

    yst.y.data
        .par_chunks_mut(width)
        .zip(yst.s.data.par_chunks_mut(width))
        .zip(yst.t.data.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, ((y_row, s_row), t_row))| {
            let row = &raster.data[y * layout.row_stride..];
            for x in 0..width {
                let rgb = Channel::ALL.map(|c| f32::from(row[layout.row_index(x, c)]) * norm);
                let [l, s, t] = apply(&matrix.forward, rgb);
                y_row[x] = l;
                s_row[x] = s + CHROMA_OFFSET;
                t_row[x] = t + CHROMA_OFFSET;
            }
        });
    yst
}

/// Maps `yst` back through the inverse matrix into the pixels of `out`,
/// rounding to the nearest 16-bit value.
pub fn to_dense_rgb(yst: &PlanarYst, matrix: &ColorMatrix, out: &mut DenseRaster) {
    let layout = out.layout;
    debug_assert!(yst.width() == layout.width && yst.height() == layout.height);
    let width = layout.width;

    for_each_row(&mut out.data, layout.row_stride, layout.height, |y, row| {
        let base = y * width;
        for x in 0..width {
            let i = base + x;
            let v = [yst.y.data[i], yst.s.data[i] - CHROMA_OFFSET, yst.t.data[i] - CHROMA_OFFSET];
            let rgb = apply(&matrix.inverse, v);
            for c in Channel::ALL {
                row[layout.row_index(x, c)] = clamp_u16_f32(rgb[c.index()] * U16_MAX_F + 0.5);
            }
        }
    });
}
