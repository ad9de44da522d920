//! Red and blue reconstruction from color-minus-green differences.

use crate::image_pipeline::common::layout::NeighborhoodView;
use crate::image_pipeline::common::math::clamp_u16;
use crate::image_pipeline::common::parallel::for_each_row;
use crate::image_pipeline::debayer::types::DenseRaster;
use crate::image_pipeline::raw::types::{CfaPhase, Channel};

pub const CHROMA_BORDER: usize = 1;

const DIAGONALS: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];
const HORIZONTAL: [(isize, isize); 2] = [(-1, 0), (1, 0)];
const VERTICAL: [(isize, isize); 2] = [(0, -1), (0, 1)];

/// Fills red and blue wherever they were not measured, one pixel in from
/// every edge. Requires a complete green channel.
///
/// Every read is a measured color sample or a green, and writes only touch
/// unmeasured samples, so both channels share one snapshot.
pub fn fill_chroma(raster: &mut DenseRaster, phase: CfaPhase) {
    let layout = raster.layout;
    let snapshot = raster.data.clone();
    let (width, height) = (layout.width, layout.height);
    let origins = [Channel::Red, Channel::Blue].map(|c| (c, phase.origin(c)));

    for_each_row(&mut raster.data, layout.row_stride, height, |y, row| {
        if y < CHROMA_BORDER || y + CHROMA_BORDER >= height {
            return;
        }
        for x in CHROMA_BORDER..width.saturating_sub(CHROMA_BORDER) {
            let Some(view) = NeighborhoodView::on_raster(&snapshot, &layout, x, y, CHROMA_BORDER)
            else {
                continue;
            };
            for &(channel, (cx, cy)) in &origins {
                let same_column = (x & 1) == cx;
                let same_row = (y & 1) == cy;
                let neighbors: &[(isize, isize)] = match (same_column, same_row) {
                    (true, true) => continue,
                    (false, false) => &DIAGONALS,
                    (true, false) => &VERTICAL,
                    (false, true) => &HORIZONTAL,
                };
                row[layout.row_index(x, channel)] = estimate(&view, channel, neighbors);
            }
        }
    });
}

/// `g - mean(g - c)` over the measured neighbors of `channel`.
#[inline]
fn estimate(view: &NeighborhoodView<'_>, channel: Channel, neighbors: &[(isize, isize)]) -> u16 {
    let g = view.channel_at(0, 0, Channel::Green);
    let diff: i32 = neighbors
        .iter()
        .map(|&(dx, dy)| view.channel_at(dx, dy, Channel::Green) - view.channel_at(dx, dy, channel))
        .sum();
    clamp_u16(g - diff / neighbors.len() as i32)
}
