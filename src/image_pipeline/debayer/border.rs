//! Border band fill for pixels the stencil-based stages skip.

use crate::image_pipeline::common::parallel::for_each_row;
use crate::image_pipeline::debayer::types::DenseRaster;
use crate::image_pipeline::raw::types::{CfaPhase, Channel};

/// Width of the band filled here.
pub const BORDER_BAND: usize = 2;

/// Fills every missing channel of the pixels within [`BORDER_BAND`] of an
/// edge with the mean of the same-color measured samples in the 3x3
/// neighborhood clipped to the image. A channel with no measured neighbor
/// keeps its current value.
pub fn fill_border(raster: &mut DenseRaster, phase: CfaPhase) {
    let layout = raster.layout;
    let snapshot = raster.data.clone();
    let (width, height) = (layout.width, layout.height);

    for_each_row(&mut raster.data, layout.row_stride, height, |y, row| {
        let fill = |x: usize, row: &mut [u16]| {
            let measured = phase.color_at(x, y);
            let mut sum = [0u32; 3];
            let mut count = [0u32; 3];
            for ny in y.saturating_sub(1)..(y + 2).min(height) {
                for nx in x.saturating_sub(1)..(x + 2).min(width) {
                    let channel = phase.color_at(nx, ny);
                    sum[channel.index()] += u32::from(snapshot[layout.index(nx, ny, channel)]);
                    count[channel.index()] += 1;
                }
            }
            for channel in Channel::ALL {
                let c = channel.index();
                if channel != measured && count[c] > 0 {
                    row[layout.row_index(x, channel)] = (sum[c] / count[c]) as u16;
                }
            }
        };

        if y < BORDER_BAND || y + BORDER_BAND >= height {
            for x in 0..width {
                fill(x, row);
            }
        } else {
            let right = width.saturating_sub(BORDER_BAND).max(BORDER_BAND);
            for x in (0..width.min(BORDER_BAND)).chain(right..width) {
                fill(x, row);
            }
        }
    });
}
