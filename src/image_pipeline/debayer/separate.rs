//! Scatter of mosaic samples into their channel of the dense raster.

use crate::image_pipeline::common::parallel::for_each_row;
use crate::image_pipeline::debayer::hot_pixel::HotPixelFilter;
use crate::image_pipeline::debayer::types::DenseRaster;
use crate::image_pipeline::raw::types::{CfaPhase, Channel, RawMosaic};

/// Writes every measured sample into its channel and zeroes the two missing
/// channels. With `remove_hot_pixels` each sample first goes through the
/// [`HotPixelFilter`].
pub fn separate(mosaic: &RawMosaic, phase: CfaPhase, remove_hot_pixels: bool, out: &mut DenseRaster) {
    let layout = out.layout;
    let filter = HotPixelFilter::new(phase);
    for_each_row(&mut out.data, layout.row_stride, layout.height, |y, row| {
        for x in 0..layout.width {
            let measured = phase.color_at(x, y);
            let value = if remove_hot_pixels {
                filter.apply(mosaic, x, y)
            } else {
                mosaic.sample(x, y)
            };
            for channel in Channel::ALL {
                row[layout.row_index(x, channel)] = if channel == measured { value } else { 0 };
            }
        }
    });
}
