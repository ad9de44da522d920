//! Hot pixel rejection on the raw mosaic.
//!
//! A sample is kept when it is less than twice any of its four primary
//! neighbors or less than four times any of its secondary neighbors. Otherwise
//! it is replaced by the integer mean of the primaries.

use crate::image_pipeline::common::layout::NeighborhoodView;
use crate::image_pipeline::raw::types::{CfaPhase, RawMosaic};

/// Samples closer than this to an edge are never filtered.
pub const HOT_PIXEL_BORDER: usize = 2;

const COLOR_PRIMARY: [(isize, isize); 4] = [(-2, 0), (2, 0), (0, -2), (0, 2)];
const COLOR_SECONDARY: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const GREEN_PRIMARY: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];
const GREEN_SECONDARY: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

#[derive(Debug, Clone, Copy)]
pub struct HotPixelFilter {
    phase: CfaPhase,
}

impl HotPixelFilter {
    pub fn new(phase: CfaPhase) -> Self {
        Self { phase }
    }

    /// Filtered value of the sample at `(x, y)`.
    pub fn apply(&self, mosaic: &RawMosaic, x: usize, y: usize) -> u16 {
        let Some(view) = NeighborhoodView::on_mosaic(mosaic, x, y, HOT_PIXEL_BORDER) else {
            return mosaic.sample(x, y);
        };
        if self.phase.is_color_site(x, y) {
            filter_color(&view)
        } else {
            filter_green(&view)
        }
    }
}

/// Red or blue site: same-color axis neighbors at distance 2 and the full
/// 3x3 ring.
pub fn filter_color(view: &NeighborhoodView<'_>) -> u16 {
    reject(view, &COLOR_PRIMARY, &COLOR_SECONDARY)
}

/// Green site: diagonal greens at distance 1 and the four adjacent samples.
pub fn filter_green(view: &NeighborhoodView<'_>) -> u16 {
    reject(view, &GREEN_PRIMARY, &GREEN_SECONDARY)
}

#[inline]
fn reject(
    view: &NeighborhoodView<'_>,
    primary: &[(isize, isize); 4],
    secondary: &[(isize, isize)],
) -> u16 {
    let v = view.at(0, 0);
    let primaries = primary.map(|(dx, dy)| view.at(dx, dy));
    let normal = primaries.iter().any(|&p| v < 2 * p)
        || secondary.iter().any(|&(dx, dy)| v < 4 * view.at(dx, dy));
    if normal {
        v as u16
    } else {
        // mean of four u16 values fits in u16
        (primaries.iter().sum::<i32>() / 4) as u16
    }
}
