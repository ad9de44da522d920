//! Green reconstruction at red and blue sites.
//!
//! Both passes read an immutable snapshot of the raster taken before the pass
//! and write only the green sample of color sites, so the result does not
//! depend on how rows are scheduled. Pixels closer than [`GREEN_BORDER`] to an
//! edge are left for the border fill.

use crate::image_pipeline::common::layout::NeighborhoodView;
use crate::image_pipeline::common::math::clamp_u16;
use crate::image_pipeline::common::parallel::for_each_row;
use crate::image_pipeline::debayer::types::DenseRaster;
use crate::image_pipeline::raw::types::{CfaPhase, Channel};

pub const GREEN_BORDER: usize = 2;

/// Direction pairs read by the refinement pass: horizontal, vertical and
/// both diagonals, each at distance 2.
const REFINE_DIRECTIONS: [[(isize, isize); 2]; 4] = [
    [(-2, 0), (2, 0)],
    [(0, -2), (0, 2)],
    [(-2, -2), (2, 2)],
    [(2, -2), (-2, 2)],
];

/// Strong cross-channel correlation: each value within a factor of 4 of the other.
#[inline]
fn correlated(g: i32, c: i32) -> bool {
    g < 4 * c && c < 4 * g
}

/// Runs `kernel` on every interior color site and stores its result as green.
fn for_each_color_site<F>(raster: &mut DenseRaster, phase: CfaPhase, kernel: F)
where
    F: Fn(&NeighborhoodView<'_>, Channel) -> Option<u16> + Sync + Send,
{
    let layout = raster.layout;
    let snapshot = raster.data.clone();
    let (width, height) = (layout.width, layout.height);
    for_each_row(&mut raster.data, layout.row_stride, height, |y, row| {
        if y < GREEN_BORDER || y + GREEN_BORDER >= height {
            return;
        }
        let color = phase.row_color(y);
        // GREEN_BORDER is even, so this keeps the color column parity
        let first = GREEN_BORDER + phase.color_column_parity(y);
        for x in (first..width.saturating_sub(GREEN_BORDER)).step_by(2) {
            let Some(view) = NeighborhoodView::on_raster(&snapshot, &layout, x, y, GREEN_BORDER)
            else {
                continue;
            };
            if let Some(g) = kernel(&view, color) {
                row[layout.row_index(x, Channel::Green)] = g;
            }
        }
    });
}

/// Pass A: directional interpolation with color detail injection.
///
/// The axis with the smaller sum of green gradient and color second
/// difference wins. Exact ties average all four greens.
pub fn interpolate(raster: &mut DenseRaster, phase: CfaPhase) {
    for_each_color_site(raster, phase, |view, color| Some(interpolate_site(view, color)));
}

fn interpolate_site(view: &NeighborhoodView<'_>, color: Channel) -> u16 {
    let green = |dx, dy| view.channel_at(dx, dy, Channel::Green);
    let chroma = |dx, dy| view.channel_at(dx, dy, color);

    let c = chroma(0, 0);
    let (gl, gr, gu, gd) = (green(-1, 0), green(1, 0), green(0, -1), green(0, 1));
    let (cl, cr, cu, cd) = (chroma(-2, 0), chroma(2, 0), chroma(0, -2), chroma(0, 2));

    let horizontal = (gl - gr).abs() + (cl + cr - 2 * c).abs();
    let vertical = (gu - gd).abs() + (cu + cd - 2 * c).abs();

    let g = if horizontal < vertical {
        let g = (gl + gr) / 2;
        if correlated(g, c) { g + (c - (cl + cr) / 2) / 4 } else { g }
    } else if vertical < horizontal {
        let g = (gu + gd) / 2;
        if correlated(g, c) { g + (c - (cu + cd) / 2) / 4 } else { g }
    } else {
        let g = (gl + gr + gu + gd) / 4;
        if correlated(g, c) { g + (c - (cl + cr + cu + cd) / 4) / 8 } else { g }
    };
    clamp_u16(g)
}

/// Pass B: pulls interpolated greens toward the flattest of four directions
/// when there is enough local detail to justify it.
pub fn refine(raster: &mut DenseRaster, phase: CfaPhase) {
    for_each_color_site(raster, phase, refine_site);
}

fn refine_site(view: &NeighborhoodView<'_>, color: Channel) -> Option<u16> {
    let g = view.channel_at(0, 0, Channel::Green);
    let c = view.channel_at(0, 0, color);
    if !correlated(g, c) {
        return None;
    }

    let mut best: Option<(i32, i32, i32)> = None;
    for [(ax, ay), (bx, by)] in REFINE_DIRECTIONS {
        let gm = (view.channel_at(ax, ay, Channel::Green) + view.channel_at(bx, by, Channel::Green)) / 2;
        let cm = (view.channel_at(ax, ay, color) + view.channel_at(bx, by, color)) / 2;
        let gradient = (g - gm).abs() + (c - cm).abs();
        if best.is_none_or(|(min, _, _)| gradient < min) {
            best = Some((gradient, gm, c - cm));
        }
    }

    let (gradient, gm, residual) = best?;
    if gradient > g / 4 {
        Some(clamp_u16((g + gm + residual) / 2))
    } else {
        None
    }
}
