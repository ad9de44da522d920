//! Buffer addressing for interleaved rasters and bounds-aware stencil views.

use crate::image_pipeline::common::error::{Result, PipelineError, ensure};
use crate::image_pipeline::raw::types::{Channel, RawMosaic};

/// Geometry of an interleaved 3-channel raster.
///
/// Sample `(x, y, c)` lives at `y * row_stride + x * pixel_stride + offsets[c]`.
/// Strides are counted in elements, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    pub width: usize,
    pub height: usize,
    pub pixel_stride: usize,
    pub row_stride: usize,
    /// Position of the red, green and blue sample inside a pixel.
    pub offsets: [usize; 3],
}

impl RasterLayout {
    /// Packed `[R, G, B, R, G, B, ...]` rows with no padding.
    pub fn interleaved_rgb(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixel_stride: 3,
            row_stride: 3 * width,
            offsets: [0, 1, 2],
        }
    }

    pub fn with_row_stride(mut self, row_stride: usize) -> Self {
        self.row_stride = row_stride;
        self
    }

    pub fn with_pixel_stride(mut self, pixel_stride: usize) -> Self {
        self.pixel_stride = pixel_stride;
        self.row_stride = self.row_stride.max(pixel_stride.saturating_mul(self.width));
        self
    }

    pub fn with_offsets(mut self, offsets: [usize; 3]) -> Self {
        self.offsets = offsets;
        self
    }

    /// Smallest buffer length that holds every addressed sample, `None` when
    /// it does not fit in `usize`.
    pub fn required_len(&self) -> Option<usize> {
        if self.width == 0 || self.height == 0 {
            return Some(0);
        }
        let max_offset = self.offsets.iter().copied().max().unwrap_or(0);
        (self.height - 1)
            .checked_mul(self.row_stride)?
            .checked_add((self.width - 1).checked_mul(self.pixel_stride)?)?
            .checked_add(max_offset)?
            .checked_add(1)
    }

    /// Length of `height` full rows, `None` when it does not fit in `usize`.
    pub fn full_rows_len(&self) -> Option<usize> {
        self.height.checked_mul(self.row_stride)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidDimensions(self.width, self.height));
        }
        let [r, g, b] = self.offsets;
        ensure(r != g && g != b && r != b, || {
            format!("channel offsets must be distinct, got {:?}", self.offsets)
        })?;
        ensure(self.offsets.iter().all(|&o| o < self.pixel_stride), || {
            format!(
                "channel offsets {:?} do not fit in pixel stride {}",
                self.offsets, self.pixel_stride
            )
        })?;
        let row_len = self.width.checked_mul(self.pixel_stride);
        ensure(row_len.is_some_and(|len| self.row_stride >= len), || {
            format!(
                "row stride {} is smaller than width {} x pixel stride {}",
                self.row_stride, self.width, self.pixel_stride
            )
        })?;
        ensure(self.full_rows_len().is_some(), || {
            format!(
                "{} rows of stride {} overflow the address space",
                self.height, self.row_stride
            )
        })
    }

    /// Validates the layout against a buffer of `len` elements.
    pub fn validate_buffer(&self, len: usize) -> Result<()> {
        self.validate()?;
        let required = self.required_len().ok_or_else(|| {
            PipelineError::PreconditionViolation(format!(
                "layout {}x{} with row stride {} overflows the address space",
                self.width, self.height, self.row_stride
            ))
        })?;
        ensure(len >= required, || {
            format!("raster buffer holds {len} samples, layout needs {required}")
        })
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, channel: Channel) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) outside {}x{}", self.width, self.height);
        y * self.row_stride + self.row_index(x, channel)
    }

    /// Index of `(x, channel)` relative to the start of its row.
    #[inline]
    pub fn row_index(&self, x: usize, channel: Channel) -> usize {
        x * self.pixel_stride + self.offsets[channel.index()]
    }
}

/// Read-only window of radius `radius` around one pixel.
///
/// Construction fails when any part of the square window falls outside the
/// image, so kernels reading relative offsets can never leave the buffer.
#[derive(Debug, Clone, Copy)]
pub struct NeighborhoodView<'a> {
    data: &'a [u16],
    center: usize,
    pixel_stride: usize,
    row_stride: usize,
    offsets: [usize; 3],
    radius: usize,
}

impl<'a> NeighborhoodView<'a> {
    /// Window on a single-channel mosaic. Channel arguments are ignored.
    pub fn on_mosaic(mosaic: &'a RawMosaic, x: usize, y: usize, radius: usize) -> Option<Self> {
        if !Self::fits(x, y, mosaic.width, mosaic.height, radius) {
            return None;
        }
        Some(Self {
            data: &mosaic.data,
            center: mosaic.index(x, y),
            pixel_stride: 1,
            row_stride: mosaic.row_stride,
            offsets: [0; 3],
            radius,
        })
    }

    /// Window on an interleaved raster buffer described by `layout`.
    pub fn on_raster(
        data: &'a [u16],
        layout: &RasterLayout,
        x: usize,
        y: usize,
        radius: usize,
    ) -> Option<Self> {
        if !Self::fits(x, y, layout.width, layout.height, radius) {
            return None;
        }
        Some(Self {
            data,
            center: y * layout.row_stride + x * layout.pixel_stride,
            pixel_stride: layout.pixel_stride,
            row_stride: layout.row_stride,
            offsets: layout.offsets,
            radius,
        })
    }

    #[inline]
    fn fits(x: usize, y: usize, width: usize, height: usize, radius: usize) -> bool {
        x >= radius && y >= radius && x + radius < width && y + radius < height
    }

    #[inline]
    fn position(&self, dx: isize, dy: isize) -> usize {
        debug_assert!(
            dx.unsigned_abs() <= self.radius && dy.unsigned_abs() <= self.radius,
            "offset ({dx}, {dy}) outside radius {}",
            self.radius
        );
        let delta = dy * self.row_stride as isize + dx * self.pixel_stride as isize;
        self.center.wrapping_add_signed(delta)
    }

    /// Mosaic sample at `(dx, dy)` from the center.
    #[inline]
    pub fn at(&self, dx: isize, dy: isize) -> i32 {
        i32::from(self.data[self.position(dx, dy)])
    }

    /// Raster sample of `channel` at `(dx, dy)` from the center.
    #[inline]
    pub fn channel_at(&self, dx: isize, dy: isize, channel: Channel) -> i32 {
        i32::from(self.data[self.position(dx, dy) + self.offsets[channel.index()]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_index() {
        let layout = RasterLayout::interleaved_rgb(4, 3);
        assert_eq!(layout.index(0, 0, Channel::Red), 0);
        assert_eq!(layout.index(1, 0, Channel::Blue), 5);
        assert_eq!(layout.index(2, 1, Channel::Green), 12 + 6 + 1);
        assert_eq!(layout.required_len(), Some(36));
    }

    #[test]
    fn padded_layout_required_len() {
        let layout = RasterLayout::interleaved_rgb(4, 3)
            .with_pixel_stride(4)
            .with_row_stride(20)
            .with_offsets([2, 1, 0]);
        assert!(layout.validate().is_ok());
        // last pixel: 2 * 20 + 3 * 4 + 2
        assert_eq!(layout.required_len(), Some(55));
        assert_eq!(layout.index(3, 2, Channel::Red), 54);
    }

    #[test]
    fn rejects_bad_layouts() {
        let base = RasterLayout::interleaved_rgb(4, 3);
        assert!(matches!(
            RasterLayout::interleaved_rgb(0, 3).validate(),
            Err(PipelineError::InvalidDimensions(0, 3))
        ));
        assert!(base.with_offsets([0, 0, 2]).validate().is_err());
        assert!(base.with_offsets([0, 1, 3]).validate().is_err());
        assert!(base.with_row_stride(11).validate().is_err());
        assert!(base.validate_buffer(35).is_err());
        assert!(base.validate_buffer(36).is_ok());
    }

    #[test]
    fn huge_strides_are_rejected_without_overflow() {
        let base = RasterLayout::interleaved_rgb(4, 3);
        let huge_rows = base.with_row_stride(usize::MAX / 2);
        assert_eq!(huge_rows.required_len(), None);
        assert!(matches!(huge_rows.validate(), Err(PipelineError::PreconditionViolation(_))));
        assert!(matches!(
            huge_rows.validate_buffer(36),
            Err(PipelineError::PreconditionViolation(_))
        ));

        let huge_pixels = base.with_pixel_stride(usize::MAX / 2);
        assert!(matches!(huge_pixels.validate(), Err(PipelineError::PreconditionViolation(_))));
    }

    #[test]
    fn neighborhood_refuses_border_pixels() {
        let mosaic = RawMosaic::new(5, 5, (0..25).collect()).unwrap();
        assert!(NeighborhoodView::on_mosaic(&mosaic, 1, 2, 2).is_none());
        assert!(NeighborhoodView::on_mosaic(&mosaic, 2, 3, 2).is_none());
        let view = NeighborhoodView::on_mosaic(&mosaic, 2, 2, 2).unwrap();
        assert_eq!(view.at(0, 0), 12);
        assert_eq!(view.at(-2, -2), 0);
        assert_eq!(view.at(2, 2), 24);
        assert_eq!(view.at(1, -1), 8);
    }

    #[test]
    fn neighborhood_on_padded_mosaic() {
        let mut data = vec![9u16; 2 + 4 * 8];
        data[2 + 8 + 1] = 42;
        let mosaic = RawMosaic::with_layout(4, 4, 8, 2, data).unwrap();
        let view = NeighborhoodView::on_mosaic(&mosaic, 2, 2, 1).unwrap();
        assert_eq!(view.at(-1, -1), 42);
    }

    #[test]
    fn neighborhood_channel_access() {
        let layout = RasterLayout::interleaved_rgb(3, 3);
        let data: Vec<u16> = (0..27).collect();
        let view = NeighborhoodView::on_raster(&data, &layout, 1, 1, 1).unwrap();
        assert_eq!(view.channel_at(0, 0, Channel::Red), 12);
        assert_eq!(view.channel_at(0, 0, Channel::Blue), 14);
        assert_eq!(view.channel_at(-1, -1, Channel::Green), 1);
        assert_eq!(view.channel_at(1, 1, Channel::Blue), 26);
    }
}
