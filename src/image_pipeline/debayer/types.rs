//! Types for debayering operations

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::common::layout::RasterLayout;
use crate::image_pipeline::raw::types::Channel;

/// RGB image data after debayering, interleaved as described by `layout`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseRaster {
    pub layout: RasterLayout,
    /// Samples addressed through [`RasterLayout::index`]
    pub data: Vec<u16>,
}

impl DenseRaster {
    /// Zero-filled raster with room for `layout.height` full rows.
    pub fn new(layout: RasterLayout) -> Result<Self> {
        layout.validate()?;
        let len = layout.full_rows_len().ok_or_else(|| {
            PipelineError::PreconditionViolation(format!(
                "{} rows of stride {} overflow the address space",
                layout.height, layout.row_stride
            ))
        })?;
        Ok(Self { layout, data: vec![0; len] })
    }

    /// Packed `[R, G, B, ...]` raster of zeros.
    pub fn interleaved_rgb(width: usize, height: usize) -> Result<Self> {
        Self::new(RasterLayout::interleaved_rgb(width, height))
    }

    pub fn from_vec(layout: RasterLayout, data: Vec<u16>) -> Result<Self> {
        layout.validate_buffer(data.len())?;
        Ok(Self { layout, data })
    }

    /// Packed raster whose pixel `(x, y)` is `f(x, y)` as `[r, g, b]`.
    pub fn from_fn(
        width: usize,
        height: usize,
        f: impl Fn(usize, usize) -> [u16; 3],
    ) -> Result<Self> {
        let mut raster = Self::interleaved_rgb(width, height)?;
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = f(x, y);
                raster.set(x, y, Channel::Red, r);
                raster.set(x, y, Channel::Green, g);
                raster.set(x, y, Channel::Blue, b);
            }
        }
        Ok(raster)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate_buffer(self.data.len())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.layout.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.layout.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, channel: Channel) -> u16 {
        self.data[self.layout.index(x, y, channel)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, channel: Channel, value: u16) {
        let idx = self.layout.index(x, y, channel);
        self.data[idx] = value;
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u16; 3] {
        Channel::ALL.map(|c| self.get(x, y, c))
    }
}
