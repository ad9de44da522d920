//! RAW mosaic data types

use std::fmt;

use crate::image_pipeline::common::error::{Result, PipelineError, ensure};

/// Color channel of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => f.write_str("R"),
            Self::Green => f.write_str("G"),
            Self::Blue => f.write_str("B"),
        }
    }
}

/// Phase of a 2x2 Bayer pattern.
///
/// A green sample sits at column `gx`, row `gy`. On rows with the parity of
/// `gy` the red/blue samples occupy the other column parity, on the remaining
/// rows they share the parity of `gx`. Rows with the parity of `ry` carry red,
/// the others blue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CfaPhase {
    pub gx: usize,
    pub gy: usize,
    pub ry: usize,
}

impl CfaPhase {
    pub fn new(gx: usize, gy: usize, ry: usize) -> Result<Self> {
        let phase = Self { gx, gy, ry };
        phase.validate()?;
        Ok(phase)
    }

    /// ```text
    /// R G
    /// G B
    /// ```
    pub fn rggb() -> Self {
        Self { gx: 1, gy: 0, ry: 0 }
    }

    /// ```text
    /// B G
    /// G R
    /// ```
    pub fn bggr() -> Self {
        Self { gx: 1, gy: 0, ry: 1 }
    }

    /// ```text
    /// G R
    /// B G
    /// ```
    pub fn grbg() -> Self {
        Self { gx: 0, gy: 0, ry: 0 }
    }

    /// ```text
    /// G B
    /// R G
    /// ```
    pub fn gbrg() -> Self {
        Self { gx: 0, gy: 0, ry: 1 }
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.gx < 2 && self.gy < 2 && self.ry < 2, || {
            format!("CFA phase out of range: gx={}, gy={}, ry={}", self.gx, self.gy, self.ry)
        })
    }

    /// Column parity of the red/blue samples on row `y`.
    #[inline]
    pub fn color_column_parity(&self, y: usize) -> usize {
        if (y & 1) == (self.gy & 1) {
            (self.gx + 1) & 1
        } else {
            self.gx & 1
        }
    }

    /// Whether `(x, y)` measured red or blue.
    #[inline]
    pub fn is_color_site(&self, x: usize, y: usize) -> bool {
        (x & 1) == self.color_column_parity(y)
    }

    /// The non-green channel measured on row `y`.
    #[inline]
    pub fn row_color(&self, y: usize) -> Channel {
        if (y & 1) == (self.ry & 1) {
            Channel::Red
        } else {
            Channel::Blue
        }
    }

    #[inline]
    pub fn color_at(&self, x: usize, y: usize) -> Channel {
        if self.is_color_site(x, y) {
            self.row_color(y)
        } else {
            Channel::Green
        }
    }

    /// A site `(x, y)` within the first 2x2 tile where `channel` is measured.
    pub fn origin(&self, channel: Channel) -> (usize, usize) {
        match channel {
            Channel::Green => (self.gx & 1, self.gy & 1),
            Channel::Red => {
                let y = self.ry & 1;
                (self.color_column_parity(y), y)
            }
            Channel::Blue => {
                let y = (self.ry + 1) & 1;
                (self.color_column_parity(y), y)
            }
        }
    }
}

impl fmt::Display for CfaPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.color_at(0, 0),
            self.color_at(1, 0),
            self.color_at(0, 1),
            self.color_at(1, 1)
        )
    }
}

/// Single-channel sensor reading, one `u16` per photosite.
///
/// Sample `(x, y)` lives at `offset + y * row_stride + x`.
#[derive(Debug, Clone)]
pub struct RawMosaic {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Distance in samples between the starts of two rows
    pub row_stride: usize,
    /// Index of sample (0, 0) in `data`
    pub offset: usize,
    /// Raw pixel data (single channel Bayer pattern)
    pub data: Vec<u16>,
}

impl RawMosaic {
    /// Tightly packed mosaic.
    pub fn new(width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        Self::with_layout(width, height, width, 0, data)
    }

    pub fn with_layout(
        width: usize,
        height: usize,
        row_stride: usize,
        offset: usize,
        data: Vec<u16>,
    ) -> Result<Self> {
        let mosaic = Self { width, height, row_stride, offset, data };
        mosaic.validate()?;
        Ok(mosaic)
    }

    /// Tightly packed mosaic whose sample `(x, y)` is `f(x, y)`.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u16) -> Result<Self> {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, data)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidDimensions(self.width, self.height));
        }
        ensure(self.row_stride >= self.width, || {
            format!("mosaic row stride {} is smaller than width {}", self.row_stride, self.width)
        })?;
        let required = (self.height - 1)
            .checked_mul(self.row_stride)
            .and_then(|rows| rows.checked_add(self.offset))
            .and_then(|start| start.checked_add(self.width))
            .ok_or_else(|| {
                PipelineError::PreconditionViolation(format!(
                    "mosaic of {} rows with stride {} and offset {} overflows the address space",
                    self.height, self.row_stride, self.offset
                ))
            })?;
        ensure(self.data.len() >= required, || {
            format!("mosaic buffer holds {} samples, layout needs {}", self.data.len(), required)
        })
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        self.offset + y * self.row_stride + x
    }

    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u16 {
        self.data[self.index(x, y)]
    }
}
