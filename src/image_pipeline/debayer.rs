//! Debayering module for converting Bayer pattern RAW images to RGB

pub mod border;
pub mod chroma;
pub mod cpu_debayer;
pub mod green;
pub mod hot_pixel;
pub mod separate;
pub mod types;


pub use cpu_debayer::CpuDebayer;
pub use hot_pixel::HotPixelFilter;
pub use types::DenseRaster;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::types::{CfaPhase, RawMosaic};

/// Reconstructs a packed RGB raster from `mosaic` with hot pixel rejection on.
pub fn demosaic(mosaic: &RawMosaic, phase: CfaPhase) -> Result<DenseRaster> {
    CpuDebayer::new(phase)?.process(mosaic)
}
