use tracing::{debug, info};

use crate::image_pipeline::common::error::{Result, ensure};
use crate::image_pipeline::debayer::{border, chroma, green, separate, types::DenseRaster};
use crate::image_pipeline::raw::types::{CfaPhase, RawMosaic};

/// Edge-directed demosaicing on the rayon pool.
///
/// Stages run in order: hot pixel rejection and channel separation, green
/// interpolation, border band fill, green refinement, chroma fill. The
/// refinement reads greens two pixels away, so the band must be filled first.
#[derive(Debug, Clone, Copy)]
pub struct CpuDebayer {
    phase: CfaPhase,
    remove_hot_pixels: bool,
}

impl CpuDebayer {
    pub fn new(phase: CfaPhase) -> Result<Self> {
        phase.validate()?;
        Ok(Self { phase, remove_hot_pixels: true })
    }

    pub fn with_hot_pixel_removal(mut self, enabled: bool) -> Self {
        self.remove_hot_pixels = enabled;
        self
    }

    pub fn phase(&self) -> CfaPhase {
        self.phase
    }

    /// Demosaics into a newly allocated packed RGB raster.
    pub fn process(&self, mosaic: &RawMosaic) -> Result<DenseRaster> {
        mosaic.validate()?;
        let mut out = DenseRaster::interleaved_rgb(mosaic.width, mosaic.height)?;
        self.process_into(mosaic, &mut out)?;
        Ok(out)
    }

    /// Demosaics into `out`, which may use any layout of the mosaic's size.
    /// Nothing is written unless every precondition holds.
    pub fn process_into(&self, mosaic: &RawMosaic, out: &mut DenseRaster) -> Result<()> {
        mosaic.validate()?;
        out.validate()?;
        ensure(out.width() == mosaic.width && out.height() == mosaic.height, || {
            format!(
                "output raster is {}x{} but the mosaic is {}x{}",
                out.width(),
                out.height(),
                mosaic.width,
                mosaic.height
            )
        })?;

        info!(
            "Starting CPU debayering for image {}x{} ({})",
            mosaic.width, mosaic.height, self.phase
        );

        {
            let _span = tracing::debug_span!("separate", hot_pixels = self.remove_hot_pixels).entered();
            separate::separate(mosaic, self.phase, self.remove_hot_pixels, out);
        }
        {
            let _span = tracing::debug_span!("green_interpolate").entered();
            green::interpolate(out, self.phase);
        }
        {
            let _span = tracing::debug_span!("border_fill").entered();
            border::fill_border(out, self.phase);
        }
        {
            let _span = tracing::debug_span!("green_refine").entered();
            green::refine(out, self.phase);
        }
        {
            let _span = tracing::debug_span!("chroma_fill").entered();
            chroma::fill_chroma(out, self.phase);
        }

        debug!(width = out.width(), height = out.height(), "Debayering complete");
        Ok(())
    }
}
