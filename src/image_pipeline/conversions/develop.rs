use tracing::{info, instrument};

use crate::image_pipeline::{
    common::error::{PipelineError, Result},
    conversions::timing::{PipelineTimings, Timer},
    conversions::types::{DevelopConfig, DevelopOutput},
    debayer::CpuDebayer,
    denoise::CpuDenoiser,
    raw::RawMosaic,
};

/// Demosaics a RAW mosaic and optionally denoises the result.
pub struct DevelopPipeline {
    debayer: CpuDebayer,
    denoiser: CpuDenoiser,
    config: DevelopConfig,
}

impl DevelopPipeline {
    pub fn new(config: DevelopConfig) -> Result<Self> {
        config.validate()?;
        let debayer = CpuDebayer::new(config.phase)?.with_hot_pixel_removal(config.remove_hot_pixels);
        let denoiser = CpuDenoiser::new(
            config.denoise,
            config.luma.clone(),
            config.chroma.clone(),
            config.color_matrix,
        )?;
        Ok(Self {
            debayer,
            denoiser,
            config,
        })
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                return Err(PipelineError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    #[instrument(skip(self, mosaic), fields(width = mosaic.width, height = mosaic.height))]
    pub fn develop(&self, mosaic: &RawMosaic) -> Result<DevelopOutput> {
        info!("Starting RAW development");
        let mut timings = PipelineTimings::new();

        {
            let _span = tracing::info_span!("validate_dimensions").entered();
            let timer = Timer::start("validate");
            self.validate_dimensions(mosaic.width, mosaic.height)?;
            mosaic.validate()?;
            timings.record(timer);
        }

        let raster = {
            let _span = tracing::info_span!("demosaic", phase = %self.config.phase).entered();
            let timer = Timer::start("demosaic");
            let raster = self.debayer.process(mosaic)?;
            timings.record(timer);
            raster
        };

        let raster = if self.denoiser.is_active() {
            let _span = tracing::info_span!("denoise", method = ?self.config.denoise).entered();
            let timer = Timer::start("denoise");
            let denoised = self.denoiser.process(&raster)?;
            timings.record(timer);
            denoised
        } else {
            raster
        };

        info!(
            width = raster.width(),
            height = raster.height(),
            "Development complete"
        );
        Ok(DevelopOutput { raster, timings })
    }

    pub fn config(&self) -> &DevelopConfig {
        &self.config
    }

    /// Replaces the configuration, keeping the current one if `config` is invalid.
    pub fn set_config(&mut self, config: DevelopConfig) -> Result<()> {
        *self = Self::new(config)?;
        Ok(())
    }
}
