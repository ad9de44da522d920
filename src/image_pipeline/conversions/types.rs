//! Development pipeline configuration types

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::debayer::types::DenseRaster;
use crate::image_pipeline::conversions::timing::PipelineTimings;
use crate::image_pipeline::denoise::types::{ColorMatrix, DenoiseMethod, FilterParams};
use crate::image_pipeline::raw::types::CfaPhase;

/// Configuration for RAW mosaic development
#[derive(Debug, Clone, PartialEq)]
pub struct DevelopConfig {
    /// Bayer phase of the incoming mosaics
    pub phase: CfaPhase,
    /// Whether to reject hot pixels while separating channels
    pub remove_hot_pixels: bool,
    /// Denoising applied after demosaicing
    pub denoise: DenoiseMethod,
    /// Luma filter parameters, `None` leaves luma untouched
    pub luma: Option<FilterParams>,
    /// Joint chroma filter parameters, `None` leaves chroma untouched
    pub chroma: Option<FilterParams>,
    /// RGB to YST matrices used by the denoiser
    pub color_matrix: ColorMatrix,
    /// Whether to validate image dimensions before development
    pub validate_dimensions: bool,
    /// Largest accepted width or height when validating
    pub max_dimension: Option<usize>,
}

impl Default for DevelopConfig {
    fn default() -> Self {
        Self {
            phase: CfaPhase::rggb(),
            remove_hot_pixels: true,
            denoise: DenoiseMethod::None,
            luma: None,
            chroma: None,
            color_matrix: ColorMatrix::rec709_yst(),
            validate_dimensions: true,
            max_dimension: None,
        }
    }
}

impl DevelopConfig {
    pub fn builder() -> DevelopConfigBuilder {
        DevelopConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str, e: PipelineError| PipelineError::InvalidConfig(format!("{what}: {e}"));
        self.phase.validate().map_err(|e| invalid("phase", e))?;
        if let Some(luma) = &self.luma {
            luma.validate().map_err(|e| invalid("luma filter", e))?;
        }
        if let Some(chroma) = &self.chroma {
            chroma.validate().map_err(|e| invalid("chroma filter", e))?;
        }
        self.color_matrix.validate().map_err(|e| invalid("color matrix", e))?;
        if self.max_dimension == Some(0) {
            return Err(PipelineError::InvalidConfig("max_dimension must be positive".to_string()));
        }
        Ok(())
    }
}

/// Builder for DevelopConfig
#[derive(Default)]
pub struct DevelopConfigBuilder {
    phase: Option<CfaPhase>,
    remove_hot_pixels: Option<bool>,
    denoise: Option<DenoiseMethod>,
    luma: Option<Option<FilterParams>>,
    chroma: Option<Option<FilterParams>>,
    color_matrix: Option<ColorMatrix>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
}

impl DevelopConfigBuilder {
    pub fn phase(mut self, phase: CfaPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn remove_hot_pixels(mut self, enable: bool) -> Self {
        self.remove_hot_pixels = Some(enable);
        self
    }

    pub fn denoise(mut self, method: DenoiseMethod) -> Self {
        self.denoise = Some(method);
        self
    }

    pub fn luma(mut self, params: Option<FilterParams>) -> Self {
        self.luma = Some(params);
        self
    }

    pub fn chroma(mut self, params: Option<FilterParams>) -> Self {
        self.chroma = Some(params);
        self
    }

    pub fn color_matrix(mut self, matrix: ColorMatrix) -> Self {
        self.color_matrix = Some(matrix);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> DevelopConfig {
        let default = DevelopConfig::default();
        DevelopConfig {
            phase: self.phase.unwrap_or(default.phase),
            remove_hot_pixels: self.remove_hot_pixels.unwrap_or(default.remove_hot_pixels),
            denoise: self.denoise.unwrap_or(default.denoise),
            luma: self.luma.unwrap_or(default.luma),
            chroma: self.chroma.unwrap_or(default.chroma),
            color_matrix: self.color_matrix.unwrap_or(default.color_matrix),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}

/// Result of one development run.
#[derive(Debug)]
pub struct DevelopOutput {
    pub raster: DenseRaster,
    pub timings: PipelineTimings,
}
