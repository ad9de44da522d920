use tracing::{debug, info};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::debayer::types::DenseRaster;
use crate::image_pipeline::denoise::bilateral::{bilateral_full, bilateral_separable};
use crate::image_pipeline::denoise::color_space::{to_dense_rgb, to_planar_yst};
use crate::image_pipeline::denoise::nlm::{nlm_box_sum, nlm_separable};
use crate::image_pipeline::denoise::types::{
    BilateralMode, ColorMatrix, DenoiseMethod, FilterParams, NlmMethod, Plane,
};

/// Edge-preserving smoothing of a dense raster in YST space.
///
/// Luma and chroma are filtered independently, each only when its parameters
/// are present and not negligible. When nothing would be filtered the input
/// is returned unchanged, without the color round trip.
#[derive(Debug, Clone)]
pub struct CpuDenoiser {
    method: DenoiseMethod,
    luma: Option<FilterParams>,
    chroma: Option<FilterParams>,
    matrix: ColorMatrix,
}

impl CpuDenoiser {
    pub fn new(
        method: DenoiseMethod,
        luma: Option<FilterParams>,
        chroma: Option<FilterParams>,
        matrix: ColorMatrix,
    ) -> Result<Self> {
        for (name, params) in [("luma", &luma), ("chroma", &chroma)] {
            if let Some(params) = params {
                params.validate().map_err(|e| match e {
                    PipelineError::PreconditionViolation(msg) => {
                        PipelineError::PreconditionViolation(format!("{name} filter: {msg}"))
                    }
                    other => other,
                })?;
            }
        }
        matrix.validate()?;
        Ok(Self { method, luma, chroma, matrix })
    }

    fn active<'a>(&self, params: &'a Option<FilterParams>) -> Option<&'a FilterParams> {
        let params = params.as_ref()?;
        let active = match self.method {
            DenoiseMethod::None => false,
            DenoiseMethod::Bilateral(_) => !params.is_negligible(),
            DenoiseMethod::NonLocalMeans(_) => !params.is_negligible() && params.radius >= 1,
        };
        active.then_some(params)
    }

    /// Whether [`CpuDenoiser::process`] would change anything.
    pub fn is_active(&self) -> bool {
        self.active(&self.luma).is_some() || self.active(&self.chroma).is_some()
    }

    pub fn process(&self, raster: &DenseRaster) -> Result<DenseRaster> {
        raster.validate()?;
        if !self.is_active() {
            debug!("Denoising disabled, passing raster through");
            return Ok(raster.clone());
        }

        info!(
            "Starting CPU denoising for image {}x{} with {:?}",
            raster.width(),
            raster.height(),
            self.method
        );

        let mut yst = {
            let _span = tracing::debug_span!("rgb_to_yst").entered();
            to_planar_yst(raster, &self.matrix)
        };

        if let Some(params) = self.active(&self.luma) {
            let _span = tracing::debug_span!("denoise_luma", radius = params.radius).entered();
            self.filter_luma(&mut yst.y, params);
        }

        if let Some(params) = self.active(&self.chroma) {
            let _span = tracing::debug_span!("denoise_chroma", radius = params.radius).entered();
            let mut st = Plane::stack(&[&yst.s, &yst.t]);
            self.filter_chroma(&mut st, params);
            let mut planes = st.split().into_iter();
            if let (Some(s), Some(t)) = (planes.next(), planes.next()) {
                yst.s = s;
                yst.t = t;
            }
        }

        let mut out = raster.clone();
        {
            let _span = tracing::debug_span!("yst_to_rgb").entered();
            to_dense_rgb(&yst, &self.matrix, &mut out);
        }
        Ok(out)
    }

    fn filter_luma(&self, plane: &mut Plane, params: &FilterParams) {
        match self.method {
            DenoiseMethod::None => {}
            DenoiseMethod::Bilateral(BilateralMode::Separable) => bilateral_separable(plane, params),
            DenoiseMethod::Bilateral(BilateralMode::Full) => bilateral_full(plane, params),
            DenoiseMethod::NonLocalMeans(NlmMethod::BoxSum) => nlm_box_sum(plane, params),
            DenoiseMethod::NonLocalMeans(NlmMethod::Separable) => nlm_separable(plane, params),
        }
    }

    fn filter_chroma(&self, plane: &mut Plane, params: &FilterParams) {
        match self.method {
            DenoiseMethod::None => {}
            DenoiseMethod::Bilateral(_) => bilateral_separable(plane, params),
            DenoiseMethod::NonLocalMeans(NlmMethod::BoxSum) => nlm_box_sum(plane, params),
            DenoiseMethod::NonLocalMeans(NlmMethod::Separable) => nlm_separable(plane, params),
        }
    }
}
