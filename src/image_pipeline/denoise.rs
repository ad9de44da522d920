//! Denoising module: bilateral and non-local-means filtering in YST space

pub mod bilateral;
pub mod box_sum;
pub mod color_space;
pub mod cpu_denoise;
pub mod nlm;
pub mod types;


pub use cpu_denoise::CpuDenoiser;
pub use types::{
    BilateralMode, ColorMatrix, DenoiseMethod, FilterParams, HalfKernel, NlmMethod, Plane,
    PlanarYst, NEGLIGIBLE_INTENSITY,
};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::types::DenseRaster;

/// Separable bilateral filtering of luma (`luma`) and joint chroma (`chroma`).
pub fn bilateral_denoise(
    raster: &DenseRaster,
    luma: Option<&FilterParams>,
    chroma: Option<&FilterParams>,
    matrix: &ColorMatrix,
) -> Result<DenseRaster> {
    denoise(raster, DenoiseMethod::Bilateral(BilateralMode::Separable), luma, chroma, matrix)
}

/// Box-sum non-local means on luma (`luma`) and joint chroma (`chroma`).
pub fn nlm_denoise(
    raster: &DenseRaster,
    luma: Option<&FilterParams>,
    chroma: Option<&FilterParams>,
    matrix: &ColorMatrix,
) -> Result<DenseRaster> {
    denoise(raster, DenoiseMethod::NonLocalMeans(NlmMethod::BoxSum), luma, chroma, matrix)
}

pub fn denoise(
    raster: &DenseRaster,
    method: DenoiseMethod,
    luma: Option<&FilterParams>,
    chroma: Option<&FilterParams>,
    matrix: &ColorMatrix,
) -> Result<DenseRaster> {
    CpuDenoiser::new(method, luma.cloned(), chroma.cloned(), *matrix)?.process(raster)
}
