//! Image processing pipeline module
//!
//! Turns single-channel Bayer mosaics into RGB rasters, with separate modules
//! for mosaic types, demosaicing, denoising, and the orchestration of both.

pub mod common;
pub mod conversions;
pub mod debayer;
pub mod denoise;
pub mod raw;

pub use common::{
    PipelineError,
    RasterLayout,
    Result,
};

pub use raw::{
    CfaPhase,
    Channel,
    RawMosaic,
};

pub use debayer::{
    CpuDebayer,
    DenseRaster,
    demosaic,
};

pub use denoise::{
    BilateralMode,
    ColorMatrix,
    CpuDenoiser,
    DenoiseMethod,
    FilterParams,
    HalfKernel,
    NlmMethod,
    bilateral_denoise,
    denoise,
    nlm_denoise,
};

pub use conversions::{
    DevelopConfig,
    DevelopConfigBuilder,
    DevelopOutput,
    DevelopPipeline,
};
