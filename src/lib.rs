//! Raw development core: CFA demosaicing and edge-preserving denoising.

pub mod image_pipeline;
pub mod logger;
