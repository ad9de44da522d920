use anyhow::{Context, Result};
use rawdev_core::image_pipeline::{
    CfaPhase, DenoiseMethod, DevelopConfig, DevelopPipeline, FilterParams, NlmMethod, RawMosaic,
};
use rawdev_core::logger;

use tracing::{error, info};

/// Flat gray field with deterministic xorshift noise.
fn synthetic_mosaic(width: usize, height: usize) -> Result<RawMosaic> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let data = (0..width * height)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            20000 + (state % 4000) as u16
        })
        .collect();
    Ok(RawMosaic::new(width, height, data)?)
}

fn parse_dimension(arg: Option<String>, default: usize) -> Result<usize> {
    match arg {
        Some(value) => value
            .parse()
            .with_context(|| format!("invalid image dimension: {value}")),
        None => Ok(default),
    }
}

fn main() -> Result<()> {
    logger::init();

    info!("Starting rawdev...");

    let mut args = std::env::args().skip(1);
    let width = parse_dimension(args.next(), 1024)?;
    let height = parse_dimension(args.next(), 768)?;

    let params = FilterParams::gaussian(3, 1, 0.08, 1.5)?;
    let config = DevelopConfig::builder()
        .phase(CfaPhase::rggb())
        .denoise(DenoiseMethod::NonLocalMeans(NlmMethod::BoxSum))
        .luma(Some(params.clone()))
        .chroma(Some(params))
        .build();
    let pipeline = DevelopPipeline::new(config).context("failed to build pipeline")?;

    info!("Development pipeline initialized");
    info!("CFA phase: {}", pipeline.config().phase);
    info!("Denoising: {:?}", pipeline.config().denoise);

    let mosaic = synthetic_mosaic(width, height)?;
    match pipeline.develop(&mosaic) {
        Ok(output) => {
            info!("Development successful!");
            output.timings.log_summary();
        }
        Err(e) => error!("Development failed: {}", e),
    }

    Ok(())
}
