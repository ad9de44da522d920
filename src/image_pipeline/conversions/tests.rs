use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::image_pipeline::common::error::PipelineError;
use crate::image_pipeline::conversions::{DevelopConfig, DevelopPipeline, PipelineTimings, Timer};
use crate::image_pipeline::denoise::{
    BilateralMode, ColorMatrix, DenoiseMethod, FilterParams, HalfKernel, NlmMethod,
};
use crate::image_pipeline::raw::types::{CfaPhase, Channel, RawMosaic};

fn flat_field(width: usize, height: usize, phase: CfaPhase) -> RawMosaic {
    RawMosaic::from_fn(width, height, |x, y| match phase.color_at(x, y) {
        Channel::Red => 100,
        Channel::Green => 200,
        Channel::Blue => 300,
    })
    .unwrap()
}

fn noisy_field(width: usize, height: usize, seed: u64) -> RawMosaic {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height)
        .map(|_| 30000 + rng.random_range(0..6000u16) - 3000)
        .collect();
    RawMosaic::new(width, height, data).unwrap()
}

fn green_variance(raster: &crate::image_pipeline::debayer::DenseRaster, margin: usize) -> f64 {
    let values: Vec<f64> = (margin..raster.height() - margin)
        .flat_map(|y| (margin..raster.width() - margin).map(move |x| (x, y)))
        .map(|(x, y)| f64::from(raster.get(x, y, Channel::Green)))
        .collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

#[test]
fn test_config_builder() {
    let params = FilterParams::gaussian(2, 1, 0.1, 1.0).unwrap();
    let config = DevelopConfig::builder()
        .phase(CfaPhase::gbrg())
        .remove_hot_pixels(false)
        .denoise(DenoiseMethod::NonLocalMeans(NlmMethod::Separable))
        .luma(Some(params.clone()))
        .validate_dimensions(false)
        .max_dimension(Some(10000))
        .build();

    assert_eq!(config.phase, CfaPhase::gbrg());
    assert!(!config.remove_hot_pixels);
    assert_eq!(config.denoise, DenoiseMethod::NonLocalMeans(NlmMethod::Separable));
    assert_eq!(config.luma, Some(params));
    assert_eq!(config.chroma, None);
    assert!(!config.validate_dimensions);
    assert_eq!(config.max_dimension, Some(10000));
}

#[test]
fn test_config_defaults() {
    let config = DevelopConfig::default();
    assert_eq!(config.phase, CfaPhase::rggb());
    assert!(config.remove_hot_pixels);
    assert_eq!(config.denoise, DenoiseMethod::None);
    assert!(config.validate_dimensions);
    assert_eq!(config.max_dimension, None);
    assert_eq!(DevelopConfig::builder().build(), config);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mismatched = FilterParams {
        radius: 3,
        patch_radius: 1,
        intensity: 0.1,
        kernel: HalfKernel::flat(1),
    };
    let config = DevelopConfig::builder().chroma(Some(mismatched)).build();
    assert!(matches!(DevelopPipeline::new(config), Err(PipelineError::InvalidConfig(_))));

    let config = DevelopConfig {
        phase: CfaPhase { gx: 2, gy: 0, ry: 0 },
        ..DevelopConfig::default()
    };
    assert!(matches!(DevelopPipeline::new(config), Err(PipelineError::InvalidConfig(_))));

    let config = DevelopConfig::builder().max_dimension(Some(0)).build();
    assert!(matches!(DevelopPipeline::new(config), Err(PipelineError::InvalidConfig(_))));
}

#[test]
fn test_dimension_validation() {
    let pipeline = DevelopPipeline::new(DevelopConfig::builder().max_dimension(Some(16)).build()).unwrap();
    let result = pipeline.develop(&flat_field(17, 8, CfaPhase::rggb()));
    assert_eq!(result.unwrap_err(), PipelineError::InvalidDimensions(17, 8));
    assert!(pipeline.develop(&flat_field(16, 16, CfaPhase::rggb())).is_ok());

    let empty = RawMosaic {
        width: 0,
        height: 4,
        row_stride: 0,
        offset: 0,
        data: Vec::new(),
    };
    assert_eq!(
        pipeline.develop(&empty).unwrap_err(),
        PipelineError::InvalidDimensions(0, 4)
    );

    let unchecked = DevelopPipeline::new(
        DevelopConfig::builder()
            .validate_dimensions(false)
            .max_dimension(Some(16))
            .build(),
    )
    .unwrap();
    assert!(unchecked.develop(&flat_field(17, 8, CfaPhase::rggb())).is_ok());
}

#[test]
fn test_flat_field_develops_to_flat_color() {
    let params = FilterParams::gaussian(2, 1, 0.1, 1.5).unwrap();
    for method in [
        DenoiseMethod::None,
        DenoiseMethod::Bilateral(BilateralMode::Separable),
        DenoiseMethod::NonLocalMeans(NlmMethod::BoxSum),
    ] {
        let config = DevelopConfig::builder()
            .denoise(method)
            .luma(Some(params.clone()))
            .chroma(Some(params.clone()))
            .build();
        let output = DevelopPipeline::new(config)
            .unwrap()
            .develop(&flat_field(12, 10, CfaPhase::rggb()))
            .unwrap();

        assert_eq!(output.raster.width(), 12);
        assert_eq!(output.raster.height(), 10);
        for y in 0..10 {
            for x in 0..12 {
                let [r, g, b] = output.raster.pixel(x, y);
                assert!(r.abs_diff(100) <= 1, "{method:?} ({x}, {y}) red {r}");
                assert!(g.abs_diff(200) <= 1, "{method:?} ({x}, {y}) green {g}");
                assert!(b.abs_diff(300) <= 1, "{method:?} ({x}, {y}) blue {b}");
            }
        }
    }
}

#[test]
fn test_denoising_reduces_noise() {
    let mosaic = noisy_field(32, 32, 5);
    let plain = DevelopPipeline::new(DevelopConfig::default())
        .unwrap()
        .develop(&mosaic)
        .unwrap();

    let params = FilterParams::gaussian(2, 1, 0.2, 1.5).unwrap();
    let config = DevelopConfig::builder()
        .denoise(DenoiseMethod::NonLocalMeans(NlmMethod::BoxSum))
        .luma(Some(params.clone()))
        .chroma(Some(params))
        .color_matrix(ColorMatrix::default())
        .build();
    let denoised = DevelopPipeline::new(config).unwrap().develop(&mosaic).unwrap();

    assert!(green_variance(&denoised.raster, 4) < 0.5 * green_variance(&plain.raster, 4));
}

#[test]
fn test_timings_follow_stages() {
    let pipeline = DevelopPipeline::new(DevelopConfig::default()).unwrap();
    let output = pipeline.develop(&flat_field(8, 8, CfaPhase::rggb())).unwrap();
    let names: Vec<&str> = output.timings.steps().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["validate", "demosaic"]);

    let params = FilterParams::gaussian(1, 1, 0.1, 1.0).unwrap();
    let config = DevelopConfig::builder()
        .denoise(DenoiseMethod::Bilateral(BilateralMode::Full))
        .luma(Some(params))
        .build();
    let output = DevelopPipeline::new(config)
        .unwrap()
        .develop(&flat_field(8, 8, CfaPhase::rggb()))
        .unwrap();
    assert!(output.timings.get_step("denoise").is_some());
    assert_eq!(output.timings.steps().len(), 3);
}

#[test]
fn test_timings_accumulate_repeated_steps() {
    let mut timings = PipelineTimings::new();
    timings.add_step("demosaic", std::time::Duration::from_millis(3));
    timings.add_step("demosaic", std::time::Duration::from_millis(2));
    timings.record(Timer::start("denoise"));

    assert_eq!(timings.get_step("demosaic"), Some(std::time::Duration::from_millis(5)));
    assert_eq!(timings.steps().len(), 3);
    assert!(timings.total_duration() >= std::time::Duration::from_millis(5));
    assert_eq!(timings.get_step("missing"), None);
}

#[test]
fn test_set_config_keeps_previous_on_error() {
    let mut pipeline = DevelopPipeline::new(DevelopConfig::default()).unwrap();
    let bad = DevelopConfig::builder().max_dimension(Some(0)).build();
    assert!(pipeline.set_config(bad).is_err());
    assert_eq!(pipeline.config(), &DevelopConfig::default());

    let other = DevelopConfig::builder().phase(CfaPhase::bggr()).build();
    pipeline.set_config(other.clone()).unwrap();
    assert_eq!(pipeline.config(), &other);
}
