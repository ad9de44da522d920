//! Types for denoising operations

use std::ops::Index;

use crate::image_pipeline::common::error::{PipelineError, Result, ensure};
use crate::image_pipeline::common::math::inverse_sqrt;
use crate::image_pipeline::common::parallel::transpose;

/// Intensities below this disable a filter.
pub const NEGLIGIBLE_INTENSITY: f32 = 1.0e-6;

/// Most samples a [`Plane`] pixel can carry.
pub const MAX_CHANNELS: usize = 3;

/// Dense `f32` grid with `channels` interleaved samples per pixel and no
/// padding. Luma uses one channel, joint chroma filtering two.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        debug_assert!((1..=MAX_CHANNELS).contains(&channels));
        Self { width, height, channels, data: vec![0.0; width * height * channels] }
    }

    pub fn mono(width: usize, height: usize) -> Self {
        Self::new(width, height, 1)
    }

    pub fn from_vec(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Result<Self> {
        ensure((1..=MAX_CHANNELS).contains(&channels), || {
            format!("plane channel count {channels} is not in 1..={MAX_CHANNELS}")
        })?;
        ensure(data.len() == width * height * channels, || {
            format!(
                "plane buffer holds {} samples, {width}x{height}x{channels} needs {}",
                data.len(),
                width * height * channels
            )
        })?;
        Ok(Self { width, height, channels, data })
    }

    /// Samples in one row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) * self.channels
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.data[self.index(x, y) + channel]
    }

    pub fn transposed(&self) -> Plane {
        Plane {
            width: self.height,
            height: self.width,
            channels: self.channels,
            data: transpose(&self.data, self.width, self.height, self.channels),
        }
    }

    /// Interleaves same-sized single-channel planes into one plane.
    pub fn stack(planes: &[&Plane]) -> Plane {
        let (width, height) = planes.first().map_or((0, 0), |p| (p.width, p.height));
        debug_assert!(planes.iter().all(|p| p.channels == 1 && p.width == width && p.height == height));
        let channels = planes.len();
        let mut data = Vec::with_capacity(width * height * channels);
        for i in 0..width * height {
            data.extend(planes.iter().map(|p| p.data[i]));
        }
        Plane { width, height, channels, data }
    }

    /// Splits into single-channel planes, the inverse of [`Plane::stack`].
    pub fn split(&self) -> Vec<Plane> {
        (0..self.channels)
            .map(|c| Plane {
                width: self.width,
                height: self.height,
                channels: 1,
                data: self.data.iter().skip(c).step_by(self.channels).copied().collect(),
            })
            .collect()
    }
}

/// Luma and the two offset chroma planes of a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarYst {
    pub y: Plane,
    pub s: Plane,
    pub t: Plane,
}

impl PlanarYst {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            y: Plane::mono(width, height),
            s: Plane::mono(width, height),
            t: Plane::mono(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.y.width
    }

    pub fn height(&self) -> usize {
        self.y.height
    }
}

/// Spatial kernel of `2 * radius + 1` negated exponents.
///
/// Entry `radius` is the center. A sample `k` taps away from the center is
/// weighted by `exp(-kernel[radius + k])`.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfKernel {
    values: Vec<f32>,
}

impl HalfKernel {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        ensure(values.len() % 2 == 1, || {
            format!("kernel length {} is not odd", values.len())
        })?;
        ensure(values.iter().all(|v| v.is_finite()), || {
            "kernel contains non-finite values".to_string()
        })?;
        Ok(Self { values })
    }

    /// Spatial Gaussian of standard deviation `sigma`: `(k - radius)^2 / (2 sigma^2)`.
    pub fn gaussian(sigma: f32, radius: usize) -> Result<Self> {
        ensure(sigma.is_finite() && sigma > 0.0, || {
            format!("spatial sigma must be positive and finite, got {sigma}")
        })?;
        let denom = 2.0 * sigma * sigma;
        let values = (0..=2 * radius)
            .map(|k| {
                let d = k as f32 - radius as f32;
                d * d / denom
            })
            .collect();
        Self::new(values)
    }

    /// Every tap weighted equally.
    pub fn flat(radius: usize) -> Self {
        Self { values: vec![0.0; 2 * radius + 1] }
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.values.len() / 2
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl Index<usize> for HalfKernel {
    type Output = f32;

    #[inline]
    fn index(&self, k: usize) -> &f32 {
        &self.values[k]
    }
}

/// Forward (RGB to YST) and inverse (YST to RGB) 3x3 matrices.
///
/// The two are supplied independently and need not be exact inverses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    pub forward: [[f32; 3]; 3],
    pub inverse: [[f32; 3]; 3],
}

/// Rec. 709 luma weights.
pub const REC709_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

impl ColorMatrix {
    pub fn new(forward: [[f32; 3]; 3], inverse: [[f32; 3]; 3]) -> Result<Self> {
        let matrix = Self { forward, inverse };
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn validate(&self) -> Result<()> {
        ensure(
            self.forward.iter().chain(&self.inverse).flatten().all(|v| v.is_finite()),
            || "color matrix contains non-finite values".to_string(),
        )
    }

    /// YST space for luma weights `[wr, wg, wb]`:
    ///
    /// ```text
    /// Y = wr R + wg G + wb B
    /// S = R / 2 - G / 4 - B / 4
    /// T = G / 2 - B / 2
    /// ```
    pub fn yst(weights: [f32; 3]) -> Result<Self> {
        let sum: f32 = weights.iter().sum();
        ensure(weights.iter().all(|w| w.is_finite()) && sum.abs() > f32::EPSILON, || {
            format!("luma weights {weights:?} must be finite with a non-zero sum")
        })?;
        Ok(Self::yst_unchecked(weights))
    }

    pub fn rec709_yst() -> Self {
        Self::yst_unchecked(REC709_WEIGHTS)
    }

    fn yst_unchecked([wr, wg, wb]: [f32; 3]) -> Self {
        let k = 1.0 / (wr + wg + wb);
        let t = k * (wg - wb);
        Self {
            forward: [[wr, wg, wb], [0.5, -0.25, -0.25], [0.0, 0.5, -0.5]],
            inverse: [
                [k, 2.0 - 2.0 * k * wr, -t],
                [k, -2.0 * k * wr, 1.0 - t],
                [k, -2.0 * k * wr, -1.0 - t],
            ],
        }
    }

    /// Pairs `forward` with its computed inverse.
    pub fn from_forward(forward: [[f32; 3]; 3]) -> Result<Self> {
        let m = forward.map(|row| row.map(f64::from));
        let cofactor = |r: usize, c: usize| {
            let (r0, r1) = ((r + 1) % 3, (r + 2) % 3);
            let (c0, c1) = ((c + 1) % 3, (c + 2) % 3);
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        let det = (0..3).map(|c| m[0][c] * cofactor(0, c)).sum::<f64>();
        if !det.is_finite() || det.abs() < 1.0e-12 {
            return Err(PipelineError::PreconditionViolation(format!(
                "forward color matrix is singular (det = {det})"
            )));
        }
        let mut inverse = [[0.0f32; 3]; 3];
        for (r, row) in inverse.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = (cofactor(c, r) / det) as f32;
            }
        }
        Self::new(forward, inverse)
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::rec709_yst()
    }
}

/// Parameters of one bilateral or non-local-means pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    /// Window radius (bilateral) or search radius (non-local means)
    pub radius: usize,
    /// Patch radius, only read by the box-sum non-local means
    pub patch_radius: usize,
    /// Range sigma on samples normalized to [0, 1]
    pub intensity: f32,
    /// Spatial kernel, `radius` must match `kernel.radius()`
    pub kernel: HalfKernel,
}

impl FilterParams {
    pub fn new(radius: usize, patch_radius: usize, intensity: f32, kernel: HalfKernel) -> Result<Self> {
        let params = Self { radius, patch_radius, intensity, kernel };
        params.validate()?;
        Ok(params)
    }

    /// Gaussian spatial kernel of standard deviation `spatial_sigma`.
    pub fn gaussian(radius: usize, patch_radius: usize, intensity: f32, spatial_sigma: f32) -> Result<Self> {
        Self::new(radius, patch_radius, intensity, HalfKernel::gaussian(spatial_sigma, radius)?)
    }

    /// Builds parameters from a range scale `1 / (2 sigma^2)`. A zero scale
    /// yields a disabled filter.
    pub fn from_range_scale(scale: f32, radius: usize, patch_radius: usize, kernel: HalfKernel) -> Result<Self> {
        ensure(scale.is_finite() && scale >= 0.0, || {
            format!("range scale must be finite and non-negative, got {scale}")
        })?;
        let intensity = if scale == 0.0 { 0.0 } else { inverse_sqrt(2.0 * scale) };
        Self::new(radius, patch_radius, intensity, kernel)
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.intensity.is_finite() && self.intensity >= 0.0, || {
            format!("filter intensity must be finite and non-negative, got {}", self.intensity)
        })?;
        ensure(self.kernel.radius() == self.radius, || {
            format!(
                "kernel has {} taps but radius {} needs {}",
                self.kernel.as_slice().len(),
                self.radius,
                2 * self.radius + 1
            )
        })
    }

    /// Coefficient `A = -1 / (2 sigma^2)` of the range exponent.
    #[inline]
    pub fn range_coefficient(&self) -> f32 {
        -1.0 / (2.0 * self.intensity * self.intensity)
    }

    #[inline]
    pub fn is_negligible(&self) -> bool {
        self.intensity < NEGLIGIBLE_INTENSITY
    }
}

/// Bilateral variant used on luma. Chroma is always filtered separably.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BilateralMode {
    /// Row pass then column pass
    #[default]
    Separable,
    /// Full square window
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NlmMethod {
    /// Symmetric pairs with box-summed patch distances
    #[default]
    BoxSum,
    /// Row pass then column pass with 1-D patches
    Separable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DenoiseMethod {
    #[default]
    None,
    Bilateral(BilateralMode),
    NonLocalMeans(NlmMethod),
}
