//! Numeric primitives shared by the demosaic and denoise kernels.
//!
//! The transcendental approximations work on the IEEE-754 bit pattern through
//! `f32::to_bits` / `f32::from_bits`. They trade a few percent of accuracy for
//! throughput and are only used where that error is acceptable (Gaussian
//! weights, parameter conversion).

use std::f32::consts::LN_2;

/// Largest 16-bit sample as a float.
pub const U16_MAX_F: f32 = 65535.0;

/// Inputs below this yield exactly zero from [`fast_exp`].
pub const FAST_EXP_MIN: f32 = -16.0;

// Schraudolph's constants for a 23-bit mantissa: scale by 2^23 / ln 2 and bias
// the exponent, shifted down to balance the error of the linear mantissa.
const FAST_EXP_A: f32 = (1 << 23) as f32 / LN_2;
const FAST_EXP_B: f32 = 127.0 * (1 << 23) as f32 - 405_000.0;
const FAST_EXP_MAX: f32 = 88.0;

const INV_SQRT_MAGIC: u32 = 0x5f37_59df;

/// Clamps an integer intermediate to the 16-bit sample range.
#[inline]
pub fn clamp_u16(x: i32) -> u16 {
    x.clamp(0, 0xffff) as u16
}

/// Clamps a float to the 16-bit sample range, truncating the fraction.
///
/// NaN maps to 0.
#[inline]
pub fn clamp_u16_f32(x: f32) -> u16 {
    // `as` saturates and sends NaN to zero
    x.clamp(0.0, U16_MAX_F) as u16
}

/// Monotone approximation of `e^x`, zero for `x < -16`.
#[inline]
pub fn fast_exp(x: f32) -> f32 {
    if !(x >= FAST_EXP_MIN) {
        return 0.0;
    }
    let x = x.min(FAST_EXP_MAX);
    f32::from_bits((FAST_EXP_A * x + FAST_EXP_B) as i32 as u32)
}

/// Approximate base-2 logarithm from the exponent field plus a quadratic fit
/// of the mantissa. Non-positive inputs return negative infinity.
#[inline]
pub fn fast_log2(x: f32) -> f32 {
    if !(x > 0.0) {
        return f32::NEG_INFINITY;
    }
    let bits = x.to_bits();
    let exponent = ((bits >> 23) & 0xff) as i32 - 128;
    let mantissa = f32::from_bits((bits & 0x007f_ffff) | 0x3f80_0000);
    exponent as f32 + (-(1.0 / 3.0) * mantissa + 2.0) * mantissa - 2.0 / 3.0
}

/// Reciprocal square root: bit-level estimate refined by one Newton step.
#[inline]
pub fn inverse_sqrt(x: f32) -> f32 {
    let half = 0.5 * x;
    let y = f32::from_bits(INV_SQRT_MAGIC.wrapping_sub(x.to_bits() >> 1));
    y * (1.5 - half * y * y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_err(approx: f32, exact: f32) -> f32 {
        ((approx - exact) / exact).abs()
    }

    #[test]
    fn clamp_u16_bounds() {
        assert_eq!(clamp_u16(-5), 0);
        assert_eq!(clamp_u16(0), 0);
        assert_eq!(clamp_u16(1234), 1234);
        assert_eq!(clamp_u16(65535), 65535);
        assert_eq!(clamp_u16(70000), 65535);
    }

    #[test]
    fn clamp_u16_f32_truncates() {
        assert_eq!(clamp_u16_f32(-0.5), 0);
        assert_eq!(clamp_u16_f32(12.9), 12);
        assert_eq!(clamp_u16_f32(65535.7), 65535);
        assert_eq!(clamp_u16_f32(1.0e9), 65535);
        assert_eq!(clamp_u16_f32(f32::NAN), 0);
    }

    #[test]
    fn fast_exp_relative_error() {
        let mut x = -15.9f32;
        while x <= 4.0 {
            let err = rel_err(fast_exp(x), x.exp());
            assert!(err < 0.06, "fast_exp({x}) rel err {err}");
            x += 0.01;
        }
    }

    #[test]
    fn fast_exp_underflows_to_zero() {
        assert_eq!(fast_exp(-16.01), 0.0);
        assert_eq!(fast_exp(-1000.0), 0.0);
        assert_eq!(fast_exp(f32::NEG_INFINITY), 0.0);
        assert_eq!(fast_exp(f32::NAN), 0.0);
        assert!(fast_exp(-16.0) > 0.0);
    }

    #[test]
    fn fast_exp_is_monotone() {
        let mut prev = fast_exp(-16.0);
        let mut x = -16.0f32;
        while x <= 0.0 {
            let v = fast_exp(x);
            assert!(v >= prev, "fast_exp not monotone at {x}");
            prev = v;
            x += 0.001;
        }
    }

    #[test]
    fn fast_log2_absolute_error() {
        for &x in &[0.001f32, 0.3, 1.0, 1.5, 2.0, 3.7, 100.0, 65535.0, 1.0e10] {
            let err = (fast_log2(x) - x.log2()).abs();
            assert!(err < 0.01, "fast_log2({x}) abs err {err}");
        }
        assert_eq!(fast_log2(0.0), f32::NEG_INFINITY);
        assert_eq!(fast_log2(-2.0), f32::NEG_INFINITY);
    }

    #[test]
    fn inverse_sqrt_relative_error() {
        for &x in &[1.0e-4f32, 0.02, 0.5, 1.0, 2.0, 10.0, 12345.0, 1.0e8] {
            let err = rel_err(inverse_sqrt(x), 1.0 / x.sqrt());
            assert!(err < 0.0025, "inverse_sqrt({x}) rel err {err}");
        }
    }
}
