//! Scalar helpers shared by the tape delay stages.
//!
//! # Waveshapers
//!
//! | Function | Curve | Used for |
//! |----------|-------|----------|
//! | [`exp_soft_clip`] | `1 - e^{-x}` mirrored | Normal tape saturation |
//! | [`tube_warmth`] | `1 - e^{-|x|(1+drive)}` mirrored | Alternate, warmer character |
//!
//! Both are odd, continuous and strictly inside `(-1, 1)` for every input.

use libm::{copysignf, expf, logf};

/// Largest magnitude either waveshaper returns.
///
/// The exponential tail rounds to exactly 1.0 in f32 once `|x|` passes ~17,
/// so results are capped one ulp below.
pub const SHAPER_CEILING: f32 = 1.0 - f32::EPSILON;

/// Exponential soft clip: `1 - e^{-x}` for `x ≥ 0`, `-1 + e^{x}` below.
///
/// Slope 1 at the origin, so small signals pass almost unchanged.
///
/// ```rust
/// use walrus_core::exp_soft_clip;
///
/// assert!(exp_soft_clip(100.0) < 1.0);
/// assert_eq!(exp_soft_clip(-0.3), -exp_soft_clip(0.3));
/// ```
#[inline]
pub fn exp_soft_clip(x: f32) -> f32 {
    let y = 1.0 - expf(-x.abs());
    copysignf(y.min(SHAPER_CEILING), x)
}

/// Tube-style warmth: `sign(x)·(1 - e^{-|x|·(1 + drive)})`.
///
/// `drive` steepens the knee; a negative drive is treated as zero.
#[inline]
pub fn tube_warmth(x: f32, drive: f32) -> f32 {
    let k = 1.0 + drive.max(0.0);
    let y = 1.0 - expf(-x.abs() * k);
    copysignf(y.min(SHAPER_CEILING), x)
}

/// Decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Linear gain to decibels. Inputs at or below `1e-10` read as -200 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Milliseconds to (fractional) samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Flush values below `1e-20` to zero.
///
/// Decaying feedback otherwise drifts into the subnormal range, which is
/// very slow on most CPUs.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// `dry + (wet - dry)·mix`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_soft_clip_shape() {
        assert_eq!(exp_soft_clip(0.0), 0.0);
        assert!((exp_soft_clip(1.0) - (1.0 - expf(-1.0))).abs() < 1e-6);
        assert!((exp_soft_clip(-1.0) + (1.0 - expf(-1.0))).abs() < 1e-6);
        // Slope ~1 near zero.
        assert!((exp_soft_clip(1e-3) - 1e-3).abs() < 1e-6);
    }

    #[test]
    fn test_shapers_strictly_bounded() {
        for x in [20.0, 1.0e3, 1.0e30, f32::MAX, f32::INFINITY] {
            assert!(exp_soft_clip(x) < 1.0);
            assert!(exp_soft_clip(-x) > -1.0);
            assert!(tube_warmth(x, 1.5) < 1.0);
            assert!(tube_warmth(-x, 1.5) > -1.0);
        }
    }

    #[test]
    fn test_tube_warmth_drive_steepens() {
        let soft = tube_warmth(0.3, 0.0);
        let hot = tube_warmth(0.3, 1.5);
        assert!(hot > soft);
        assert_eq!(tube_warmth(0.3, 0.0), exp_soft_clip(0.3));
        assert_eq!(tube_warmth(0.3, -4.0), tube_warmth(0.3, 0.0));
    }

    #[test]
    fn test_db_conversions() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-60.0) - 0.001).abs() < 1e-6);
        assert!((linear_to_db(0.5) + 6.0206).abs() < 1e-3);
    }

    #[test]
    fn test_ms_to_samples() {
        assert_eq!(ms_to_samples(100.0, 44100.0), 4410.0);
        assert_eq!(ms_to_samples(10.0, 48000.0), 480.0);
    }

    #[test]
    fn test_wet_dry_mix() {
        assert_eq!(wet_dry_mix(1.0, 0.5, 0.0), 1.0);
        assert_eq!(wet_dry_mix(1.0, 0.5, 1.0), 0.5);
        assert!((wet_dry_mix(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1.0), 1.0);
        assert_eq!(flush_denormal(1e-10), 1e-10);
        assert_eq!(flush_denormal(1e-21), 0.0);
        assert_eq!(flush_denormal(-1e-38), 0.0);
    }
}
