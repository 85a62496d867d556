//! One-pole lowpass used to darken the tape feedback path and reverb tap.
//!
//! ```text
//! y[n] = b * x[n] + a * y[n-1],   a = exp(-2π f / fs),   b = 1 - a
//! ```
//!
//! 6 dB/octave, zero latency, one multiply-add per sample. The recursion is
//! unconditionally stable for any `a` in `[0, 1)`.
//!
//! ```rust
//! use walrus_core::OnePole;
//!
//! let mut lp = OnePole::new(48000.0, 4000.0);
//! let filtered = lp.process(1.0);
//! assert!(filtered < 1.0);
//! ```

use crate::flush_denormal;
use libm::expf;

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `coeff` is always in `[0, 1)`
/// - `state` is flushed to zero when it drops into the denormal range
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Create a new one-pole lowpass filter.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Set the cutoff frequency and recalculate the coefficient.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.recalculate_coeff();
    }

    /// Current cutoff in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // y[n] = x[n] + a * (y[n-1] - x[n])
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    /// `a = exp(-2π f / fs)`, clamped into `[0, 1)`. Zero or negative
    /// frequencies give the slowest usable filter rather than a frozen one.
    fn recalculate_coeff(&mut self) {
        let a = expf(-core::f32::consts::TAU * self.freq.max(0.0) / self.sample_rate);
        self.coeff = if a.is_finite() { a.clamp(0.0, 0.999_999) } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = lp.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-4, "DC should pass through, got {out}");
    }

    #[test]
    fn attenuates_nyquist() {
        let mut lp = OnePole::new(48000.0, 100.0);
        let mut sum = 0.0f32;
        for i in 0..4800 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            sum += lp.process(input).abs();
        }
        let avg = sum / 4800.0;
        assert!(avg < 0.05, "Nyquist should be heavily attenuated, avg = {avg}");
    }

    #[test]
    fn near_transparent_at_high_cutoff() {
        let mut lp = OnePole::new(44100.0, 20000.0);
        let first = lp.process(1.0);
        assert!(first > 0.9, "got {first}");
    }

    #[test]
    fn zero_cutoff_stays_finite() {
        let mut lp = OnePole::new(48000.0, 0.0);
        for _ in 0..1000 {
            assert!(lp.process(1.0).is_finite());
        }
    }

    #[test]
    fn reset_clears_state() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        lp.process(1.0);
        lp.reset();
        assert_eq!(lp.process(0.0), 0.0);
    }
}
