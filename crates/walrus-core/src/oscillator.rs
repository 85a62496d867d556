//! Sine oscillator driving wow and flutter.
//!
//! Phase is kept in radians and wrapped by a single subtraction. Because the
//! frequency is clamped to a quarter of the sample rate, the per-sample
//! increment is always below `2π` and one subtraction is enough.

use core::f32::consts::TAU;
use libm::sinf;

/// Sine oscillator for slow pitch modulation.
///
/// # Invariants
///
/// - `phase` stays in `[0, 2π)`
/// - frequency is clamped to `[0, sample_rate / 4]`
///
/// # Example
///
/// ```rust
/// use walrus_core::ModulationOscillator;
///
/// let mut wow = ModulationOscillator::new(48000.0, 0.5);
/// let first = wow.next();
/// assert_eq!(first, 0.0);
/// assert!(wow.phase() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ModulationOscillator {
    phase: f32,
    phase_inc: f32,
    freq: f32,
    sample_rate: f32,
}

impl Default for ModulationOscillator {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}

impl ModulationOscillator {
    /// Creates an oscillator at phase 0.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut osc = Self {
            phase: 0.0,
            phase_inc: 0.0,
            freq: 0.0,
            sample_rate,
        };
        osc.set_frequency(freq_hz);
        osc
    }

    /// Sets the frequency in Hz, clamped to `[0, sample_rate / 4]`.
    ///
    /// The increment is only recomputed when the clamped value changes.
    #[inline]
    pub fn set_frequency(&mut self, freq_hz: f32) {
        let limit = if self.sample_rate > 0.0 {
            self.sample_rate * 0.25
        } else {
            0.0
        };
        let freq = if freq_hz.is_finite() {
            freq_hz.clamp(0.0, limit)
        } else {
            0.0
        };
        if freq == self.freq {
            return;
        }
        self.freq = freq;
        self.phase_inc = if self.sample_rate > 0.0 {
            TAU * freq / self.sample_rate
        } else {
            0.0
        };
    }

    /// Current (clamped) frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Rewinds the phase to 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Returns `sin(phase)` and advances by one sample.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let out = sinf(self.phase);
        self.phase += self.phase_inc;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        out
    }
}

/// Pitch modulation factor applied to the delay time:
/// `1 + wow_depth·wow·0.1 + flutter_depth·flutter·0.05`.
#[inline]
pub fn modulation_factor(wow: f32, wow_depth: f32, flutter: f32, flutter_depth: f32) -> f32 {
    1.0 + wow_depth * wow * 0.1 + flutter_depth * flutter * 0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_cycle_per_second() {
        let mut osc = ModulationOscillator::new(44100.0, 1.0);
        for _ in 0..44100 {
            osc.next();
        }
        let err = osc.phase().min(TAU - osc.phase());
        assert!(err < 0.01, "phase error {err}");
    }

    #[test]
    fn test_output_is_sine() {
        let mut osc = ModulationOscillator::new(400.0, 1.0);
        // Quarter period at 1 Hz / 400 Hz is 100 samples.
        for _ in 0..100 {
            osc.next();
        }
        assert!((osc.next() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_phase_stays_wrapped() {
        let mut osc = ModulationOscillator::new(48000.0, 50.0);
        for _ in 0..100_000 {
            let v = osc.next();
            assert!((-1.0..=1.0).contains(&v));
            assert!((0.0..TAU).contains(&osc.phase()));
        }
    }

    #[test]
    fn test_frequency_is_clamped() {
        let mut osc = ModulationOscillator::new(8000.0, 1.0e6);
        assert_eq!(osc.frequency(), 2000.0);
        osc.set_frequency(-3.0);
        assert_eq!(osc.frequency(), 0.0);
        osc.set_frequency(f32::NAN);
        assert_eq!(osc.frequency(), 0.0);
        assert_eq!(osc.next(), 0.0);
        assert_eq!(osc.phase(), 0.0);
    }

    #[test]
    fn test_high_rate_keeps_hz() {
        let mut osc = ModulationOscillator::new(96000.0, 5.0);
        assert_eq!(osc.frequency(), 5.0);
        for _ in 0..96000 {
            osc.next();
        }
        let err = osc.phase().min(TAU - osc.phase());
        assert!(err < 0.05, "phase error {err}");
    }

    #[test]
    fn test_modulation_factor_weights() {
        assert_eq!(modulation_factor(0.0, 1.0, 0.0, 0.5), 1.0);
        assert!((modulation_factor(1.0, 1.0, 0.0, 0.0) - 1.1).abs() < 1e-6);
        assert!((modulation_factor(0.0, 0.0, -1.0, 0.5) - 0.975).abs() < 1e-6);
    }
}
