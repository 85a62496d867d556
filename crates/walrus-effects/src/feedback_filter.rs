//! Low-pass filter in the tape feedback loop.
//!
//! Darkens every repeat so echoes lose treble the way tape does. The cutoff
//! glides linearly over 50 ms and coefficients are only recomputed while it
//! is moving.
//!
//! A NaN or infinite output resets the filter to silence and emits 0.0. The
//! reset is counted and collected with
//! [`take_non_finite_resets`](FeedbackFilter::take_non_finite_resets).

use walrus_core::{Biquad, LinearSmoothedParam, OnePole, lowpass_coefficients};

/// Lowest cutoff in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;
/// Highest cutoff in Hz (further limited to 0.49 × sample rate).
pub const MAX_CUTOFF_HZ: f32 = 20000.0;
/// Cutoff glide time.
pub const CUTOFF_SMOOTHING_MS: f32 = 50.0;
/// Butterworth Q for the biquad variant.
pub const BIQUAD_Q: f32 = 0.707;

/// Filter topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterKind {
    /// 6 dB/oct one-pole.
    #[default]
    OnePole,
    /// 12 dB/oct RBJ biquad, Q 0.707.
    Biquad,
}

/// Smoothed low-pass filter for one channel of the feedback path.
#[derive(Debug, Clone)]
pub struct FeedbackFilter {
    kind: FilterKind,
    one_pole: OnePole,
    biquad: Biquad,
    cutoff: LinearSmoothedParam,
    applied_cutoff: f32,
    sample_rate: f32,
    resets: u32,
}

impl FeedbackFilter {
    /// Creates a filter settled at `cutoff_hz`.
    pub fn new(sample_rate: f32, kind: FilterKind, cutoff_hz: f32) -> Self {
        let cutoff_hz = clamp_cutoff(cutoff_hz, sample_rate);
        let mut filter = Self {
            kind,
            one_pole: OnePole::new(sample_rate, cutoff_hz),
            biquad: Biquad::new(),
            cutoff: LinearSmoothedParam::with_config(cutoff_hz, sample_rate, CUTOFF_SMOOTHING_MS),
            applied_cutoff: f32::NAN,
            sample_rate,
            resets: 0,
        };
        filter.apply_cutoff(cutoff_hz);
        filter
    }

    /// Filter topology.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Sets the cutoff to glide towards. Clamped to
    /// `[20 Hz, min(20 kHz, 0.49 × sample rate)]`.
    pub fn set_cutoff_target(&mut self, cutoff_hz: f32) {
        self.cutoff.set_target(clamp_cutoff(cutoff_hz, self.sample_rate));
    }

    /// Cutoff currently in effect.
    pub fn cutoff(&self) -> f32 {
        self.cutoff.get()
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let cutoff = self.cutoff.advance();
        if cutoff != self.applied_cutoff {
            self.apply_cutoff(cutoff);
        }

        let output = match self.kind {
            FilterKind::OnePole => self.one_pole.process(input),
            FilterKind::Biquad => self.biquad.process(input),
        };

        if output.is_finite() {
            output
        } else {
            self.clear();
            self.resets = self.resets.saturating_add(1);
            0.0
        }
    }

    /// Returns and zeroes the non-finite reset count.
    pub fn take_non_finite_resets(&mut self) -> u32 {
        core::mem::take(&mut self.resets)
    }

    /// Clears filter state and ends any cutoff glide.
    pub fn reset(&mut self) {
        self.clear();
        self.cutoff.snap_to_target();
        let cutoff = self.cutoff.get();
        self.apply_cutoff(cutoff);
    }

    fn clear(&mut self) {
        self.one_pole.reset();
        self.biquad.clear();
    }

    fn apply_cutoff(&mut self, cutoff_hz: f32) {
        self.applied_cutoff = cutoff_hz;
        match self.kind {
            FilterKind::OnePole => self.one_pole.set_frequency(cutoff_hz),
            FilterKind::Biquad => {
                let (b0, b1, b2, a0, a1, a2) =
                    lowpass_coefficients(cutoff_hz, BIQUAD_Q, self.sample_rate);
                self.biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
            }
        }
    }
}

/// Clamps a cutoff into the legal range for `sample_rate`.
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let upper = MAX_CUTOFF_HZ.min(0.49 * sample_rate).max(MIN_CUTOFF_HZ);
    if cutoff_hz.is_finite() {
        cutoff_hz.clamp(MIN_CUTOFF_HZ, upper)
    } else {
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_limits() {
        assert_eq!(clamp_cutoff(5.0, 48000.0), 20.0);
        assert_eq!(clamp_cutoff(30000.0, 48000.0), 20000.0);
        assert_eq!(clamp_cutoff(20000.0, 8000.0), 3920.0);
        assert_eq!(clamp_cutoff(f32::NAN, 8000.0), 3920.0);
    }

    #[test]
    fn both_kinds_pass_dc() {
        for kind in [FilterKind::OnePole, FilterKind::Biquad] {
            let mut f = FeedbackFilter::new(48000.0, kind, 1000.0);
            let mut out = 0.0;
            for _ in 0..48000 {
                out = f.process(1.0);
            }
            assert!((out - 1.0).abs() < 1e-3, "{kind:?}: {out}");
        }
    }

    #[test]
    fn cutoff_glides_over_50_ms() {
        let mut f = FeedbackFilter::new(48000.0, FilterKind::OnePole, 1000.0);
        f.set_cutoff_target(3000.0);
        for _ in 0..1200 {
            f.process(0.0);
        }
        assert!((f.cutoff() - 2000.0).abs() < 5.0, "{}", f.cutoff());
        for _ in 0..1200 {
            f.process(0.0);
        }
        assert_eq!(f.cutoff(), 3000.0);
    }

    #[test]
    fn impulse_decays_to_exact_silence() {
        for kind in [FilterKind::OnePole, FilterKind::Biquad] {
            let mut f = FeedbackFilter::new(48000.0, kind, 20.0);
            f.process(1.0);
            let mut subnormal = 0usize;
            let mut last = 1.0;
            for _ in 0..200_000 {
                last = f.process(0.0);
                if last != 0.0 && !last.is_normal() {
                    subnormal += 1;
                }
            }
            assert_eq!(subnormal, 0, "{kind:?} produced subnormal output");
            assert_eq!(last, 0.0, "{kind:?} never reached silence");
        }
    }

    #[test]
    fn non_finite_output_resets_to_silence() {
        let mut f = FeedbackFilter::new(48000.0, FilterKind::Biquad, 1000.0);
        f.process(0.5);
        assert_eq!(f.process(f32::INFINITY), 0.0);
        assert_eq!(f.take_non_finite_resets(), 1);
        assert_eq!(f.take_non_finite_resets(), 0);
        // History was cleared, so silence in gives silence out.
        assert_eq!(f.process(0.0), 0.0);
    }

    #[test]
    fn nan_input_recovers() {
        let mut f = FeedbackFilter::new(44100.0, FilterKind::OnePole, 4000.0);
        assert_eq!(f.process(f32::NAN), 0.0);
        let y = f.process(1.0);
        assert!(y.is_finite() && y > 0.0);
    }
}
