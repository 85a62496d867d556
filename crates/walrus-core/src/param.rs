//! Smoothed control values for click-free parameter changes.
//!
//! Block-rate control snapshots set a target; the audio loop advances the
//! smoother once per sample. Two shapes are provided:
//!
//! - [`LinearSmoothedParam`]: constant-rate ramp of a fixed length. Used for
//!   delay time, feedback, mix, reverb level, filter cutoff and the feedback
//!   fade envelope.
//! - [`SmoothedParam`]: one-pole exponential approach. Used where an
//!   open-ended glide sounds more natural, e.g. cross-fading the alternate
//!   tape character in and out.
//!
//! ```rust
//! use walrus_core::LinearSmoothedParam;
//!
//! let mut feedback = LinearSmoothedParam::with_config(0.0, 48000.0, 50.0);
//! feedback.set_target(0.5);
//! for _ in 0..2400 {
//!     feedback.advance();
//! }
//! assert_eq!(feedback.get(), 0.5);
//! ```

use libm::expf;

/// One-pole exponential smoother.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    /// 0 = frozen, 1 = instant.
    coeff: f32,
}

impl SmoothedParam {
    /// Creates an unsmoothed parameter: changes apply instantly.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
        }
    }

    /// Creates a parameter with a sample rate and time constant.
    ///
    /// Both are fixed for the life of the smoother; a rate change builds a
    /// new one.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        Self {
            coeff: smoothing_coeff(sample_rate, smoothing_time_ms),
            ..Self::new(initial)
        }
    }

    /// Sets the value to approach.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Sets target and current together.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True once within `1e-6` of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Jumps to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

}

/// `coeff = 1 - exp(-1 / (tau · fs))`; instant when either input is zero.
fn smoothing_coeff(sample_rate: f32, smoothing_time_ms: f32) -> f32 {
    let samples = smoothing_time_ms / 1000.0 * sample_rate;
    if samples > 0.0 && samples.is_finite() {
        1.0 - expf(-1.0 / samples)
    } else {
        1.0
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Constant-rate smoother with a fixed ramp length.
///
/// A new target starts a fresh ramp of `transition_time_ms` from wherever
/// the value currently is, so re-targeting mid-ramp never jumps.
///
/// # Invariants
///
/// - when `samples_remaining` reaches 0, `current == target` exactly
#[derive(Debug, Clone)]
pub struct LinearSmoothedParam {
    current: f32,
    target: f32,
    increment: f32,
    samples_remaining: u32,
    sample_rate: f32,
    transition_time_ms: f32,
}

impl LinearSmoothedParam {
    /// Creates a smoother with a 10 ms ramp at 48 kHz.
    pub fn new(initial: f32) -> Self {
        Self::with_config(initial, 48000.0, 10.0)
    }

    /// Creates a smoother with explicit sample rate and ramp length.
    pub fn with_config(initial: f32, sample_rate: f32, transition_time_ms: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            sample_rate,
            transition_time_ms,
        }
    }

    /// Starts a ramp towards `target`. Repeating the current target is a no-op.
    pub fn set_target(&mut self, target: f32) {
        if (target - self.target).abs() < 1e-9 {
            return;
        }
        self.target = target;

        let samples = self.ramp_samples();
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.samples_remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Sets target and current together, cancelling any ramp.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True when no ramp is running.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }

    /// Ends the ramp at the target.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    fn ramp_samples(&self) -> u32 {
        let samples = self.transition_time_ms / 1000.0 * self.sample_rate;
        if samples.is_finite() && samples > 0.0 {
            samples as u32
        } else {
            0
        }
    }
}

impl Default for LinearSmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_param_instant_when_unconfigured() {
        let mut param = SmoothedParam::new(1.0);
        param.set_target(0.5);
        assert_eq!(param.advance(), 0.5);
    }

    #[test]
    fn smoothed_param_one_time_constant() {
        let mut param = SmoothedParam::with_config(0.0, 48000.0, 10.0);
        param.set_target(1.0);
        for _ in 0..480 {
            param.advance();
        }
        let expected = 1.0 - expf(-1.0);
        assert!((param.get() - expected).abs() < 0.01, "got {}", param.get());
    }

    #[test]
    fn smoothed_param_zero_time_is_instant() {
        let mut param = SmoothedParam::with_config(0.0, 48000.0, 0.0);
        param.set_target(1.0);
        assert_eq!(param.advance(), 1.0);
    }

    #[test]
    fn smoothed_param_converges() {
        let mut param = SmoothedParam::with_config(0.0, 48000.0, 10.0);
        param.set_target(1.0);
        for _ in 0..4800 {
            param.advance();
        }
        assert!(param.is_settled());
    }

    #[test]
    fn linear_reaches_target_in_exact_time() {
        let mut param = LinearSmoothedParam::with_config(0.0, 1000.0, 10.0);
        param.set_target(1.0);
        for _ in 0..9 {
            param.advance();
        }
        assert!(!param.is_settled());
        param.advance();
        assert!(param.is_settled());
        assert_eq!(param.get(), 1.0);
    }

    #[test]
    fn linear_constant_rate() {
        let mut param = LinearSmoothedParam::with_config(0.0, 48000.0, 10.0);
        param.set_target(1.0);
        for _ in 0..240 {
            param.advance();
        }
        assert!((param.get() - 0.5).abs() < 1e-3, "got {}", param.get());
    }

    #[test]
    fn linear_retarget_restarts_from_current() {
        let mut param = LinearSmoothedParam::with_config(0.0, 1000.0, 10.0);
        param.set_target(1.0);
        for _ in 0..5 {
            param.advance();
        }
        let mid = param.get();
        param.set_target(0.0);
        let next = param.advance();
        assert!(next < mid && (mid - next) < 0.06, "{mid} -> {next}");
        for _ in 0..9 {
            param.advance();
        }
        assert_eq!(param.get(), 0.0);
    }

    #[test]
    fn linear_same_target_keeps_ramp() {
        let mut param = LinearSmoothedParam::with_config(0.0, 1000.0, 10.0);
        param.set_target(1.0);
        param.advance();
        param.set_target(1.0);
        for _ in 0..9 {
            param.advance();
        }
        assert!(param.is_settled());
    }

    #[test]
    fn linear_zero_sample_rate_is_instant() {
        let mut param = LinearSmoothedParam::with_config(0.0, 0.0, 10.0);
        param.set_target(0.7);
        assert_eq!(param.get(), 0.7);
    }
}
