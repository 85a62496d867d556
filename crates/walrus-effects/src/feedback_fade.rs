//! Silence-triggered fade of the feedback loop.
//!
//! When the dry input has been silent for longer than the hold time, the
//! loop gain ramps to zero over 200 ms so the repeats die out instead of
//! circulating forever. The first non-silent input sample ramps it back up.

use walrus_core::LinearSmoothedParam;

/// Fade behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackFadeSettings {
    /// Inputs with `|x|` below this count as silent.
    pub threshold: f32,
    /// Consecutive silent samples tolerated before fading.
    pub hold_samples: u32,
    /// Length of the gain ramp in ms.
    pub fade_ms: f32,
}

impl Default for FeedbackFadeSettings {
    fn default() -> Self {
        Self {
            threshold: 1.0e-5,
            hold_samples: 100,
            fade_ms: 200.0,
        }
    }
}

/// Per-channel fade envelope.
#[derive(Debug, Clone)]
pub struct FeedbackFade {
    settings: FeedbackFadeSettings,
    silent_samples: u32,
    gain: LinearSmoothedParam,
}

impl FeedbackFade {
    /// Creates an envelope at full gain.
    pub fn new(sample_rate: f32, settings: FeedbackFadeSettings) -> Self {
        Self {
            settings,
            silent_samples: 0,
            gain: LinearSmoothedParam::with_config(1.0, sample_rate, settings.fade_ms),
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &FeedbackFadeSettings {
        &self.settings
    }

    /// Feeds one dry input sample and returns the loop gain to apply.
    #[inline]
    pub fn process(&mut self, dry: f32) -> f32 {
        if dry.abs() < self.settings.threshold {
            self.silent_samples = self.silent_samples.saturating_add(1);
            if self.silent_samples > self.settings.hold_samples {
                self.gain.set_target(0.0);
            }
        } else {
            self.silent_samples = 0;
            self.gain.set_target(1.0);
        }
        self.gain.advance()
    }

    /// Current gain without advancing.
    pub fn gain(&self) -> f32 {
        self.gain.get()
    }

    /// Back to full gain with a cleared counter.
    pub fn reset(&mut self) {
        self.silent_samples = 0;
        self.gain.set_immediate(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    #[test]
    fn holds_then_fades() {
        let mut fade = FeedbackFade::new(SR, FeedbackFadeSettings::default());
        for _ in 0..100 {
            assert_eq!(fade.process(0.0), 1.0);
        }
        // The 101st silent sample exceeds the hold; the ramp starts.
        assert!(fade.process(0.0) < 1.0);
        for _ in 0..9600 {
            fade.process(0.0);
        }
        assert_eq!(fade.gain(), 0.0);
    }

    #[test]
    fn signal_restores_gain() {
        let mut fade = FeedbackFade::new(SR, FeedbackFadeSettings::default());
        for _ in 0..20000 {
            fade.process(0.0);
        }
        assert_eq!(fade.gain(), 0.0);
        let first = fade.process(0.5);
        assert!(first > 0.0 && first < 0.01);
        for _ in 0..9600 {
            fade.process(0.5);
        }
        assert_eq!(fade.gain(), 1.0);
    }

    #[test]
    fn quiet_but_audible_input_is_not_silence() {
        let mut fade = FeedbackFade::new(SR, FeedbackFadeSettings::default());
        for _ in 0..10000 {
            assert_eq!(fade.process(2.0e-5), 1.0);
        }
    }

    #[test]
    fn reset_restores_full_gain() {
        let mut fade = FeedbackFade::new(SR, FeedbackFadeSettings::default());
        for _ in 0..5000 {
            fade.process(0.0);
        }
        fade.reset();
        assert_eq!(fade.gain(), 1.0);
        assert_eq!(fade.process(0.0), 1.0);
    }
}
