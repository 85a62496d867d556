//! Short feedback-delay "room" applied after the tape stage.
//!
//! Not a real reverb: each channel has one 100 ms delay line read at two
//! fixed taps. The taps are averaged, darkened by a one-pole low-pass and fed
//! back at 0.6, giving a dense, quickly decaying ambience.
//!
//! ```text
//! x ──┬───────────────────────────────(dry)──┐
//!     │                                      ├─ mix(level) ─▶ y
//!     └─▶(+)─▶[ delay 100 ms ]─┬─ early ─┐   │
//!         ▲                    └─ late ──┴─▶ ½ ─▶ LPF ─┬─(wet)
//!         └────────────── × 0.6 ───────────────────────┘
//! ```

use walrus_core::{
    DelayError, DelayLine, Effect, LinearSmoothedParam, OnePole, flush_denormal, linear_to_db,
    wet_dry_mix,
};

/// Capacity of each reverb delay line.
pub const REVERB_CAPACITY_SECONDS: f32 = 0.1;
/// Early tap, about 80 samples at 44.1 kHz.
pub const EARLY_TAP_SECONDS: f32 = 0.001_814;
/// Late tap.
pub const LATE_TAP_SECONDS: f32 = 0.05;
/// Loop gain of the reverb tap.
pub const REVERB_FEEDBACK: f32 = 0.6;
/// Damping low-pass cutoff.
pub const DAMPING_HZ: f32 = 2000.0;
/// Level glide time.
pub const LEVEL_SMOOTHING_MS: f32 = 50.0;

/// Stereo reverb tap.
#[derive(Debug, Clone)]
pub struct ReverbTap {
    lines: [DelayLine; 2],
    damping: [OnePole; 2],
    early_tap: f32,
    late_tap: f32,
    level: LinearSmoothedParam,
}

impl ReverbTap {
    /// Allocates both delay lines for `sample_rate`.
    pub fn new(sample_rate: f32, level: f32) -> Result<Self, DelayError> {
        let line = DelayLine::for_duration(sample_rate, REVERB_CAPACITY_SECONDS)?;
        Ok(Self {
            lines: [line.clone(), line],
            damping: [
                OnePole::new(sample_rate, DAMPING_HZ),
                OnePole::new(sample_rate, DAMPING_HZ),
            ],
            early_tap: EARLY_TAP_SECONDS * sample_rate,
            late_tap: LATE_TAP_SECONDS * sample_rate,
            level: LinearSmoothedParam::with_config(
                clamp_level(level),
                sample_rate,
                LEVEL_SMOOTHING_MS,
            ),
        })
    }

    /// Sets the wet level to glide towards, clamped to `[0, 1]`.
    pub fn set_level_target(&mut self, level: f32) {
        self.level.set_target(clamp_level(level));
    }

    /// Level currently in effect.
    pub fn level(&self) -> f32 {
        self.level.get()
    }

    /// Tap positions in samples, `(early, late)`.
    pub fn tap_samples(&self) -> (f32, f32) {
        (self.early_tap, self.late_tap)
    }

    /// Time for the loop to decay by 60 dB, measured on the late tap.
    pub fn decay_seconds() -> f32 {
        LATE_TAP_SECONDS * (-60.0 / linear_to_db(REVERB_FEEDBACK))
    }

    #[inline]
    fn process_channel(&mut self, ch: usize, input: f32, level: f32) -> f32 {
        // A non-finite sample would otherwise stay in the loop forever.
        let input = if input.is_finite() { input } else { 0.0 };
        let early = self.lines[ch].read(self.early_tap);
        let late = self.lines[ch].read(self.late_tap);
        let wet = self.damping[ch].process(0.5 * (early + late));
        self.lines[ch].write(flush_denormal(input + wet * REVERB_FEEDBACK));
        wet_dry_mix(input, wet, level)
    }
}

impl Effect for ReverbTap {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let level = self.level.advance();
        (
            self.process_channel(0, left, level),
            self.process_channel(1, right, level),
        )
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        for lp in &mut self.damping {
            lp.reset();
        }
        self.level.snap_to_target();
    }

    fn tail_seconds(&self) -> f32 {
        Self::decay_seconds()
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 }
}
