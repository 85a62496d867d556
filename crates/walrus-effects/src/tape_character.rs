//! Alternate "psychedelic" tape character, applied after the reverb stage.
//!
//! Adds a very low hiss floor, gentle `tanh` compression and a slow 0.5 Hz
//! amplitude wobble. The effect is cross-faded in and out with an
//! exponential smoother so toggling it does not click.

use libm::tanhf;
use walrus_core::{Effect, ModulationOscillator, SmoothedParam, db_to_linear};

/// Hiss level: ±1e-4 peak.
pub const HISS_DB: f32 = -80.0;
/// Input gain into the `tanh` compressor; output is divided by the same.
pub const COMPRESSION_DRIVE: f32 = 0.8;
/// Amplitude wobble rate.
pub const WOBBLE_HZ: f32 = 0.5;
/// Amplitude wobble depth (±0.2 %).
pub const WOBBLE_DEPTH: f32 = 0.002;
/// Enable/disable cross-fade time constant.
pub const BLEND_SMOOTHING_MS: f32 = 20.0;

const DEFAULT_SEED: u32 = 0x9E37_79B9;

/// Post-stage tape character.
#[derive(Debug, Clone)]
pub struct TapeCharacter {
    rng: u32,
    hiss: f32,
    wobble: ModulationOscillator,
    blend: SmoothedParam,
}

impl TapeCharacter {
    /// Creates a disabled stage.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            rng: DEFAULT_SEED,
            hiss: db_to_linear(HISS_DB),
            wobble: ModulationOscillator::new(sample_rate, WOBBLE_HZ),
            blend: SmoothedParam::with_config(0.0, sample_rate, BLEND_SMOOTHING_MS),
        }
    }

    /// Fades the character in or out.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.blend.set_target(if enabled { 1.0 } else { 0.0 });
    }

    /// True while the stage contributes anything to the output.
    pub fn is_active(&self) -> bool {
        self.blend.target() > 0.0 || !self.blend.is_settled()
    }

    /// Uniform noise in `[-hiss, hiss)` from a xorshift32 generator.
    #[inline]
    fn next_noise(&mut self) -> f32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        let unit = (x >> 8) as f32 / 16_777_216.0;
        (unit * 2.0 - 1.0) * self.hiss
    }

    #[inline]
    fn shape(&mut self, x: f32, wobble: f32) -> f32 {
        let noisy = x + self.next_noise();
        tanhf(noisy * COMPRESSION_DRIVE) / COMPRESSION_DRIVE * wobble
    }
}

impl Effect for TapeCharacter {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let blend = self.blend.advance();
        let wobble = 1.0 + self.wobble.next() * WOBBLE_DEPTH;
        let l = self.shape(left, wobble);
        let r = self.shape(right, wobble);
        (left + (l - left) * blend, right + (r - right) * blend)
    }

    fn process_block_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process_stereo(*l, *r);
        }
        if self.blend.is_settled() {
            self.blend.snap_to_target();
        }
    }

    fn reset(&mut self) {
        self.rng = DEFAULT_SEED;
        self.wobble.reset();
        self.blend.snap_to_target();
    }
}
