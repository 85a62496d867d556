//! Saturation inside the feedback loop.
//!
//! Two curves, chosen once per block:
//!
//! - [`SaturationMode::Soft`]: `exp_soft_clip(x · (1 + 0.5·amount))`
//! - [`SaturationMode::Tube`]: `tube_warmth(x, 1.5·amount)`
//!
//! The shaped signal is blended with the clean one by `amount`, so an
//! amount of 0 leaves the loop linear.

use walrus_core::{exp_soft_clip, tube_warmth};

/// Waveshaping curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaturationMode {
    /// Exponential soft clip.
    #[default]
    Soft,
    /// Tube-style warmth with a steeper knee.
    Tube,
}

/// Saturation strategy for one block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Saturator {
    mode: SaturationMode,
    amount: f32,
}

impl Saturator {
    /// Creates a saturator; `amount` is clamped to `[0, 1]`.
    pub fn new(mode: SaturationMode, amount: f32) -> Self {
        let mut sat = Self::default();
        sat.set(mode, amount);
        sat
    }

    /// Updates mode and amount.
    pub fn set(&mut self, mode: SaturationMode, amount: f32) {
        self.mode = mode;
        self.amount = if amount.is_finite() { amount.clamp(0.0, 1.0) } else { 0.0 };
    }

    /// Current curve.
    pub fn mode(&self) -> SaturationMode {
        self.mode
    }

    /// Current amount.
    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Shapes one sample.
    #[inline]
    pub fn process(&self, x: f32) -> f32 {
        if self.amount == 0.0 {
            return x;
        }
        let shaped = match self.mode {
            SaturationMode::Soft => exp_soft_clip(x * (1.0 + 0.5 * self.amount)),
            SaturationMode::Tube => tube_warmth(x, 1.5 * self.amount),
        };
        x + (shaped - x) * self.amount
    }
}
