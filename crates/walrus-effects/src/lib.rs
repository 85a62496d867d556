//! Walrus Effects - the stereo tape delay processor
//!
//! Built on walrus-core primitives:
//!
//! - [`TapeDelay`] - block orchestrator: wow/flutter modulated delay,
//!   filtered and saturated feedback, silence fade, reverb tap
//! - [`ControlSnapshot`] / [`SharedControls`] - per-block controls and their
//!   lock-free cross-thread store
//! - [`FeedbackFilter`], [`FeedbackFade`], [`Saturator`], [`ReverbTap`],
//!   [`TapeCharacter`] - the individual stages
//! - [`Diagnostics`] - counters for the rare recovery paths
//!
//! ## Example
//!
//! ```rust
//! use walrus_effects::{ControlSnapshot, PrepareSpec, TapeDelay, TapeDelayConfig};
//!
//! let mut delay = TapeDelay::new(PrepareSpec::new(44100.0, 512), TapeDelayConfig::default())?;
//! let controls = ControlSnapshot::default();
//!
//! let mut left = [0.0f32; 512];
//! let mut right = [0.0f32; 512];
//! delay.process_block(&mut left, &mut right, &controls);
//! # Ok::<(), walrus_effects::ConfigureError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod controls;
pub mod diagnostics;
pub mod feedback_fade;
pub mod feedback_filter;
pub mod reverb_tap;
pub mod saturation;
pub mod tape_character;
pub mod tape_delay;

pub use controls::{
    CONTINUOUS_CONTROL_COUNT, CONTROL_COUNT, ControlDescriptor, ControlId, ControlSnapshot,
    ControlUnit, SharedControls, TOGGLE_CONTROL_COUNT,
};
pub use diagnostics::Diagnostics;
pub use feedback_fade::{FeedbackFade, FeedbackFadeSettings};
pub use feedback_filter::{FeedbackFilter, FilterKind, clamp_cutoff};
pub use reverb_tap::ReverbTap;
pub use saturation::{SaturationMode, Saturator};
pub use tape_character::TapeCharacter;
pub use tape_delay::{
    ConfigureError, DEFAULT_MAX_DELAY_SECONDS, MAX_BLOCK_SIZE, PrepareSpec, TapeChannel,
    TapeDelay, TapeDelayConfig,
};
