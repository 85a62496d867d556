//! Walrus Core - DSP primitives for the walrus tape delay
//!
//! Everything here is allocation-free after construction and safe to call
//! from a real-time audio callback.
//!
//! # Building blocks
//!
//! - [`DelayLine`] - power-of-two circular buffer with linear interpolation
//! - [`OnePole`] / [`Biquad`] - low-pass filters for the feedback path
//! - [`ModulationOscillator`] - sine source for wow and flutter
//! - [`LinearSmoothedParam`] / [`SmoothedParam`] - zipper-free control ramps
//! - [`Effect`] - stereo stage trait
//! - Waveshapers: [`exp_soft_clip`], [`tube_warmth`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! walrus-core = { version = "0.1", default-features = false }
//! ```
//!
//! The optional `tracing` feature logs buffer allocation. Nothing is logged
//! from per-sample code.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod delay;
pub mod effect;
pub mod math;
pub mod one_pole;
pub mod oscillator;
pub mod param;

pub use biquad::{Biquad, lowpass_coefficients};
pub use delay::{DelayError, DelayLine, MAX_DELAY_LINE_LEN};
pub use effect::Effect;
pub use math::{
    SHAPER_CEILING, db_to_linear, exp_soft_clip, flush_denormal, linear_to_db, ms_to_samples,
    tube_warmth, wet_dry_mix,
};
pub use one_pole::OnePole;
pub use oscillator::{ModulationOscillator, modulation_factor};
pub use param::{LinearSmoothedParam, SmoothedParam};
