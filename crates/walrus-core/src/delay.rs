//! Fractional delay line for tape-style echo and short reverb taps.
//!
//! A power-of-two circular buffer with a masked write cursor and linear
//! interpolation between neighbouring samples. The buffer is sized once,
//! outside the audio callback, and never reallocates afterwards.
//!
//! # Call order
//!
//! Per sample, read first and write second:
//!
//! ```rust
//! use walrus_core::DelayLine;
//!
//! let mut line = DelayLine::new(8);
//! line.write(1.0);
//! for _ in 0..2 {
//!     line.write(0.0);
//! }
//! // The impulse was written three writes ago.
//! assert_eq!(line.read(3.0), 1.0);
//! ```
//!
//! With this ordering an impulse written at time `t` is returned by
//! `read(d)` at time `t + d`, which is what a feedback loop needs.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use libm::ceilf;

/// Largest buffer a delay line will allocate (2^24 samples).
///
/// At 192 kHz this still covers more than 80 seconds.
pub const MAX_DELAY_LINE_LEN: usize = 1 << 24;

/// Reasons a delay line cannot be sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayError {
    /// Sample rate is zero, negative or not finite.
    InvalidSampleRate(f32),
    /// Maximum delay time is negative or not finite.
    InvalidDuration(f32),
    /// The requested capacity exceeds [`MAX_DELAY_LINE_LEN`].
    TooLarge {
        /// Samples that were requested.
        requested: usize,
    },
}

impl core::fmt::Display for DelayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSampleRate(sr) => write!(f, "invalid sample rate: {sr}"),
            Self::InvalidDuration(s) => write!(f, "invalid maximum delay: {s} s"),
            Self::TooLarge { requested } => write!(
                f,
                "delay buffer of {requested} samples exceeds the limit of {MAX_DELAY_LINE_LEN}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DelayError {}

/// Power-of-two circular delay line with linear interpolation.
///
/// # Invariants
///
/// - `buffer.len()` is a power of two and never changes after construction
/// - `write_pos < buffer.len()`
/// - reads are clamped to `[0, len - 1]` samples, so they never leave the buffer
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    mask: usize,
}

impl DelayLine {
    /// Creates a delay line able to hold at least `min_delay_samples` of delay.
    ///
    /// The buffer length is the next power of two above `min_delay_samples`,
    /// so `read(min_delay_samples)` is always in range.
    ///
    /// # Panics
    ///
    /// Panics if the rounded length would exceed [`MAX_DELAY_LINE_LEN`].
    /// Use [`for_duration`](Self::for_duration) for a fallible constructor.
    pub fn new(min_delay_samples: usize) -> Self {
        match Self::try_new(min_delay_samples) {
            Ok(line) => line,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible form of [`new`](Self::new).
    pub fn try_new(min_delay_samples: usize) -> Result<Self, DelayError> {
        let len = min_delay_samples
            .checked_add(1)
            .and_then(usize::checked_next_power_of_two)
            .filter(|&len| len <= MAX_DELAY_LINE_LEN)
            .ok_or(DelayError::TooLarge {
                requested: min_delay_samples,
            })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(requested = min_delay_samples, len, "delay line allocated");

        Ok(Self {
            buffer: vec![0.0; len],
            write_pos: 0,
            mask: len - 1,
        })
    }

    /// Creates a delay line covering `max_seconds` at `sample_rate`.
    pub fn for_duration(sample_rate: f32, max_seconds: f32) -> Result<Self, DelayError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(DelayError::InvalidSampleRate(sample_rate));
        }
        if !max_seconds.is_finite() || max_seconds < 0.0 {
            return Err(DelayError::InvalidDuration(max_seconds));
        }
        let samples = ceilf(sample_rate * max_seconds);
        if samples >= MAX_DELAY_LINE_LEN as f32 {
            return Err(DelayError::TooLarge {
                requested: samples as usize,
            });
        }
        Self::try_new(samples as usize)
    }

    /// Reads the signal `delay_samples` behind the write cursor.
    ///
    /// The delay is clamped to `[0, len - 1]`; a non-finite delay reads at 0.
    /// Fractional delays blend the two neighbouring samples linearly:
    /// `(1 - f) * buf[w - d] + f * buf[w - d - 1]`.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let max = self.mask as f32;
        let delay = if delay_samples.is_finite() {
            delay_samples.clamp(0.0, max)
        } else {
            0.0
        };

        let delay_int = delay as usize;
        let frac = delay - delay_int as f32;

        let i0 = self.write_pos.wrapping_sub(delay_int) & self.mask;
        let i1 = i0.wrapping_sub(1) & self.mask;

        let a = self.buffer[i0];
        let b = self.buffer[i1];
        a + (b - a) * frac
    }

    /// Stores one sample at the cursor and advances it.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) & self.mask;
    }

    /// Zeroes the buffer and rewinds the cursor. Does not reallocate.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Buffer length in samples (always a power of two).
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always false; a delay line holds at least two samples.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Longest readable delay in samples (`len - 1`).
    pub fn max_delay(&self) -> usize {
        self.mask
    }

    /// Current write cursor.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }
}
