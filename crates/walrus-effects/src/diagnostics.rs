//! Counters for the rare recovery paths.
//!
//! The audio thread never logs. Instead, every local recovery bumps a
//! saturating counter which a non-real-time caller can read and clear.

/// Recovery counters for one [`TapeDelay`](crate::TapeDelay) instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Feedback filter outputs that were NaN/Inf and forced a filter reset.
    pub non_finite_resets: u32,
    /// Snapshot values that were outside their legal range.
    pub clamped_controls: u32,
    /// Loop-input or output samples that were clamped to `[-1, 1]` or
    /// replaced because they were not finite.
    pub clamped_samples: u32,
}

impl Diagnostics {
    /// True when no recovery has happened since the last clear.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    #[inline]
    pub(crate) fn add_non_finite_resets(&mut self, n: u32) {
        self.non_finite_resets = self.non_finite_resets.saturating_add(n);
    }

    #[inline]
    pub(crate) fn add_clamped_controls(&mut self, n: u32) {
        self.clamped_controls = self.clamped_controls.saturating_add(n);
    }

    #[inline]
    pub(crate) fn add_clamped_samples(&mut self, n: u32) {
        self.clamped_samples = self.clamped_samples.saturating_add(n);
    }
}
