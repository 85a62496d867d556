//! Stereo processing stage trait.
//!
//! Stages of the tape delay that run after the main loop (reverb tap, tape
//! character) implement [`Effect`] so the orchestrator can run them over a
//! block uniformly.
//!
//! - **Stereo frames**: a stage sees one `(left, right)` frame per call and
//!   keeps per-channel state internally.
//! - **Object-safe**: `dyn Effect` works, though the orchestrator uses static
//!   dispatch.
//! - **Fixed sample rate**: stages are built for one rate; a rate change
//!   rebuilds them.
//! - **No allocations**: every method may be called from the audio thread.

/// A stereo audio stage.
///
/// # Example
///
/// ```rust
/// use walrus_core::Effect;
///
/// struct Swap;
///
/// impl Effect for Swap {
///     fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
///         (right, left)
///     }
///     fn reset(&mut self) {}
/// }
///
/// let mut l = [1.0, 0.0];
/// let mut r = [0.0, 1.0];
/// Swap.process_block_stereo(&mut l, &mut r);
/// assert_eq!(l, [0.0, 1.0]);
/// ```
pub trait Effect {
    /// Processes one stereo frame.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Processes two equal-length buffers in place.
    ///
    /// Frames beyond the shorter buffer are left untouched.
    fn process_block_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len(), "channel buffers differ in length");
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (ol, or) = self.process_stereo(*l, *r);
            *l = ol;
            *r = or;
        }
    }

    /// Clears internal state without changing settings.
    fn reset(&mut self);

    /// Latency in samples. Zero for every stage here.
    fn latency_samples(&self) -> usize {
        0
    }

    /// Seconds of output after the input goes silent.
    fn tail_seconds(&self) -> f32 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain(f32);

    impl Effect for Gain {
        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (left * self.0, right * self.0)
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn test_block_default_processes_every_frame() {
        let mut g = Gain(2.0);
        let mut l = [1.0, 2.0, 3.0];
        let mut r = [-1.0, -2.0, -3.0];
        g.process_block_stereo(&mut l, &mut r);
        assert_eq!(l, [2.0, 4.0, 6.0]);
        assert_eq!(r, [-2.0, -4.0, -6.0]);
    }

    #[test]
    fn test_defaults() {
        let g = Gain(1.0);
        assert_eq!(g.latency_samples(), 0);
        assert_eq!(g.tail_seconds(), 0.0);
    }

    #[test]
    fn test_object_safe() {
        let mut g = Gain(0.5);
        let stage: &mut dyn Effect = &mut g;
        assert_eq!(stage.process_stereo(1.0, 1.0), (0.5, 0.5));
    }
}
