//! The tape delay processor.
//!
//! [`TapeDelay`] owns two [`TapeChannel`]s, the shared control smoothers, the
//! reverb tap and the tape character stage. One call to
//! [`process_block`](TapeDelay::process_block) runs, in order:
//!
//! 1. apply the control snapshot (clamp, retarget smoothers, pick the
//!    saturation curve)
//! 2. tape pass: per frame, advance the shared smoothers once, then per
//!    channel modulate → read → filter → saturate → fade → write → mix
//! 3. reverb pass over the tape output
//! 4. tape character pass while it is enabled or fading out
//! 5. clamp every output sample to `[-1, 1]`, replacing non-finite values
//!
//! Switching the tape or reverb stage cross-fades it against its input over
//! [`STAGE_FADE_MS`]. Once both stages are off and faded out the block is left
//! untouched.
//!
//! # Example
//!
//! ```rust
//! use walrus_effects::{ControlSnapshot, PrepareSpec, TapeDelay, TapeDelayConfig};
//!
//! let mut delay = TapeDelay::new(PrepareSpec::new(48000.0, 256), TapeDelayConfig::default())
//!     .unwrap();
//! let controls = ControlSnapshot { delay_time_ms: 250.0, ..ControlSnapshot::default() };
//!
//! let mut left = vec![0.0; 256];
//! let mut right = vec![0.0; 256];
//! left[0] = 1.0;
//! delay.process_block(&mut left, &mut right, &controls);
//! assert!(left.iter().all(|s| s.is_finite()));
//! ```

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

use walrus_core::{
    DelayError, DelayLine, Effect, LinearSmoothedParam, MAX_DELAY_LINE_LEN, ModulationOscillator,
    flush_denormal, linear_to_db, modulation_factor, ms_to_samples, wet_dry_mix,
};

use crate::controls::{ControlId, ControlSnapshot};
use crate::diagnostics::Diagnostics;
use crate::feedback_fade::{FeedbackFade, FeedbackFadeSettings};
use crate::feedback_filter::{FeedbackFilter, FilterKind};
use crate::reverb_tap::ReverbTap;
use crate::saturation::{SaturationMode, Saturator};
use crate::tape_character::TapeCharacter;

/// Default longest delay in seconds.
pub const DEFAULT_MAX_DELAY_SECONDS: f32 = 3.0;
/// Largest accepted block size.
pub const MAX_BLOCK_SIZE: usize = 1 << 16;
/// Shortest delay time the loop will use, in ms.
pub const MIN_DELAY_MS: f32 = 1.0;
/// Glide time for delay time and dry/wet.
pub const FAST_SMOOTHING_MS: f32 = 5.0;
/// Glide time for feedback.
pub const SLOW_SMOOTHING_MS: f32 = 50.0;
/// Filter cutoff multiplier in psychedelic mode.
pub const PSYCHEDELIC_CUTOFF_SCALE: f32 = 1.5;
/// Reverb level multiplier in psychedelic mode (result clamped to 1).
pub const PSYCHEDELIC_REVERB_SCALE: f32 = 1.2;
/// Cross-fade length when the tape or reverb stage is switched on or off.
pub const STAGE_FADE_MS: f32 = 10.0;
/// The flutter sine runs this many cycles per period of the flutter rate.
pub const FLUTTER_SPEED: f32 = 2.0;

/// Audio configuration passed to [`TapeDelay::prepare`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrepareSpec {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Largest block the host will deliver.
    pub max_block_size: usize,
    /// Longest delay the loop must support.
    pub max_delay_seconds: f32,
}

impl PrepareSpec {
    /// Spec with the default 3 s maximum delay.
    pub fn new(sample_rate: f32, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            max_delay_seconds: DEFAULT_MAX_DELAY_SECONDS,
        }
    }

    /// Overrides the maximum delay.
    pub fn with_max_delay_seconds(mut self, seconds: f32) -> Self {
        self.max_delay_seconds = seconds;
        self
    }

    /// Checks every field without allocating.
    pub fn validate(&self) -> Result<(), ConfigureError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigureError::InvalidSampleRate(self.sample_rate));
        }
        if !self.max_delay_seconds.is_finite() || self.max_delay_seconds <= 0.0 {
            return Err(ConfigureError::InvalidMaxDelay(self.max_delay_seconds));
        }
        if self.max_block_size == 0 || self.max_block_size > MAX_BLOCK_SIZE {
            return Err(ConfigureError::InvalidBlockSize(self.max_block_size));
        }
        let samples = libm::ceilf(self.sample_rate * self.max_delay_seconds);
        if samples >= MAX_DELAY_LINE_LEN as f32 {
            return Err(ConfigureError::BufferTooLarge {
                requested: samples as usize,
            });
        }
        Ok(())
    }
}

/// Fixed engine options chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapeDelayConfig {
    /// Feedback filter topology.
    pub filter_kind: FilterKind,
    /// Silence-triggered fade; `None` keeps the loop gain at 1.
    pub feedback_fade: Option<FeedbackFadeSettings>,
}

impl Default for TapeDelayConfig {
    fn default() -> Self {
        Self {
            filter_kind: FilterKind::OnePole,
            feedback_fade: Some(FeedbackFadeSettings::default()),
        }
    }
}

/// Reasons [`TapeDelay::prepare`] can fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigureError {
    /// Sample rate is zero, negative or not finite.
    InvalidSampleRate(f32),
    /// Maximum delay is zero, negative or not finite.
    InvalidMaxDelay(f32),
    /// Block size is zero or above [`MAX_BLOCK_SIZE`].
    InvalidBlockSize(usize),
    /// The delay buffer would exceed [`MAX_DELAY_LINE_LEN`].
    BufferTooLarge {
        /// Samples that were requested.
        requested: usize,
    },
}

impl core::fmt::Display for ConfigureError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSampleRate(sr) => write!(f, "invalid sample rate: {sr}"),
            Self::InvalidMaxDelay(s) => write!(f, "invalid maximum delay: {s} s"),
            Self::InvalidBlockSize(n) => {
                write!(f, "invalid block size {n} (must be 1..={MAX_BLOCK_SIZE})")
            }
            Self::BufferTooLarge { requested } => write!(
                f,
                "delay buffer of {requested} samples exceeds the limit of {MAX_DELAY_LINE_LEN}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigureError {}

impl From<DelayError> for ConfigureError {
    fn from(e: DelayError) -> Self {
        match e {
            DelayError::InvalidSampleRate(sr) => Self::InvalidSampleRate(sr),
            DelayError::InvalidDuration(s) => Self::InvalidMaxDelay(s),
            DelayError::TooLarge { requested } => Self::BufferTooLarge { requested },
        }
    }
}

/// Values shared by both channels for one frame.
#[derive(Debug, Clone, Copy)]
struct FrameParams {
    delay_ms: f32,
    feedback: f32,
    mix: f32,
    wow_depth: f32,
    flutter_depth: f32,
}

/// One channel of the tape loop. Channels never read each other's state.
#[derive(Debug, Clone)]
pub struct TapeChannel {
    line: DelayLine,
    filter: FeedbackFilter,
    wow: ModulationOscillator,
    flutter: ModulationOscillator,
    fade: Option<FeedbackFade>,
}

impl TapeChannel {
    fn new(
        line: DelayLine,
        sample_rate: f32,
        config: &TapeDelayConfig,
        controls: &ControlSnapshot,
    ) -> Self {
        Self {
            line,
            filter: FeedbackFilter::new(sample_rate, config.filter_kind, controls.filter_cutoff_hz),
            wow: ModulationOscillator::new(sample_rate, controls.wow_rate_hz),
            flutter: ModulationOscillator::new(
                sample_rate,
                controls.flutter_rate_hz * FLUTTER_SPEED,
            ),
            fade: config
                .feedback_fade
                .map(|settings| FeedbackFade::new(sample_rate, settings)),
        }
    }

    /// Runs one sample through the loop. Returns the mixed output and
    /// whether the loop input had to be clamped.
    #[inline]
    fn process(
        &mut self,
        input: f32,
        frame: &FrameParams,
        saturator: &Saturator,
        sample_rate: f32,
        max_delay_ms: f32,
    ) -> (f32, bool) {
        let factor = modulation_factor(
            self.wow.next(),
            frame.wow_depth,
            self.flutter.next(),
            frame.flutter_depth,
        );
        let delay_ms = (frame.delay_ms * factor).clamp(MIN_DELAY_MS, max_delay_ms);

        let readback = self.line.read(ms_to_samples(delay_ms, sample_rate));
        let shaped = saturator.process(self.filter.process(readback));
        let gain = match &mut self.fade {
            Some(fade) => fade.process(input),
            None => 1.0,
        };

        let loop_in = input + shaped * frame.feedback * gain;
        let (written, clamped) = clamp_sample(loop_in);
        self.line.write(flush_denormal(written));

        (wet_dry_mix(input, shaped, frame.mix), clamped)
    }

    /// The channel's delay line.
    pub fn delay_line(&self) -> &DelayLine {
        &self.line
    }

    /// The channel's feedback filter.
    pub fn filter(&self) -> &FeedbackFilter {
        &self.filter
    }

    /// Current feedback fade gain (1.0 when the fade is disabled).
    pub fn fade_gain(&self) -> f32 {
        self.fade.as_ref().map_or(1.0, FeedbackFade::gain)
    }

    fn reset(&mut self) {
        self.line.clear();
        self.filter.reset();
        self.wow.reset();
        self.flutter.reset();
        if let Some(fade) = &mut self.fade {
            fade.reset();
        }
    }
}

/// Everything that exists only between `prepare` and `release`.
#[derive(Debug, Clone)]
struct Engine {
    sample_rate: f32,
    max_delay_ms: f32,
    channels: [TapeChannel; 2],
    delay_ms: LinearSmoothedParam,
    feedback: LinearSmoothedParam,
    mix: LinearSmoothedParam,
    saturator: Saturator,
    tape_gate: LinearSmoothedParam,
    reverb_gate: LinearSmoothedParam,
    reverb: ReverbTap,
    character: TapeCharacter,
}

impl Engine {
    fn new(
        spec: &PrepareSpec,
        config: &TapeDelayConfig,
        controls: &ControlSnapshot,
    ) -> Result<Self, ConfigureError> {
        let sr = spec.sample_rate;
        let line = DelayLine::for_duration(sr, spec.max_delay_seconds)?;
        let max_delay_ms = spec.max_delay_seconds * 1000.0;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate = sr,
            max_block_size = spec.max_block_size,
            delay_line_len = line.len(),
            "tape delay prepared"
        );

        let mut engine = Self {
            sample_rate: sr,
            max_delay_ms,
            channels: [
                TapeChannel::new(line.clone(), sr, config, controls),
                TapeChannel::new(line, sr, config, controls),
            ],
            delay_ms: LinearSmoothedParam::with_config(
                controls.delay_time_ms.min(max_delay_ms),
                sr,
                FAST_SMOOTHING_MS,
            ),
            feedback: LinearSmoothedParam::with_config(controls.feedback, sr, SLOW_SMOOTHING_MS),
            mix: LinearSmoothedParam::with_config(controls.dry_wet, sr, FAST_SMOOTHING_MS),
            saturator: Saturator::default(),
            tape_gate: LinearSmoothedParam::with_config(
                gate_target(controls.tape_enabled),
                sr,
                STAGE_FADE_MS,
            ),
            reverb_gate: LinearSmoothedParam::with_config(
                gate_target(controls.reverb_enabled),
                sr,
                STAGE_FADE_MS,
            ),
            reverb: ReverbTap::new(sr, controls.reverb_level)?,
            character: TapeCharacter::new(sr),
        };
        engine.apply(controls);
        engine.reset();
        Ok(engine)
    }

    /// Pushes already-clamped controls into the stages.
    fn apply(&mut self, c: &ControlSnapshot) {
        self.delay_ms.set_target(c.delay_time_ms.min(self.max_delay_ms));
        self.feedback.set_target(c.feedback);
        self.mix.set_target(c.dry_wet);
        self.tape_gate.set_target(gate_target(c.tape_enabled));
        self.reverb_gate.set_target(gate_target(c.reverb_enabled));

        let (cutoff, reverb_level, mode) = if c.psychedelic {
            (
                c.filter_cutoff_hz * PSYCHEDELIC_CUTOFF_SCALE,
                (c.reverb_level * PSYCHEDELIC_REVERB_SCALE).min(1.0),
                SaturationMode::Tube,
            )
        } else {
            (c.filter_cutoff_hz, c.reverb_level, SaturationMode::Soft)
        };

        for ch in &mut self.channels {
            ch.wow.set_frequency(c.wow_rate_hz);
            ch.flutter.set_frequency(c.flutter_rate_hz * FLUTTER_SPEED);
            ch.filter.set_cutoff_target(cutoff);
        }
        self.saturator.set(mode, c.saturation);
        self.reverb.set_level_target(reverb_level);
        self.character.set_enabled(c.psychedelic);
    }

    /// Ends every glide at its target.
    fn snap(&mut self) {
        self.delay_ms.snap_to_target();
        self.feedback.snap_to_target();
        self.mix.snap_to_target();
        self.tape_gate.snap_to_target();
        self.reverb_gate.snap_to_target();
        self.character.reset();
    }

    fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.reset();
        }
        self.reverb.reset();
        self.snap();
    }

    /// True while either stage is on or still fading out.
    fn is_audible(&self) -> bool {
        gate_open(&self.tape_gate) || gate_open(&self.reverb_gate)
    }

    /// Tape pass. Returns the number of clamped loop inputs.
    fn run_tape(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        wow_depth: f32,
        flutter_depth: f32,
    ) -> u32 {
        if !gate_open(&self.tape_gate) {
            return 0;
        }
        let mut clamped = 0u32;
        let sr = self.sample_rate;
        let max_ms = self.max_delay_ms;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let gate = self.tape_gate.advance();
            let frame = FrameParams {
                delay_ms: self.delay_ms.advance(),
                feedback: self.feedback.advance(),
                mix: self.mix.advance(),
                wow_depth,
                flutter_depth,
            };
            let [ch_l, ch_r] = &mut self.channels;
            let (out_l, cl) = ch_l.process(*l, &frame, &self.saturator, sr, max_ms);
            let (out_r, cr) = ch_r.process(*r, &frame, &self.saturator, sr, max_ms);
            *l = crossfade(*l, out_l, gate);
            *r = crossfade(*r, out_r, gate);
            clamped += u32::from(cl) + u32::from(cr);
        }
        clamped
    }

    /// Reverb pass, cross-faded against its input while the switch ramps.
    fn run_reverb(&mut self, left: &mut [f32], right: &mut [f32]) {
        if !gate_open(&self.reverb_gate) {
            return;
        }
        if self.reverb_gate.is_settled() {
            self.reverb.process_block_stereo(left, right);
            return;
        }
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let gate = self.reverb_gate.advance();
            let (wet_l, wet_r) = self.reverb.process_stereo(*l, *r);
            *l = crossfade(*l, wet_l, gate);
            *r = crossfade(*r, wet_r, gate);
        }
    }

    fn take_filter_resets(&mut self) -> u32 {
        self.channels
            .iter_mut()
            .map(|ch| ch.filter.take_non_finite_resets())
            .fold(0, u32::saturating_add)
    }
}

/// Stereo tape delay with wow, flutter, filtered and saturated feedback,
/// silence fade and a reverb tap.
///
/// # Lifecycle
///
/// [`new`](Self::new) / [`prepare`](Self::prepare) allocate;
/// [`process_block`](Self::process_block), [`set_controls`](Self::set_controls)
/// and [`reset`](Self::reset) never do. An unprepared instance (after a
/// failed `prepare` or after [`release`](Self::release)) outputs silence.
#[derive(Debug, Clone)]
pub struct TapeDelay {
    config: TapeDelayConfig,
    spec: PrepareSpec,
    controls: ControlSnapshot,
    engine: Option<Box<Engine>>,
    diagnostics: Diagnostics,
}

impl TapeDelay {
    /// Creates and prepares a processor with default controls.
    pub fn new(spec: PrepareSpec, config: TapeDelayConfig) -> Result<Self, ConfigureError> {
        let mut delay = Self::unprepared(config);
        delay.prepare(spec)?;
        Ok(delay)
    }

    /// Creates a processor without allocating audio buffers.
    pub fn unprepared(config: TapeDelayConfig) -> Self {
        Self {
            config,
            spec: PrepareSpec::new(48000.0, 512),
            controls: ControlSnapshot::default(),
            engine: None,
            diagnostics: Diagnostics::default(),
        }
    }

    /// (Re)allocates every buffer for `spec` and zeroes all state.
    ///
    /// Not real-time safe. On error the instance is left unprepared.
    pub fn prepare(&mut self, spec: PrepareSpec) -> Result<(), ConfigureError> {
        self.engine = None;
        spec.validate()?;
        let engine = Engine::new(&spec, &self.config, &self.controls)?;
        self.spec = spec;
        self.engine = Some(Box::new(engine));
        Ok(())
    }

    /// Frees the audio buffers. [`prepare`](Self::prepare) must be called
    /// again before audio is produced.
    pub fn release(&mut self) {
        self.engine = None;
    }

    /// True between a successful `prepare` and `release`.
    pub fn is_prepared(&self) -> bool {
        self.engine.is_some()
    }

    /// Last accepted configuration.
    pub fn spec(&self) -> &PrepareSpec {
        &self.spec
    }

    /// Engine options.
    pub fn config(&self) -> &TapeDelayConfig {
        &self.config
    }

    /// Controls currently targeted (already clamped).
    pub fn controls(&self) -> &ControlSnapshot {
        &self.controls
    }

    /// Clears delay, filter, envelope and reverb state and ends all glides.
    pub fn reset(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.reset();
        }
    }

    /// Accepts new control targets. Out-of-range values are clamped and
    /// counted; smoothed controls glide from their current value.
    pub fn set_controls(&mut self, snapshot: &ControlSnapshot) {
        let (mut controls, mut clamped) = snapshot.clamped();
        let max_delay_ms = self.spec.max_delay_seconds * 1000.0;
        if controls.delay_time_ms > max_delay_ms {
            controls.delay_time_ms = max_delay_ms.max(MIN_DELAY_MS);
            clamped += 1;
        }
        self.diagnostics.add_clamped_controls(clamped);
        self.controls = controls;
        if let Some(engine) = &mut self.engine {
            engine.apply(&controls);
        }
    }

    /// Processes one block in place.
    ///
    /// `left` and `right` must have equal length; extra samples in the
    /// longer buffer are left untouched.
    pub fn process_block(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        controls: &ControlSnapshot,
    ) {
        debug_assert_eq!(left.len(), right.len(), "channel buffers differ in length");
        let n = left.len().min(right.len());
        let (left, right) = (&mut left[..n], &mut right[..n]);

        self.set_controls(controls);
        let c = self.controls;

        let Some(engine) = self.engine.as_deref_mut() else {
            left.fill(0.0);
            right.fill(0.0);
            return;
        };

        if !engine.is_audible() {
            return;
        }

        let mut clamped = engine.run_tape(left, right, c.wow_depth, c.flutter_depth);
        engine.run_reverb(left, right);
        if engine.character.is_active() {
            engine.character.process_block_stereo(left, right);
        }

        for s in left.iter_mut().chain(right.iter_mut()) {
            let (out, was_clamped) = clamp_sample(*s);
            *s = out;
            clamped += u32::from(was_clamped);
        }

        let resets = engine.take_filter_resets();
        self.diagnostics.add_non_finite_resets(resets);
        self.diagnostics.add_clamped_samples(clamped);
    }

    /// Seconds of output after the input goes silent:
    /// `max_delay × max(1, repeats to −60 dB) + reverb decay`.
    pub fn tail_seconds(&self) -> f32 {
        let feedback = match &self.engine {
            Some(engine) => engine.feedback.target(),
            None => self.controls.feedback,
        };
        let repeats = if feedback > 0.0 {
            (-60.0 / linear_to_db(feedback)).max(1.0)
        } else {
            1.0
        };
        self.spec.max_delay_seconds * repeats + ReverbTap::decay_seconds()
    }

    /// Recovery counters since the last clear.
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Zeroes the recovery counters.
    pub fn clear_diagnostics(&mut self) {
        self.diagnostics = Diagnostics::default();
    }

    /// One of the two tape channels (0 = left), if prepared.
    pub fn channel(&self, index: usize) -> Option<&TapeChannel> {
        self.engine.as_ref().and_then(|e| e.channels.get(index))
    }

    /// Current value of one control as the processor sees it.
    pub fn control(&self, id: ControlId) -> f32 {
        self.controls.get(id)
    }
}

fn gate_target(enabled: bool) -> f32 {
    if enabled { 1.0 } else { 0.0 }
}

/// A stage runs while switched on or while its fade-out is unfinished.
#[inline]
fn gate_open(gate: &LinearSmoothedParam) -> bool {
    gate.target() > 0.0 || gate.get() > 0.0
}

/// Stage output at `gate`; the end points return `dry` or `wet` exactly.
#[inline]
fn crossfade(dry: f32, wet: f32, gate: f32) -> f32 {
    if gate >= 1.0 {
        wet
    } else if gate <= 0.0 {
        dry
    } else {
        wet_dry_mix(dry, wet, gate)
    }
}

/// Clamps to `[-1, 1]`; non-finite values become 0. Returns whether the
/// value changed.
#[inline]
fn clamp_sample(x: f32) -> (f32, bool) {
    if !x.is_finite() {
        (0.0, true)
    } else if x > 1.0 {
        (1.0, true)
    } else if x < -1.0 {
        (-1.0, true)
    } else {
        (x, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_controls() -> ControlSnapshot {
        ControlSnapshot {
            delay_time_ms: 10.0,
            feedback: 0.5,
            wow_depth: 0.0,
            flutter_depth: 0.0,
            dry_wet: 1.0,
            filter_cutoff_hz: 20000.0,
            saturation: 0.0,
            reverb_enabled: false,
            ..ControlSnapshot::default()
        }
    }

    #[test]
    fn prepare_validates_spec() {
        let cfg = TapeDelayConfig::default();
        assert_eq!(
            TapeDelay::new(PrepareSpec::new(0.0, 512), cfg).unwrap_err(),
            ConfigureError::InvalidSampleRate(0.0)
        );
        assert!(matches!(
            TapeDelay::new(PrepareSpec::new(48000.0, 0), cfg),
            Err(ConfigureError::InvalidBlockSize(0))
        ));
        assert!(matches!(
            TapeDelay::new(PrepareSpec::new(48000.0, 512).with_max_delay_seconds(-1.0), cfg),
            Err(ConfigureError::InvalidMaxDelay(_))
        ));
        assert!(matches!(
            TapeDelay::new(PrepareSpec::new(192000.0, 512).with_max_delay_seconds(1000.0), cfg),
            Err(ConfigureError::BufferTooLarge { .. })
        ));
    }

    #[test]
    fn failed_prepare_leaves_instance_silent() {
        let mut d =
            TapeDelay::new(PrepareSpec::new(48000.0, 64), TapeDelayConfig::default()).unwrap();
        assert!(d.is_prepared());
        assert!(d.prepare(PrepareSpec::new(f32::NAN, 64)).is_err());
        assert!(!d.is_prepared());

        let mut l = [0.5; 64];
        let mut r = [0.5; 64];
        d.process_block(&mut l, &mut r, &ControlSnapshot::default());
        assert!(l.iter().chain(r.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn release_then_prepare() {
        let mut d =
            TapeDelay::new(PrepareSpec::new(44100.0, 128), TapeDelayConfig::default()).unwrap();
        d.release();
        assert!(!d.is_prepared());
        d.prepare(PrepareSpec::new(96000.0, 128)).unwrap();
        assert!(d.is_prepared());
        assert_eq!(d.spec().sample_rate, 96000.0);
    }

    #[test]
    fn first_echo_arrives_on_time() {
        let cfg = TapeDelayConfig {
            feedback_fade: None,
            ..TapeDelayConfig::default()
        };
        let mut d = TapeDelay::new(PrepareSpec::new(48000.0, 1024), cfg).unwrap();
        let c = quiet_controls();
        d.set_controls(&c);
        d.reset();

        let mut l = vec![0.0; 1024];
        let mut r = vec![0.0; 1024];
        l[0] = 1.0;
        d.process_block(&mut l, &mut r, &c);

        // 10 ms at 48 kHz.
        let peak = l
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(480));
        assert!(r.iter().all(|&s| s == 0.0), "channels must not bleed");
    }

    #[test]
    fn both_stages_off_is_bit_transparent() {
        let mut d =
            TapeDelay::new(PrepareSpec::new(48000.0, 256), TapeDelayConfig::default()).unwrap();
        let c = ControlSnapshot {
            tape_enabled: false,
            reverb_enabled: false,
            psychedelic: true,
            ..ControlSnapshot::default()
        };
        d.set_controls(&c);
        d.reset();
        let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin() * 1.5).collect();
        let mut l = input.clone();
        let mut r = input.clone();
        d.process_block(&mut l, &mut r, &c);
        assert_eq!(l, input);
        assert_eq!(r, input);
    }

    #[test]
    fn switching_tape_off_fades_instead_of_cutting() {
        let mut d =
            TapeDelay::new(PrepareSpec::new(48000.0, 512), TapeDelayConfig::default()).unwrap();
        let on = quiet_controls();
        d.set_controls(&on);
        d.reset();

        // 10 ms of DC, then silence: the echo holds the wet output near 0.8.
        let mut l: Vec<f32> = (0..512).map(|i| if i < 480 { 0.8 } else { 0.0 }).collect();
        let mut r = l.clone();
        d.process_block(&mut l, &mut r, &on);
        assert!((l[511] - 0.8).abs() < 0.01, "wet before switch {}", l[511]);

        let off = ControlSnapshot {
            tape_enabled: false,
            ..on
        };
        let mut l = vec![0.0; 512];
        let mut r = vec![0.0; 512];
        d.process_block(&mut l, &mut r, &off);
        assert!(l[0] > 0.7, "stage cut off abruptly: {}", l[0]);
        assert!(l[1] <= l[0]);
        // Fully faded after 10 ms: the dry (silent) input remains.
        assert!(l[480..].iter().all(|&s| s == 0.0));

        // Faded-out stages leave later blocks untouched.
        let input: Vec<f32> = (0..512).map(|i| (i as f32 * 0.2).sin()).collect();
        let mut l = input.clone();
        let mut r = input.clone();
        d.process_block(&mut l, &mut r, &off);
        assert_eq!(l, input);
        assert_eq!(r, input);
    }

    #[test]
    fn switching_reverb_on_fades_in() {
        let c = ControlSnapshot {
            tape_enabled: false,
            reverb_enabled: false,
            reverb_level: 1.0,
            ..ControlSnapshot::default()
        };
        let mut d =
            TapeDelay::new(PrepareSpec::new(48000.0, 1024), TapeDelayConfig::default()).unwrap();
        d.set_controls(&c);
        d.reset();

        let on = ControlSnapshot {
            reverb_enabled: true,
            ..c
        };
        let mut l = vec![0.5; 1024];
        let mut r = vec![0.5; 1024];
        d.process_block(&mut l, &mut r, &on);
        // Full level means fully wet; the first frame is still almost all dry.
        assert!(l[0] > 0.45, "reverb cut in abruptly: {}", l[0]);
        assert!(l.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    }

    #[test]
    fn flutter_runs_at_twice_its_rate() {
        let mut d =
            TapeDelay::new(PrepareSpec::new(48000.0, 64), TapeDelayConfig::default()).unwrap();
        let flutter = |d: &TapeDelay| d.channel(0).map(|ch| ch.flutter.frequency());
        assert_eq!(flutter(&d), Some(30.0));

        d.set_controls(&ControlSnapshot {
            flutter_rate_hz: 4.0,
            ..ControlSnapshot::default()
        });
        assert_eq!(flutter(&d), Some(8.0));
        assert_eq!(d.channel(1).map(|ch| ch.wow.frequency()), Some(0.5));
    }

    #[test]
    fn prepare_at_new_rate_rebuilds_every_stage() {
        let cfg = TapeDelayConfig {
            feedback_fade: None,
            ..TapeDelayConfig::default()
        };
        let mut d = TapeDelay::new(PrepareSpec::new(44100.0, 1024), cfg).unwrap();
        let c = quiet_controls();
        d.set_controls(&c);
        d.prepare(PrepareSpec::new(96000.0, 1024)).unwrap();

        let ch = d.channel(0).unwrap();
        assert_eq!(ch.delay_line().len(), 524_288);
        assert_eq!(ch.flutter.frequency(), c.flutter_rate_hz * FLUTTER_SPEED);

        // 10 ms at 96 kHz.
        let mut l = vec![0.0; 1024];
        let mut r = vec![0.0; 1024];
        l[0] = 1.0;
        d.process_block(&mut l, &mut r, &c);
        let peak = l
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(960));
    }

    #[test]
    fn out_of_range_controls_are_counted() {
        let spec = PrepareSpec::new(48000.0, 64).with_max_delay_seconds(1.0);
        let mut d = TapeDelay::new(spec, TapeDelayConfig::default()).unwrap();
        let c = ControlSnapshot {
            feedback: 2.0,
            delay_time_ms: 2500.0,
            ..ControlSnapshot::default()
        };
        d.set_controls(&c);
        assert_eq!(d.diagnostics().clamped_controls, 2);
        assert_eq!(d.control(ControlId::Feedback), 0.95);
        assert_eq!(d.control(ControlId::DelayTime), 1000.0);
        d.clear_diagnostics();
        assert!(d.diagnostics().is_clean());
    }

    #[test]
    fn tail_grows_with_feedback() {
        let mut d =
            TapeDelay::new(PrepareSpec::new(48000.0, 64), TapeDelayConfig::default()).unwrap();
        d.set_controls(&ControlSnapshot { feedback: 0.0, ..ControlSnapshot::default() });
        let short = d.tail_seconds();
        assert!((short - (3.0 + ReverbTap::decay_seconds())).abs() < 1e-4);

        d.set_controls(&ControlSnapshot { feedback: 0.9, ..ControlSnapshot::default() });
        let long = d.tail_seconds();
        assert!(long > short * 10.0, "{long} vs {short}");
    }

    #[test]
    fn clamp_sample_cases() {
        assert_eq!(clamp_sample(0.5), (0.5, false));
        assert_eq!(clamp_sample(1.5), (1.0, true));
        assert_eq!(clamp_sample(-3.0), (-1.0, true));
        assert_eq!(clamp_sample(f32::NAN), (0.0, true));
    }
}
