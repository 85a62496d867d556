//! Control surface of the tape delay.
//!
//! Every control has a stable string key used for persisted state, a legal
//! range and a default. The audio thread consumes a [`ControlSnapshot`] once
//! per block; other threads write into [`SharedControls`], which hands out
//! snapshots built from one relaxed atomic load per control.
//!
//! | Key | Range | Default |
//! |-----|-------|---------|
//! | `DelayTime` | 1–3000 ms | 500 |
//! | `Feedback` | 0–0.95 | 0.5 |
//! | `WowRate` | 0.1–5 Hz | 0.5 |
//! | `WowDepth` | 0–1 | 0.3 |
//! | `FlutterRate` | 0.1–50 Hz | 15 |
//! | `FlutterDepth` | 0–0.5 | 0.15 |
//! | `DryWet` | 0–1 | 0.5 |
//! | `FilterFreq` | 20–20000 Hz | 4000 |
//! | `Saturation` | 0–1 | 0.4 |
//! | `ReverbLevel` | 0–1 | 0.3 |
//! | `TapeDelayOnOff` | toggle | on |
//! | `ReverbOnOff` | toggle | off |
//! | `PsychedelicMode` | toggle | off |

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Number of continuous (float) controls.
pub const CONTINUOUS_CONTROL_COUNT: usize = 10;
/// Number of on/off controls.
pub const TOGGLE_CONTROL_COUNT: usize = 3;
/// Total number of controls.
pub const CONTROL_COUNT: usize = CONTINUOUS_CONTROL_COUNT + TOGGLE_CONTROL_COUNT;

/// Identifies one control. Continuous controls come first, toggles last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ControlId {
    /// Base delay time in milliseconds.
    DelayTime = 0,
    /// Loop gain.
    Feedback,
    /// Wow oscillator rate in Hz.
    WowRate,
    /// Wow depth.
    WowDepth,
    /// Flutter oscillator rate in Hz.
    FlutterRate,
    /// Flutter depth.
    FlutterDepth,
    /// Dry/wet balance, 1 = fully wet.
    DryWet,
    /// Feedback low-pass cutoff in Hz.
    FilterFreq,
    /// Saturation amount.
    Saturation,
    /// Reverb tap mix.
    ReverbLevel,
    /// Tape stage on/off.
    TapeEnabled,
    /// Reverb stage on/off.
    ReverbEnabled,
    /// Alternate "psychedelic" character.
    Psychedelic,
}

impl ControlId {
    /// Every control in index order.
    pub const ALL: [ControlId; CONTROL_COUNT] = [
        Self::DelayTime,
        Self::Feedback,
        Self::WowRate,
        Self::WowDepth,
        Self::FlutterRate,
        Self::FlutterDepth,
        Self::DryWet,
        Self::FilterFreq,
        Self::Saturation,
        Self::ReverbLevel,
        Self::TapeEnabled,
        Self::ReverbEnabled,
        Self::Psychedelic,
    ];

    /// Position in [`ALL`](Self::ALL).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable key used in presets and on the command line.
    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    /// Looks a control up by its stable key (case-sensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }

    /// True for on/off controls.
    #[inline]
    pub fn is_toggle(self) -> bool {
        self.index() >= CONTINUOUS_CONTROL_COUNT
    }

    /// Range, default and display metadata.
    pub fn descriptor(self) -> &'static ControlDescriptor {
        &DESCRIPTORS[self.index()]
    }
}

impl core::fmt::Display for ControlId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// Display unit of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlUnit {
    /// Milliseconds.
    Milliseconds,
    /// Hertz.
    Hertz,
    /// Unitless 0–1 amount.
    Ratio,
    /// On/off.
    Toggle,
}

impl ControlUnit {
    /// Short suffix for display ("ms", "Hz", "").
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Milliseconds => "ms",
            Self::Hertz => "Hz",
            Self::Ratio | Self::Toggle => "",
        }
    }
}

/// Metadata for one control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlDescriptor {
    /// Which control this describes.
    pub id: ControlId,
    /// Stable persisted key, e.g. `"DelayTime"`.
    pub key: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Display unit.
    pub unit: ControlUnit,
    /// Lowest legal value (0 for toggles).
    pub min: f32,
    /// Highest legal value (1 for toggles).
    pub max: f32,
    /// Default value (0 or 1 for toggles).
    pub default: f32,
}

impl ControlDescriptor {
    const fn continuous(
        id: ControlId,
        key: &'static str,
        name: &'static str,
        unit: ControlUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self { id, key, name, unit, min, max, default }
    }

    const fn toggle(id: ControlId, key: &'static str, name: &'static str, default: bool) -> Self {
        Self {
            id,
            key,
            name,
            unit: ControlUnit::Toggle,
            min: 0.0,
            max: 1.0,
            default: if default { 1.0 } else { 0.0 },
        }
    }

    /// Clamps into range; non-finite values fall back to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.default
        }
    }

    /// True if `value` is finite and inside the legal range.
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

static DESCRIPTORS: [ControlDescriptor; CONTROL_COUNT] = [
    ControlDescriptor::continuous(
        ControlId::DelayTime,
        "DelayTime",
        "Delay Time",
        ControlUnit::Milliseconds,
        1.0,
        3000.0,
        500.0,
    ),
    ControlDescriptor::continuous(
        ControlId::Feedback,
        "Feedback",
        "Feedback",
        ControlUnit::Ratio,
        0.0,
        0.95,
        0.5,
    ),
    ControlDescriptor::continuous(
        ControlId::WowRate,
        "WowRate",
        "Wow Rate",
        ControlUnit::Hertz,
        0.1,
        5.0,
        0.5,
    ),
    ControlDescriptor::continuous(
        ControlId::WowDepth,
        "WowDepth",
        "Wow Depth",
        ControlUnit::Ratio,
        0.0,
        1.0,
        0.3,
    ),
    ControlDescriptor::continuous(
        ControlId::FlutterRate,
        "FlutterRate",
        "Flutter Rate",
        ControlUnit::Hertz,
        0.1,
        50.0,
        15.0,
    ),
    ControlDescriptor::continuous(
        ControlId::FlutterDepth,
        "FlutterDepth",
        "Flutter Depth",
        ControlUnit::Ratio,
        0.0,
        0.5,
        0.15,
    ),
    ControlDescriptor::continuous(
        ControlId::DryWet,
        "DryWet",
        "Dry/Wet",
        ControlUnit::Ratio,
        0.0,
        1.0,
        0.5,
    ),
    ControlDescriptor::continuous(
        ControlId::FilterFreq,
        "FilterFreq",
        "Filter Cutoff",
        ControlUnit::Hertz,
        20.0,
        20000.0,
        4000.0,
    ),
    ControlDescriptor::continuous(
        ControlId::Saturation,
        "Saturation",
        "Saturation",
        ControlUnit::Ratio,
        0.0,
        1.0,
        0.4,
    ),
    ControlDescriptor::continuous(
        ControlId::ReverbLevel,
        "ReverbLevel",
        "Reverb Level",
        ControlUnit::Ratio,
        0.0,
        1.0,
        0.3,
    ),
    ControlDescriptor::toggle(ControlId::TapeEnabled, "TapeDelayOnOff", "Tape Delay", true),
    ControlDescriptor::toggle(ControlId::ReverbEnabled, "ReverbOnOff", "Reverb", false),
    ControlDescriptor::toggle(ControlId::Psychedelic, "PsychedelicMode", "Psychedelic Mode", false),
];

/// Control values for one block.
///
/// Values may be out of range; the processor clamps them at the point of
/// use and counts every clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    /// Base delay time in ms.
    pub delay_time_ms: f32,
    /// Loop gain.
    pub feedback: f32,
    /// Wow rate in Hz.
    pub wow_rate_hz: f32,
    /// Wow depth.
    pub wow_depth: f32,
    /// Flutter rate in Hz.
    pub flutter_rate_hz: f32,
    /// Flutter depth.
    pub flutter_depth: f32,
    /// Dry/wet balance.
    pub dry_wet: f32,
    /// Feedback filter cutoff in Hz.
    pub filter_cutoff_hz: f32,
    /// Saturation amount.
    pub saturation: f32,
    /// Reverb mix.
    pub reverb_level: f32,
    /// Tape stage on.
    pub tape_enabled: bool,
    /// Reverb stage on.
    pub reverb_enabled: bool,
    /// Alternate character on.
    pub psychedelic: bool,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        let mut snapshot = Self {
            delay_time_ms: 0.0,
            feedback: 0.0,
            wow_rate_hz: 0.0,
            wow_depth: 0.0,
            flutter_rate_hz: 0.0,
            flutter_depth: 0.0,
            dry_wet: 0.0,
            filter_cutoff_hz: 0.0,
            saturation: 0.0,
            reverb_level: 0.0,
            tape_enabled: false,
            reverb_enabled: false,
            psychedelic: false,
        };
        for id in ControlId::ALL {
            snapshot.set(id, id.descriptor().default);
        }
        snapshot
    }
}

impl ControlSnapshot {
    /// Reads a control as `f32` (toggles read 0.0 or 1.0).
    pub fn get(&self, id: ControlId) -> f32 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match id {
            ControlId::DelayTime => self.delay_time_ms,
            ControlId::Feedback => self.feedback,
            ControlId::WowRate => self.wow_rate_hz,
            ControlId::WowDepth => self.wow_depth,
            ControlId::FlutterRate => self.flutter_rate_hz,
            ControlId::FlutterDepth => self.flutter_depth,
            ControlId::DryWet => self.dry_wet,
            ControlId::FilterFreq => self.filter_cutoff_hz,
            ControlId::Saturation => self.saturation,
            ControlId::ReverbLevel => self.reverb_level,
            ControlId::TapeEnabled => flag(self.tape_enabled),
            ControlId::ReverbEnabled => flag(self.reverb_enabled),
            ControlId::Psychedelic => flag(self.psychedelic),
        }
    }

    /// Writes a control. Toggles are on for values ≥ 0.5. No clamping.
    pub fn set(&mut self, id: ControlId, value: f32) {
        match id {
            ControlId::DelayTime => self.delay_time_ms = value,
            ControlId::Feedback => self.feedback = value,
            ControlId::WowRate => self.wow_rate_hz = value,
            ControlId::WowDepth => self.wow_depth = value,
            ControlId::FlutterRate => self.flutter_rate_hz = value,
            ControlId::FlutterDepth => self.flutter_depth = value,
            ControlId::DryWet => self.dry_wet = value,
            ControlId::FilterFreq => self.filter_cutoff_hz = value,
            ControlId::Saturation => self.saturation = value,
            ControlId::ReverbLevel => self.reverb_level = value,
            ControlId::TapeEnabled => self.tape_enabled = value >= 0.5,
            ControlId::ReverbEnabled => self.reverb_enabled = value >= 0.5,
            ControlId::Psychedelic => self.psychedelic = value >= 0.5,
        }
    }

    /// Returns a copy with every continuous control clamped into range and
    /// the number of values that had to change.
    pub fn clamped(&self) -> (Self, u32) {
        let mut out = *self;
        let mut count = 0;
        for id in &ControlId::ALL[..CONTINUOUS_CONTROL_COUNT] {
            let desc = id.descriptor();
            let value = self.get(*id);
            if !desc.contains(value) {
                out.set(*id, desc.clamp(value));
                count += 1;
            }
        }
        (out, count)
    }
}

/// Lock-free control store shared between a writer thread and the audio
/// thread.
///
/// Continuous values are `f32` bit patterns in `AtomicU32`; toggles are
/// `AtomicBool`. All accesses are `Relaxed`: each control is read with a
/// single load, so no value is ever torn, and controls are independent.
///
/// Wrap in an `Arc` to share it.
#[derive(Debug)]
pub struct SharedControls {
    values: [AtomicU32; CONTINUOUS_CONTROL_COUNT],
    toggles: [AtomicBool; TOGGLE_CONTROL_COUNT],
}

impl Default for SharedControls {
    fn default() -> Self {
        Self::new(&ControlSnapshot::default())
    }
}

impl SharedControls {
    /// Creates a store holding `initial`.
    pub fn new(initial: &ControlSnapshot) -> Self {
        let store = Self {
            values: core::array::from_fn(|_| AtomicU32::new(0)),
            toggles: core::array::from_fn(|_| AtomicBool::new(false)),
        };
        store.store(initial);
        store
    }

    /// Writes one control.
    #[inline]
    pub fn set(&self, id: ControlId, value: f32) {
        let index = id.index();
        if id.is_toggle() {
            self.toggles[index - CONTINUOUS_CONTROL_COUNT].store(value >= 0.5, Ordering::Relaxed);
        } else {
            self.values[index].store(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// Reads one control (toggles read 0.0 or 1.0).
    #[inline]
    pub fn get(&self, id: ControlId) -> f32 {
        let index = id.index();
        if id.is_toggle() {
            if self.toggles[index - CONTINUOUS_CONTROL_COUNT].load(Ordering::Relaxed) {
                1.0
            } else {
                0.0
            }
        } else {
            f32::from_bits(self.values[index].load(Ordering::Relaxed))
        }
    }

    /// Writes every control from a snapshot.
    pub fn store(&self, snapshot: &ControlSnapshot) {
        for id in ControlId::ALL {
            self.set(id, snapshot.get(id));
        }
    }

    /// One load per control.
    pub fn snapshot(&self) -> ControlSnapshot {
        let mut out = ControlSnapshot::default();
        for id in ControlId::ALL {
            out.set(id, self.get(id));
        }
        out
    }
}
