//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use walrus_effects::{
    ControlId, ControlSnapshot, DEFAULT_MAX_DELAY_SECONDS, FeedbackFadeSettings, FilterKind,
    PrepareSpec, TapeDelayConfig,
};

use crate::error::ConfigError;

/// Feedback filter topology as written in preset files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSetting {
    /// 6 dB/oct one-pole lowpass.
    #[default]
    OnePole,
    /// 12 dB/oct Butterworth biquad.
    Biquad,
}

impl From<FilterSetting> for FilterKind {
    fn from(setting: FilterSetting) -> Self {
        match setting {
            FilterSetting::OnePole => FilterKind::OnePole,
            FilterSetting::Biquad => FilterKind::Biquad,
        }
    }
}

impl From<FilterKind> for FilterSetting {
    fn from(kind: FilterKind) -> Self {
        match kind {
            FilterKind::OnePole => FilterSetting::OnePole,
            FilterKind::Biquad => FilterSetting::Biquad,
        }
    }
}

/// Options fixed when the processor is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Longest supported delay in seconds.
    #[serde(default = "default_max_delay_seconds")]
    pub max_delay_seconds: f32,

    /// Feedback filter topology.
    #[serde(default)]
    pub filter: FilterSetting,

    /// Silent input samples tolerated before the feedback fades out.
    /// Zero disables the fade.
    #[serde(default = "default_silence_hold_samples")]
    pub silence_hold_samples: u32,
}

fn default_max_delay_seconds() -> f32 {
    DEFAULT_MAX_DELAY_SECONDS
}

fn default_silence_hold_samples() -> u32 {
    FeedbackFadeSettings::default().hold_samples
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_delay_seconds: default_max_delay_seconds(),
            filter: FilterSetting::default(),
            silence_hold_samples: default_silence_hold_samples(),
        }
    }
}

/// A control value as stored in TOML: a number or a boolean toggle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    /// On/off state.
    Toggle(bool),
    /// Continuous value in the control's own unit.
    Number(f64),
}

impl ControlValue {
    /// Stores an `f32` so that it prints back the way it was typed
    /// (`0.45`, not `0.44999998807907104`).
    pub fn number(value: f32) -> Self {
        let clean = value.to_string().parse::<f64>().unwrap_or(f64::from(value));
        ControlValue::Number(clean)
    }

    /// Numeric view: toggles read as 0.0 / 1.0.
    pub fn as_f32(self) -> f32 {
        match self {
            ControlValue::Toggle(on) => {
                if on {
                    1.0
                } else {
                    0.0
                }
            }
            ControlValue::Number(v) => v as f32,
        }
    }

    /// Human-readable kind name used in error messages.
    pub fn kind(self) -> &'static str {
        match self {
            ControlValue::Toggle(_) => "boolean",
            ControlValue::Number(_) => "number",
        }
    }
}

impl core::fmt::Display for ControlValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ControlValue::Toggle(on) => write!(f, "{on}"),
            ControlValue::Number(v) => write!(f, "{v}"),
        }
    }
}

/// Preset file format for the tape delay.
///
/// Control keys are the stable IDs from [`ControlId::key`]; keys that are
/// absent take the control's default. Values are not clamped on load:
/// [`to_snapshot`](Self::to_snapshot) clamps them, and
/// [`validate_preset`](crate::validate_preset) reports them.
///
/// # TOML Format
///
/// ```toml
/// name = "Classic Echo"
/// description = "Warm quarter-second repeats"
///
/// [engine]
/// max_delay_seconds = 3.0
/// filter = "one_pole"
/// silence_hold_samples = 100
///
/// [controls]
/// DelayTime = 350.0
/// Feedback = 0.45
/// TapeDelayOnOff = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Prepare-time engine options.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Control values keyed by stable ID.
    #[serde(default)]
    pub controls: BTreeMap<String, ControlValue>,
}

impl Preset {
    /// Create a preset with default engine settings and no stored controls.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            engine: EngineSettings::default(),
            controls: BTreeMap::new(),
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the engine settings.
    pub fn with_engine(mut self, engine: EngineSettings) -> Self {
        self.engine = engine;
        self
    }

    /// Store one control value.
    pub fn with_control(mut self, id: ControlId, value: f32) -> Self {
        self.set_control(id, value);
        self
    }

    /// Store one control value, as a boolean for toggles.
    pub fn set_control(&mut self, id: ControlId, value: f32) {
        let stored = if id.is_toggle() {
            ControlValue::Toggle(value >= 0.5)
        } else {
            ControlValue::number(value)
        };
        self.controls.insert(id.key().to_string(), stored);
    }

    /// Stored value for a control, if present.
    pub fn control(&self, id: ControlId) -> Option<ControlValue> {
        self.controls.get(id.key()).copied()
    }

    /// Captures every control from a snapshot.
    pub fn from_snapshot(name: impl Into<String>, snapshot: &ControlSnapshot) -> Self {
        let mut preset = Self::new(name);
        for id in ControlId::ALL {
            preset.set_control(id, snapshot.get(id));
        }
        preset
    }

    /// Builds a clamped control snapshot.
    ///
    /// Missing keys, unknown keys and values of the wrong kind fall back to
    /// the defaults; numbers are clamped into each control's range and the
    /// delay time also to `engine.max_delay_seconds`.
    pub fn to_snapshot(&self) -> ControlSnapshot {
        let mut snapshot = ControlSnapshot::default();
        for id in ControlId::ALL {
            let Some(value) = self.control(id) else {
                continue;
            };
            match (id.is_toggle(), value) {
                (true, ControlValue::Toggle(_)) | (false, ControlValue::Number(_)) => {
                    snapshot.set(id, value.as_f32());
                }
                _ => {}
            }
        }
        let (mut snapshot, _) = snapshot.clamped();
        let max_ms = self.engine.max_delay_seconds * 1000.0;
        if max_ms.is_finite() && max_ms > 0.0 {
            snapshot.delay_time_ms = snapshot.delay_time_ms.min(max_ms);
        }
        snapshot
    }

    /// Engine options for [`TapeDelay`](walrus_effects::TapeDelay).
    pub fn engine_config(&self) -> TapeDelayConfig {
        let feedback_fade = (self.engine.silence_hold_samples > 0).then(|| FeedbackFadeSettings {
            hold_samples: self.engine.silence_hold_samples,
            ..FeedbackFadeSettings::default()
        });
        TapeDelayConfig {
            filter_kind: self.engine.filter.into(),
            feedback_fade,
        }
    }

    /// Prepare spec for the given audio configuration, carrying the preset's
    /// maximum delay.
    pub fn prepare_spec(&self, sample_rate: f32, max_block_size: usize) -> PrepareSpec {
        PrepareSpec::new(sample_rate, max_block_size)
            .with_max_delay_seconds(self.engine.max_delay_seconds)
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset: Preset = toml::from_str(&content)?;
        Ok(preset)
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
