//! Preset validation.
//!
//! Loading a preset never fails on odd control values; they are clamped when
//! the preset is applied. Validation is the strict view: it reports every
//! key the processor does not know, every value of the wrong kind and every
//! value outside its range, so tools can warn before audio is rendered.
//!
//! # Example
//!
//! ```rust
//! use walrus_config::{Preset, ValidationError, validate_preset};
//!
//! let preset = Preset::from_toml("name = \"x\"\n[controls]\nFeedback = 1.5\n").unwrap();
//! assert!(matches!(
//!     validate_preset(&preset),
//!     Err(ValidationError::OutOfRange { .. })
//! ));
//! ```

use thiserror::Error;
use walrus_effects::ControlId;

use crate::preset::{ControlValue, Preset};

/// Longest delay a preset may request, in seconds. Fits the delay buffer
/// limit up to 192 kHz.
pub const MAX_PRESET_DELAY_SECONDS: f32 = 60.0;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Key is not a known control ID.
    #[error("unknown control '{0}'")]
    UnknownControl(String),

    /// Boolean for a continuous control, or number for a toggle.
    #[error("control '{control}' expects a {expected}, got a {found}")]
    WrongKind {
        /// Control key.
        control: String,
        /// Kind the control takes.
        expected: &'static str,
        /// Kind found in the preset.
        found: &'static str,
    },

    /// Value outside the control's range.
    #[error("control '{control}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Control key.
        control: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Engine setting that cannot be prepared.
    #[error("invalid engine setting '{field}': {reason}")]
    InvalidEngine {
        /// Field name under `[engine]`.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Several problems at once.
    #[error("{} problems: {}", .0.len(), join(.0))]
    Multiple(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks one key/value pair and returns the control it names.
pub fn validate_control(key: &str, value: ControlValue) -> ValidationResult<ControlId> {
    let id = ControlId::from_key(key)
        .ok_or_else(|| ValidationError::UnknownControl(key.to_string()))?;

    let expected = if id.is_toggle() { "boolean" } else { "number" };
    if value.kind() != expected {
        return Err(ValidationError::WrongKind {
            control: key.to_string(),
            expected,
            found: value.kind(),
        });
    }

    if let ControlValue::Number(v) = value {
        let desc = id.descriptor();
        if !v.is_finite() || v < f64::from(desc.min) || v > f64::from(desc.max) {
            return Err(ValidationError::OutOfRange {
                control: key.to_string(),
                value: v,
                min: desc.min,
                max: desc.max,
            });
        }
    }

    Ok(id)
}

/// Validates every control and engine setting in a preset.
///
/// Returns the single error when there is one, [`ValidationError::Multiple`]
/// when there are several.
pub fn validate_preset(preset: &Preset) -> ValidationResult<()> {
    let mut errors = Vec::new();

    let max_delay = preset.engine.max_delay_seconds;
    if !max_delay.is_finite() || max_delay <= 0.0 || max_delay > MAX_PRESET_DELAY_SECONDS {
        errors.push(ValidationError::InvalidEngine {
            field: "max_delay_seconds",
            reason: format!("{max_delay} is outside (0, {MAX_PRESET_DELAY_SECONDS}]"),
        });
    }

    for (key, value) in &preset.controls {
        match validate_control(key, *value) {
            Ok(ControlId::DelayTime) => {
                if let ControlValue::Number(ms) = value
                    && max_delay.is_finite()
                    && *ms > f64::from(max_delay) * 1000.0
                {
                    errors.push(ValidationError::OutOfRange {
                        control: key.clone(),
                        value: *ms,
                        min: ControlId::DelayTime.descriptor().min,
                        max: max_delay * 1000.0,
                    });
                }
            }
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
