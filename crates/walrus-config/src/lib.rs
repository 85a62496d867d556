//! Presets and persisted state for the walrus tape delay.
//!
//! A preset is a small TOML document: a name, optional description, the
//! engine options fixed at prepare time, and control values keyed by their
//! stable string IDs.
//!
//! - **Presets**: load, save and convert to a [`ControlSnapshot`]
//! - **Validation**: report unknown keys, wrong value kinds and out-of-range values
//! - **Factory presets**: built-in starting points, always available
//! - **Paths**: the per-user preset directory and name lookup
//!
//! # Example
//!
//! ```rust
//! use walrus_config::{Preset, validate_preset};
//!
//! let preset = Preset::from_toml(r#"
//! name = "Slow Echo"
//!
//! [controls]
//! DelayTime = 750.0
//! Feedback = 0.6
//! ReverbOnOff = true
//! "#).unwrap();
//!
//! validate_preset(&preset).unwrap();
//! let controls = preset.to_snapshot();
//! assert_eq!(controls.delay_time_ms, 750.0);
//! assert!(controls.reverb_enabled);
//! ```
//!
//! [`ControlSnapshot`]: walrus_effects::ControlSnapshot

mod error;
mod preset;

/// Preset directories and lookup.
pub mod paths;

/// Preset validation.
pub mod validation;

/// Presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use paths::{
    ensure_user_presets_dir, find_preset, list_user_presets, load_preset, preset_name_from_path,
    user_config_dir, user_presets_dir,
};
pub use preset::{ControlValue, EngineSettings, FilterSetting, Preset};
pub use validation::{ValidationError, ValidationResult, validate_control, validate_preset};
