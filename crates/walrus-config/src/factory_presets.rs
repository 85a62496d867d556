//! Factory presets bundled with the walrus library.
//!
//! These are embedded at compile time and always available, whatever the
//! state of the user preset directory.

use crate::Preset;

/// Internal names of the factory presets.
pub static FACTORY_PRESET_NAMES: &[&str] = &["classic", "slapback", "warped", "space", "clean"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("classic", CLASSIC_PRESET),
    ("slapback", SLAPBACK_PRESET),
    ("warped", WARPED_PRESET),
    ("space", SPACE_PRESET),
    ("clean", CLEAN_PRESET),
];

const CLASSIC_PRESET: &str = r#"
name = "Classic"
description = "Half-second tape echo with gentle wow and a darkened loop"

[controls]
DelayTime = 500.0
Feedback = 0.5
WowRate = 0.5
WowDepth = 0.3
FlutterRate = 15.0
FlutterDepth = 0.15
DryWet = 0.5
FilterFreq = 4000.0
Saturation = 0.4
ReverbLevel = 0.3
TapeDelayOnOff = true
ReverbOnOff = false
PsychedelicMode = false
"#;

const SLAPBACK_PRESET: &str = r#"
name = "Slapback"
description = "Single short repeat for vocals and rockabilly guitar"

[controls]
DelayTime = 110.0
Feedback = 0.1
WowDepth = 0.05
FlutterDepth = 0.05
DryWet = 0.35
FilterFreq = 6000.0
Saturation = 0.3
ReverbOnOff = false
"#;

const WARPED_PRESET: &str = r#"
name = "Warped"
description = "Worn tape: deep wow, fast flutter and the psychedelic character"

[engine]
filter = "biquad"

[controls]
DelayTime = 380.0
Feedback = 0.65
WowRate = 1.2
WowDepth = 0.9
FlutterRate = 22.0
FlutterDepth = 0.4
DryWet = 0.5
FilterFreq = 2500.0
Saturation = 0.7
ReverbLevel = 0.4
ReverbOnOff = true
PsychedelicMode = true
"#;

const SPACE_PRESET: &str = r#"
name = "Space"
description = "Long, dense repeats washing into the reverb"

[engine]
max_delay_seconds = 3.0
silence_hold_samples = 48000

[controls]
DelayTime = 1200.0
Feedback = 0.8
WowRate = 0.3
WowDepth = 0.2
FlutterDepth = 0.1
DryWet = 0.6
FilterFreq = 3000.0
Saturation = 0.25
ReverbLevel = 0.7
ReverbOnOff = true
"#;

const CLEAN_PRESET: &str = r#"
name = "Clean"
description = "Digital-clear repeats: no modulation, saturation or reverb"

[engine]
silence_hold_samples = 0

[controls]
DelayTime = 375.0
Feedback = 0.4
WowDepth = 0.0
FlutterDepth = 0.0
DryWet = 0.4
FilterFreq = 20000.0
Saturation = 0.0
ReverbOnOff = false
PsychedelicMode = false
"#;

/// All factory presets, in [`FACTORY_PRESET_NAMES`] order.
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by internal or display name (case-insensitive).
///
/// ```rust
/// use walrus_config::get_factory_preset;
///
/// let preset = get_factory_preset("Slapback").unwrap();
/// assert_eq!(preset.to_snapshot().delay_time_ms, 110.0);
/// ```
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    let name_lower = name.to_lowercase();

    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(key, toml)| Some((*key, Preset::from_toml(toml).ok()?)))
        .find(|(key, preset)| *key == name_lower || preset.name.to_lowercase() == name_lower)
        .map(|(_, preset)| preset)
}

/// Internal names of all factory presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// True if `name` matches a factory preset (case-insensitive).
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_preset;

    #[test]
    fn test_factory_presets_load() {
        let presets = factory_presets();
        assert_eq!(presets.len(), FACTORY_PRESET_NAMES.len());
        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Classic", "Slapback", "Warped", "Space", "Clean"]);
    }

    #[test]
    fn test_all_factory_presets_valid() {
        for (name, toml) in FACTORY_PRESETS_TOML {
            let preset = Preset::from_toml(toml)
                .unwrap_or_else(|e| panic!("factory preset '{name}' should parse: {e}"));
            assert!(preset.description.is_some(), "preset '{name}' needs a description");
            assert_eq!(validate_preset(&preset), Ok(()), "preset '{name}'");
        }
    }

    #[test]
    fn test_get_factory_preset() {
        assert_eq!(get_factory_preset("warped").unwrap().name, "Warped");
        assert_eq!(get_factory_preset("SPACE").unwrap().name, "Space");
        assert!(get_factory_preset("dub").is_none());
    }

    #[test]
    fn test_is_factory_preset() {
        assert!(is_factory_preset("clean"));
        assert!(is_factory_preset("Classic"));
        assert!(!is_factory_preset("nonexistent"));
    }

    #[test]
    fn test_classic_matches_control_defaults() {
        let classic = get_factory_preset("classic").unwrap();
        assert_eq!(classic.to_snapshot(), walrus_effects::ControlSnapshot::default());
    }

    #[test]
    fn test_engine_options_carried() {
        let warped = get_factory_preset("warped").unwrap();
        assert_eq!(warped.engine_config().filter_kind, walrus_effects::FilterKind::Biquad);
        assert!(warped.to_snapshot().psychedelic);
        assert!(warped.to_snapshot().reverb_enabled);

        let clean = get_factory_preset("clean").unwrap();
        assert!(clean.engine_config().feedback_fade.is_none());
    }
}
