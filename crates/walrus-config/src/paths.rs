//! Preset directories and lookup.
//!
//! - **User config**: `~/.config/walrus/` (Linux), `~/Library/Application Support/walrus/` (macOS), `%APPDATA%\walrus\` (Windows)
//! - **User presets**: the `presets/` subdirectory of the user config directory
//!
//! Names resolve in a fixed order: factory preset, then a `.toml` file in the
//! user preset directory, then a literal file path.
//!
//! ```rust,no_run
//! use walrus_config::paths;
//!
//! let preset = paths::load_preset("classic").unwrap();
//! println!("{} from {:?}", preset.name, paths::user_presets_dir());
//! ```

use std::path::{Path, PathBuf};

use crate::{ConfigError, Preset, get_factory_preset};

/// Application name used for directory paths.
const APP_NAME: &str = "walrus";

/// Subdirectory name for presets.
const PRESETS_SUBDIR: &str = "presets";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific presets directory.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// Ensure the user presets directory exists.
pub fn ensure_user_presets_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_presets_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Find a preset file by name in `presets_dir`, then as a literal path.
///
/// The name may omit the `.toml` extension. Factory presets have no file
/// and are not returned here; see [`load_preset`].
pub fn find_preset_in(presets_dir: &Path, name: &str) -> Option<PathBuf> {
    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    let user_path = presets_dir.join(&filename);
    if user_path.is_file() {
        return Some(user_path);
    }

    let path = PathBuf::from(name);
    path.is_file().then_some(path)
}

/// Find a preset file in the user presets directory or as a literal path.
pub fn find_preset(name: &str) -> Option<PathBuf> {
    find_preset_in(&user_presets_dir(), name)
}

/// Resolves a preset name against `presets_dir`: factory preset first, then
/// a user preset file, then a literal path.
pub fn load_preset_in(presets_dir: &Path, name: &str) -> Result<Preset, ConfigError> {
    if let Some(preset) = get_factory_preset(name) {
        return Ok(preset);
    }
    match find_preset_in(presets_dir, name) {
        Some(path) => Preset::load(path),
        None => Err(ConfigError::PresetNotFound(name.to_string())),
    }
}

/// Resolves a preset name against the user presets directory.
pub fn load_preset(name: &str) -> Result<Preset, ConfigError> {
    load_preset_in(&user_presets_dir(), name)
}

/// List all preset files in the user presets directory, sorted by path.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_presets() -> Vec<PathBuf> {
    list_presets_in_dir(&user_presets_dir())
}

/// List the `.toml` files in a directory, sorted by path.
pub fn list_presets_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut presets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    presets.sort();
    presets
}

/// Get the preset name from a file path (the file stem).
///
/// ```rust
/// use walrus_config::paths::preset_name_from_path;
/// use std::path::Path;
///
/// let name = preset_name_from_path(Path::new("/path/to/dub_echo.toml"));
/// assert_eq!(name, Some("dub_echo".to_string()));
/// ```
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
}
