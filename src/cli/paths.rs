use std::path::PathBuf;

use crate::settings::SettingsError;

/// Directory under the home directory that holds the settings file.
pub const SETTINGS_DIR: &str = ".claude";

/// Settings file name inside [`SETTINGS_DIR`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Resolve the settings path, preferring an explicit override over
/// `~/.claude/settings.json`.
pub fn resolve_settings_path(settings: Option<&str>) -> Result<PathBuf, SettingsError> {
    settings_path_under(settings, dirs::home_dir())
}

fn settings_path_under(
    settings: Option<&str>,
    home: Option<PathBuf>,
) -> Result<PathBuf, SettingsError> {
    match settings {
        Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => home
            .map(|home| home.join(SETTINGS_DIR).join(SETTINGS_FILE))
            .ok_or_else(|| SettingsError::Io {
                path: PathBuf::from("~").join(SETTINGS_DIR).join(SETTINGS_FILE),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not determine home directory",
                ),
            }),
    }
}
