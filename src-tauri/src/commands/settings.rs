use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager};

use crate::error::CommandError;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub font_size: u32,
    pub accent_color: String,
    pub toast_duration_ms: u32,
    pub show_welcome: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_size: 15,
            accent_color: "#ff71ce".to_string(),
            toast_duration_ms: 3000,
            show_welcome: true,
        }
    }
}

/// Reads `path`, writing the defaults there first if it does not exist.
/// A file that fails to parse is left untouched and the defaults are used.
pub fn load_or_init(path: &Path) -> Result<Settings, CommandError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), %err, "invalid settings, using defaults");
            Settings::default()
        })),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let settings = Settings::default();
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).map_err(CommandError::Settings)?;
            }
            let json = serde_json::to_string_pretty(&settings)
                .map_err(|err| CommandError::Settings(err.into()))?;
            fs::write(path, json).map_err(CommandError::Settings)?;
            tracing::info!(path = %path.display(), "wrote default settings");
            Ok(settings)
        }
        Err(err) => Err(CommandError::Settings(err)),
    }
}

#[tauri::command]
pub fn load_settings(app: AppHandle) -> Result<Settings, CommandError> {
    let dir = app.path().app_config_dir()?;
    load_or_init(&dir.join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        assert_eq!(load_or_init(&path).unwrap(), Settings::default());
        let written: Settings = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"font_size": 18, "show_welcome": false}"#).unwrap();

        let settings = load_or_init(&path).unwrap();
        assert_eq!(settings.font_size, 18);
        assert!(!settings.show_welcome);
        assert_eq!(settings.accent_color, "#ff71ce");
    }

    #[test]
    fn invalid_json_falls_back_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_or_init(&path).unwrap(), Settings::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
