use std::path::Path;

use crate::models::settings::AppSettings;

/// Reads settings from `path`. A missing or unreadable file yields defaults.
pub fn load_settings(path: &Path) -> AppSettings {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Cannot read settings {}: {}", path.display(), e);
            }
            return AppSettings::default();
        }
    };

    match serde_json::from_str::<AppSettings>(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Invalid settings {}, using defaults: {}", path.display(), e);
            AppSettings::default()
        }
    }
}
