use std::path::Path;

use crate::error::AppError;
use crate::models::settings::AppSettings;

/// Read application settings from `path`. Returns defaults if the file does
/// not exist. Keys missing from the file take their default values.
pub fn load_settings(path: &Path) -> crate::error::Result<AppSettings> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("Settings file not found, using defaults: path={}", path.display());
            return Ok(AppSettings::default());
        }
        Err(e) => {
            return Err(AppError::Storage(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Storage(format!("invalid settings {}: {}", path.display(), e)))
}
