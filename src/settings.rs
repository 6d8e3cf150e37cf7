use crate::errors::{AppError, AppResult};
use crate::models::AppSettings;
use std::fs;
use std::path::Path;

/// Reads settings from a JSON file. A missing file gives the defaults, and so
/// does a file that no longer parses (with a warning).
pub fn load_settings(path: &Path) -> AppResult<AppSettings> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }

    let raw = fs::read_to_string(path).map_err(|err| AppError::Io(err.to_string()))?;
    match serde_json::from_str::<AppSettings>(&raw) {
        Ok(settings) => Ok(settings),
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "settings file unreadable; using defaults"
            );
            Ok(AppSettings::default())
        }
    }
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
    }
    fs::write(path, serde_json::to_string_pretty(settings)?)
        .map_err(|err| AppError::Io(err.to_string()))?;
    Ok(())
}

/// Deep-merges `update` onto the stored settings and persists the result.
pub fn update_settings(path: &Path, update: serde_json::Value) -> AppResult<AppSettings> {
    let current = load_settings(path)?;
    let mut merged = serde_json::to_value(current)?;
    merge_json(&mut merged, update);
    let settings: AppSettings = serde_json::from_value(merged)
        .map_err(|err| AppError::Validation(format!("Invalid settings update: {}", err)))?;
    save_settings(path, &settings)?;
    Ok(settings)
}

fn merge_json(target: &mut serde_json::Value, update: serde_json::Value) {
    match (target, update) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_json(target_map.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (target, update) => {
            *target = update;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_settings, save_settings, update_settings};
    use crate::models::AppSettings;
    use serde_json::json;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&dir.path().join("settings.json")).expect("load");
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.data_file, "tasks.txt");
        assert!(settings.autosave);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").expect("write");
        assert_eq!(load_settings(&path).expect("load"), AppSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"logFilter":"debug"}"#).expect("write");
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.log_filter, "debug");
        assert_eq!(settings.data_file, "tasks.txt");
    }

    #[test]
    fn update_merges_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config").join("settings.json");
        save_settings(&path, &AppSettings::default()).expect("save");

        let patch = json!({"dataFile": "work.txt", "autosave": false});
        let updated = update_settings(&path, patch).expect("update");
        assert_eq!(updated.data_file, "work.txt");
        assert!(!updated.autosave);
        assert_eq!(load_settings(&path).expect("reload"), updated);

        let error = update_settings(&path, json!({"autosave": "sometimes"})).expect_err("bad type");
        assert!(error.to_string().contains("VALIDATION_FAILED"));
    }
}
