// Settings command handlers - JSON file storage
use crate::conversion::validate_subfolder;
use crate::file_manager::{read_json_file_or_default, write_json_file};
use crate::models::Settings;
use crate::utils::get_settings_json_path;
use log::debug;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsParams {
    pub installer_url: Option<String>,
    pub installer_file_name: Option<String>,
    pub install_poll_attempts: Option<u32>,
    pub install_poll_interval_secs: Option<u64>,
    pub installer_timeout_secs: Option<u64>,
    pub conversion_timeout_secs: Option<u64>,
    pub output_subfolder: Option<String>,
    pub extra_search_dirs: Option<Vec<String>>,
    pub open_output_when_done: Option<bool>,
}

/// Settings with defaults if the file is missing or unreadable
pub fn load_settings() -> Settings {
    read_json_file_or_default(&get_settings_json_path())
}

/// Get current settings from the JSON file
#[tauri::command]
pub fn get_settings() -> Settings {
    load_settings()
}

/// Update settings with partial update support
#[tauri::command]
pub fn update_settings(settings: UpdateSettingsParams) -> Result<Settings, String> {
    let updated = apply_settings_update(load_settings(), settings)?;
    write_json_file(&get_settings_json_path(), &updated)?;
    debug!("Settings updated: {:?}", updated);
    Ok(updated)
}

fn apply_settings_update(mut current: Settings, params: UpdateSettingsParams) -> Result<Settings, String> {
    if let Some(installer_url) = params.installer_url {
        let parsed = url::Url::parse(installer_url.trim())
            .map_err(|e| format!("Invalid installer URL: {}", e))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(format!("Installer URL must use http or https: {}", installer_url));
        }
        current.installer_url = parsed.to_string();
    }
    if let Some(installer_file_name) = params.installer_file_name {
        let name = installer_file_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(format!("Invalid installer file name: {}", installer_file_name));
        }
        current.installer_file_name = name.to_string();
    }
    if let Some(attempts) = params.install_poll_attempts {
        if attempts == 0 {
            return Err("Install poll attempts must be at least 1".to_string());
        }
        current.install_poll_attempts = attempts;
    }
    if let Some(interval) = params.install_poll_interval_secs {
        current.install_poll_interval_secs = interval;
    }
    if let Some(timeout) = params.installer_timeout_secs {
        current.installer_timeout_secs = timeout;
    }
    if let Some(timeout) = params.conversion_timeout_secs {
        current.conversion_timeout_secs = timeout;
    }
    if let Some(subfolder) = params.output_subfolder {
        validate_subfolder(&subfolder)?;
        current.output_subfolder = subfolder.trim().to_string();
    }
    if let Some(dirs) = params.extra_search_dirs {
        current.extra_search_dirs = dirs
            .into_iter()
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty())
            .collect();
    }
    if let Some(open_output_when_done) = params.open_output_when_done {
        current.open_output_when_done = open_output_when_done;
    }

    Ok(current)
}
