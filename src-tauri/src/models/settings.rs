// Settings data models
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_INSTALLER_URL: &str =
    "https://github.com/ArtifexSoftware/ghostpdl-downloads/releases/download/gs10060/gs10060w64.exe";
pub const MANUAL_DOWNLOAD_URL: &str = "https://ghostscript.com/releases/gsdnld.html";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub installer_url: String,
    pub installer_file_name: String,
    pub install_poll_attempts: u32,
    pub install_poll_interval_secs: u64,
    /// 0 disables the timeout
    pub installer_timeout_secs: u64,
    /// 0 disables the timeout
    pub conversion_timeout_secs: u64,
    pub output_subfolder: String,
    #[serde(default)]
    pub extra_search_dirs: Vec<String>,
    #[serde(default)]
    pub open_output_when_done: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            installer_url: String::from(DEFAULT_INSTALLER_URL),
            installer_file_name: String::from("ghostscript_installer.exe"),
            install_poll_attempts: 10,
            install_poll_interval_secs: 2,
            installer_timeout_secs: 600,
            conversion_timeout_secs: 600,
            output_subfolder: String::from("converted"),
            extra_search_dirs: Vec::new(),
            open_output_when_done: false,
        }
    }
}

impl Settings {
    pub fn install_poll_interval(&self) -> Duration {
        Duration::from_secs(self.install_poll_interval_secs)
    }

    pub fn installer_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.installer_timeout_secs)
    }

    pub fn conversion_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.conversion_timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let settings = Settings {
            conversion_timeout_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.conversion_timeout(), None);
        assert_eq!(
            Settings::default().installer_timeout(),
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let json = serde_json::json!({
            "installer_url": DEFAULT_INSTALLER_URL,
            "installer_file_name": "gs.exe",
            "install_poll_attempts": 3,
            "install_poll_interval_secs": 1,
            "installer_timeout_secs": 0,
            "conversion_timeout_secs": 30,
            "output_subfolder": "pdfa"
        });

        let settings: Settings = serde_json::from_value(json).unwrap();
        assert!(settings.extra_search_dirs.is_empty());
        assert!(!settings.open_output_when_done);
        assert_eq!(settings.output_subfolder, "pdfa");
    }
}
