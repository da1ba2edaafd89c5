//! Logging setup for the converter
//! Wires `log` macros to tauri-plugin-log and handles 7-day log retention

use crate::utils::get_logs_dir;
use log::{info, LevelFilter};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tauri::{plugin::TauriPlugin, Runtime};
use tauri_plugin_log::{RotationStrategy, Target, TargetKind};

const LOG_RETENTION_DAYS: u64 = 7;
const LOG_FILE_NAME: &str = "pdfa-converter";
const MAX_LOG_FILE_BYTES: u128 = 5 * 1024 * 1024;

/// Log plugin writing to stdout and to the app logs directory
pub fn build_log_plugin<R: Runtime>() -> TauriPlugin<R> {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    tauri_plugin_log::Builder::new()
        .level(level)
        .level_for("ureq", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .targets([
            Target::new(TargetKind::Stdout),
            Target::new(TargetKind::Folder {
                path: get_logs_dir(),
                file_name: Some(LOG_FILE_NAME.to_string()),
            }),
        ])
        .max_file_size(MAX_LOG_FILE_BYTES)
        .rotation_strategy(RotationStrategy::KeepAll)
        .build()
}

pub fn cleanup_old_logs() {
    let retention = Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);
    let removed = remove_logs_older_than(&get_logs_dir(), retention, SystemTime::now());
    if removed > 0 {
        info!("Cleaned up {} old log file(s)", removed);
    }
}

fn remove_logs_older_than(logs_dir: &Path, retention: Duration, now: SystemTime) -> usize {
    if !logs_dir.exists() {
        return 0;
    }

    let mut removed = 0;
    if let Ok(entries) = fs::read_dir(logs_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "log") {
                if let Ok(modified) = fs::metadata(&path).and_then(|meta| meta.modified()) {
                    if let Ok(age) = now.duration_since(modified) {
                        if age > retention && fs::remove_file(&path).is_ok() {
                            removed += 1;
                        }
                    }
                }
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_expired_log_files_removed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.log"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        // Pretend "now" is far in the future so every file is expired
        let later = SystemTime::now() + Duration::from_secs(30 * 24 * 60 * 60);
        let removed = remove_logs_older_than(dir.path(), Duration::from_secs(60), later);

        assert_eq!(removed, 1);
        assert!(!dir.path().join("old.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_fresh_logs_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("today.log"), "x").unwrap();

        let removed = remove_logs_older_than(
            dir.path(),
            Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60),
            SystemTime::now(),
        );

        assert_eq!(removed, 0);
    }
}
