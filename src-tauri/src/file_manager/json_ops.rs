// JSON files written atomically under a process-wide lock

use log::warn;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

static FILE_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// `settings.json` -> `settings.json.tmp`, next to the target so rename stays on one volume
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = {
        let _lock = FILE_LOCK.lock();
        fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?
    };

    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse JSON from {:?}: {}", path, e))
}

pub fn write_json_file<T: Serialize>(path: &Path, data: &T) -> Result<(), String> {
    let json = serde_json::to_vec_pretty(data).map_err(|e| format!("Failed to serialize data: {}", e))?;

    let _lock = FILE_LOCK.lock();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create directory {:?}: {}", parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let written = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(&json)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&temp_path, path));

    written.map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to write {:?}: {}", path, e)
    })
}

/// Writes `default` only when nothing is stored yet
pub fn initialize_json_file<T: Serialize>(path: &Path, default: &T) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    println!("Initializing JSON file: {:?}", path);
    write_json_file(path, default)
}

/// Missing files and unreadable content both fall back to `T::default()`
pub fn read_json_file_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }

    read_json_file(path).unwrap_or_else(|e| {
        warn!("Using defaults, {}", e);
        T::default()
    })
}
