// Persistent user PATH updates, so future launches find Ghostscript by name
use log::info;
use std::path::Path;

#[cfg(windows)]
use winreg::enums::*;
#[cfg(windows)]
use winreg::{RegKey, RegValue};

#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

#[cfg(windows)]
const ENVIRONMENT_KEY: &str = "Environment";

/// Storage for the user-level PATH value
pub trait PathStore {
    fn read(&self) -> Result<String, String>;
    fn write(&self, value: &str) -> Result<(), String>;
}

/// The PATH that new processes of the current user inherit
pub struct UserPathStore;

#[cfg(windows)]
impl PathStore for UserPathStore {
    fn read(&self) -> Result<String, String> {
        let env = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey(ENVIRONMENT_KEY)
            .map_err(|e| format!("Failed to open HKCU\\{}: {}", ENVIRONMENT_KEY, e))?;

        match env.get_value::<String, _>("Path") {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(format!("Failed to read user PATH: {}", e)),
        }
    }

    fn write(&self, value: &str) -> Result<(), String> {
        use std::os::windows::ffi::OsStrExt;

        let env = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(ENVIRONMENT_KEY, KEY_READ | KEY_WRITE)
            .map_err(|e| format!("Failed to open HKCU\\{} for writing: {}", ENVIRONMENT_KEY, e))?;

        // Keep REG_EXPAND_SZ entries like %USERPROFILE% expandable
        let vtype = env
            .get_raw_value("Path")
            .map(|existing| existing.vtype)
            .unwrap_or(REG_EXPAND_SZ);

        let bytes: Vec<u8> = std::ffi::OsStr::new(value)
            .encode_wide()
            .chain(std::iter::once(0))
            .flat_map(|unit| unit.to_le_bytes())
            .collect();

        env.set_raw_value("Path", &RegValue { bytes, vtype })
            .map_err(|e| format!("Failed to write user PATH: {}", e))?;

        broadcast_environment_change();
        Ok(())
    }
}

#[cfg(not(windows))]
impl PathStore for UserPathStore {
    fn read(&self) -> Result<String, String> {
        Ok(std::env::var("PATH").unwrap_or_default())
    }

    fn write(&self, _value: &str) -> Result<(), String> {
        Err("Persisting PATH is only supported on Windows".to_string())
    }
}

/// Tell Explorer and other top-level windows that the environment changed
#[cfg(windows)]
fn broadcast_environment_change() {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        SendMessageTimeoutW, HWND_BROADCAST, SMTO_ABORTIFHUNG, WM_SETTINGCHANGE,
    };

    let area: Vec<u16> = "Environment".encode_utf16().chain(std::iter::once(0)).collect();
    let mut result: usize = 0;
    unsafe {
        SendMessageTimeoutW(
            HWND_BROADCAST,
            WM_SETTINGCHANGE,
            0,
            area.as_ptr() as isize,
            SMTO_ABORTIFHUNG,
            5000,
            &mut result,
        );
    }
}

fn normalize_entry(entry: &str) -> String {
    entry
        .trim()
        .trim_matches('"')
        .trim_end_matches(|c| c == '\\' || c == '/')
        .to_lowercase()
}

/// Case-insensitive, entry-by-entry membership test
pub fn path_contains(path_value: &str, dir: &Path) -> bool {
    let wanted = normalize_entry(&dir.to_string_lossy());
    if wanted.is_empty() {
        return false;
    }

    path_value
        .split(PATH_SEPARATOR)
        .map(normalize_entry)
        .any(|entry| entry == wanted)
}

pub fn append_entry(path_value: &str, dir: &Path) -> String {
    let dir = dir.to_string_lossy();
    if path_value.trim().is_empty() {
        dir.to_string()
    } else if path_value.ends_with(PATH_SEPARATOR) {
        format!("{}{}", path_value, dir)
    } else {
        format!("{}{}{}", path_value, PATH_SEPARATOR, dir)
    }
}

/// Append `dir` to the persistent PATH unless it is already there.
/// Returns whether the stored value changed.
pub fn publish_dir(store: &dyn PathStore, dir: &Path) -> Result<bool, String> {
    let current = store.read()?;

    if path_contains(&current, dir) {
        info!("Ghostscript directory already on PATH: {:?}", dir);
        return Ok(false);
    }

    info!("Adding {:?} to the user PATH", dir);
    store.write(&append_entry(&current, dir))?;
    Ok(true)
}
