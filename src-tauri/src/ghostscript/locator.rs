use crate::models::{BinarySource, GhostscriptBinary, Settings};
use std::cmp::Ordering;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(windows)]
use winreg::enums::*;
#[cfg(windows)]
use winreg::RegKey;

/// Command names probed on PATH, in priority order
pub const EXECUTABLE_NAMES: &[&str] = &["gs", "gswin64c", "gswin32c"];

/// Binaries looked up under `<base>\<version>\bin`
const INSTALL_BIN_NAMES: &[&str] = &["gswin64c.exe", "gswin32c.exe"];

const FALLBACK_INSTALL_BASES: &[&str] = &[r"C:\Program Files\gs", r"C:\Program Files (x86)\gs"];

#[cfg(windows)]
const REGISTRY_ROOT: &str = r"SOFTWARE\GPL Ghostscript";

/// Anything that can tell whether Ghostscript is available right now
pub trait Locate {
    fn locate(&self) -> Option<GhostscriptBinary>;
}

/// Probes PATH, configured directories and well-known install locations
#[derive(Debug, Clone, Default)]
pub struct GhostscriptLocator {
    path_dirs: Vec<PathBuf>,
    extra_dirs: Vec<PathBuf>,
    install_bases: Vec<PathBuf>,
    use_registry: bool,
}

impl GhostscriptLocator {
    /// Locator over the current process environment
    pub fn from_env(settings: &Settings) -> Self {
        let path_dirs = env::var_os("PATH")
            .map(|value| env::split_paths(&value).collect())
            .unwrap_or_default();

        let extra_dirs = settings
            .extra_search_dirs
            .iter()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .collect();

        Self {
            use_registry: cfg!(windows),
            ..Self::default()
        }
        .with_path_dirs(path_dirs)
        .with_extra_dirs(extra_dirs)
        .with_install_bases(default_install_bases())
    }

    pub fn with_path_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.path_dirs = dirs;
        self
    }

    pub fn with_extra_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.extra_dirs = dirs;
        self
    }

    pub fn with_install_bases(mut self, bases: Vec<PathBuf>) -> Self {
        self.install_bases = bases;
        self
    }

    fn find_on_path(&self) -> Option<PathBuf> {
        for name in EXECUTABLE_NAMES {
            let file_name = executable_file_name(name);
            for dir in &self.path_dirs {
                let candidate = dir.join(&file_name);
                if is_executable(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn find_in_extra_dirs(&self) -> Option<PathBuf> {
        for dir in &self.extra_dirs {
            for name in EXECUTABLE_NAMES {
                let candidate = dir.join(executable_file_name(name));
                if is_executable(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn find_in_install_bases(&self) -> Option<PathBuf> {
        self.install_bases
            .iter()
            .find_map(|base| find_in_install_base(base))
    }

    #[cfg(windows)]
    fn find_in_registry(&self) -> Option<PathBuf> {
        let root = RegKey::predef(HKEY_LOCAL_MACHINE).open_subkey(REGISTRY_ROOT).ok()?;

        let mut versions: Vec<String> = root.enum_keys().flatten().collect();
        versions.sort_by(|a, b| compare_versions(b, a));

        for version in versions {
            let Ok(key) = root.open_subkey(&version) else {
                continue;
            };
            let Ok(dll) = key.get_value::<String, _>("GS_DLL") else {
                continue;
            };
            if let Some(bin_dir) = Path::new(&dll).parent() {
                for name in INSTALL_BIN_NAMES {
                    let candidate = bin_dir.join(name);
                    if candidate.is_file() {
                        return Some(candidate);
                    }
                }
            }
        }

        None
    }

    #[cfg(not(windows))]
    fn find_in_registry(&self) -> Option<PathBuf> {
        None
    }
}

impl Locate for GhostscriptLocator {
    fn locate(&self) -> Option<GhostscriptBinary> {
        if let Some(path) = self.find_on_path() {
            return Some(GhostscriptBinary::new(path, BinarySource::Path));
        }
        if let Some(path) = self.find_in_extra_dirs() {
            return Some(GhostscriptBinary::new(path, BinarySource::ExtraDir));
        }
        if let Some(path) = self.find_in_install_bases() {
            return Some(GhostscriptBinary::new(path, BinarySource::InstallDir));
        }
        if self.use_registry {
            if let Some(path) = self.find_in_registry() {
                return Some(GhostscriptBinary::new(path, BinarySource::Registry));
            }
        }
        None
    }
}

/// `<ProgramFiles>\gs` directories, from the environment when available
fn default_install_bases() -> Vec<PathBuf> {
    if !cfg!(windows) {
        return Vec::new();
    }

    let mut bases: Vec<PathBuf> = ["ProgramFiles", "ProgramW6432", "ProgramFiles(x86)"]
        .iter()
        .filter_map(|var| env::var_os(var))
        .map(|dir| PathBuf::from(dir).join("gs"))
        .collect();

    for fallback in FALLBACK_INSTALL_BASES {
        bases.push(PathBuf::from(fallback));
    }

    let mut unique: Vec<PathBuf> = Vec::new();
    for base in bases {
        let key = base.to_string_lossy().to_lowercase();
        if !unique.iter().any(|b| b.to_string_lossy().to_lowercase() == key) {
            unique.push(base);
        }
    }
    unique
}

/// Scan `base`'s immediate subdirectories, newest version first
fn find_in_install_base(base: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(base).ok()?;

    let mut version_dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();

    version_dirs.sort_by(|a, b| {
        let a_name = a.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let b_name = b.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        compare_versions(&b_name, &a_name)
    });

    for dir in version_dirs {
        for name in INSTALL_BIN_NAMES {
            let candidate = dir.join("bin").join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    None
}

/// "gs10.06.0" -> [10, 6, 0]
fn parse_gs_version(name: &str) -> Option<Vec<u32>> {
    let lower = name.to_lowercase();
    let numbers = lower.strip_prefix("gs").unwrap_or(&lower);
    numbers
        .split('.')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect()
}

/// Numeric version order; names that don't parse sort below versions
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_gs_version(a), parse_gs_version(b)) {
        (Some(a_ver), Some(b_ver)) => a_ver.cmp(&b_ver),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => b.cmp(a),
    }
}

fn executable_file_name(name: &str) -> String {
    format!("{}{}", name, env::consts::EXE_SUFFIX)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
