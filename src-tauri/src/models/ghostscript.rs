// Ghostscript installation models
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a Ghostscript executable was found
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BinarySource {
    Path,
    ExtraDir,
    InstallDir,
    Registry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GhostscriptBinary {
    pub path: PathBuf,
    pub source: BinarySource,
}

impl GhostscriptBinary {
    pub fn new(path: PathBuf, source: BinarySource) -> Self {
        Self { path, source }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Status payload for the frontend
#[derive(Debug, Clone, Serialize)]
pub struct ConverterStatus {
    pub ready: bool,
    pub binary_path: Option<String>,
    pub source: Option<BinarySource>,
    pub running: bool,
}
