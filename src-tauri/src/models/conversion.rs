// Conversion job models
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One input file and the directory its PDF/A copy goes to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

impl ConversionJob {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Output keeps the input's file name; `None` when the input has no file name
    pub fn output_path(&self) -> Option<PathBuf> {
        self.input.file_name().map(|name| self.output_dir.join(name))
    }

    pub fn input_display(&self) -> String {
        display_path(&self.input)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Success,
    Failure { reason: String },
}

impl ConversionOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedConversion {
    pub input: String,
    pub reason: String,
}

/// Emitted after every processed job
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConversionProgressEvent {
    pub run_id: String,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub input: String,
    pub outcome: ConversionOutcome,
}

/// Aggregate result of a batch run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub run_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub failures: Vec<FailedConversion>,
    pub output_dirs: Vec<String>,
    pub started_at: String,
    pub finished_at: String,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.succeeded == self.total
    }
}

pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
