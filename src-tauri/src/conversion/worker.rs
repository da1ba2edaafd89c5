// Sequential batch worker, runs off the UI thread
use crate::models::{
    display_path, BatchSummary, ConversionJob, ConversionOutcome, ConversionProgressEvent,
    FailedConversion,
};
use crate::process_manager::CancelToken;
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Turns one PDF into a PDF/A file
pub trait PdfConverter {
    fn convert(&self, input: &Path, output: &Path) -> ConversionOutcome;
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Progress(ConversionProgressEvent),
    Finished(BatchSummary),
}

/// Truncating percentage, so three files report 33, 66, 100
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (completed.min(total) * 100 / total) as u8
}

fn convert_job(job: &ConversionJob, converter: &dyn PdfConverter) -> ConversionOutcome {
    let Some(output) = job.output_path() else {
        return ConversionOutcome::failure(format!("Input has no file name: {}", job.input_display()));
    };

    if let Err(e) = fs::create_dir_all(&job.output_dir) {
        return ConversionOutcome::failure(format!(
            "Failed to create output directory {:?}: {}",
            job.output_dir, e
        ));
    }

    converter.convert(&job.input, &output)
}

/// Converts `jobs` in order. Emits one `Progress` per processed job and a single
/// `Finished` at the end, whether files failed or the run was cancelled. A job
/// cut short by cancellation is reported as skipped, not failed.
pub fn run_batch(
    run_id: &str,
    jobs: &[ConversionJob],
    converter: &dyn PdfConverter,
    cancel: &CancelToken,
    mut emit: impl FnMut(BatchEvent),
) -> BatchSummary {
    let total = jobs.len();
    let started_at = chrono::Utc::now().to_rfc3339();
    info!("Starting conversion run {} with {} file(s)", run_id, total);

    let mut output_dirs: Vec<String> = Vec::new();
    for job in jobs {
        let dir = display_path(&job.output_dir);
        if !output_dirs.contains(&dir) {
            output_dirs.push(dir);
        }
    }

    let mut completed = 0;
    let mut succeeded = 0;
    let mut failures: Vec<FailedConversion> = Vec::new();

    for job in jobs {
        if cancel.is_cancelled() {
            info!("Conversion run {} cancelled after {} file(s)", run_id, completed);
            break;
        }

        let outcome = convert_job(job, converter);
        if cancel.is_cancelled() && !outcome.is_success() {
            // Interrupted mid-conversion, counts as not processed
            info!("Conversion of {} interrupted by cancel", job.input_display());
            break;
        }

        match &outcome {
            ConversionOutcome::Success => succeeded += 1,
            ConversionOutcome::Failure { reason } => {
                warn!("Failed to convert {}: {}", job.input_display(), reason);
                failures.push(FailedConversion {
                    input: job.input_display(),
                    reason: reason.clone(),
                });
            }
        }

        completed += 1;
        emit(BatchEvent::Progress(ConversionProgressEvent {
            run_id: run_id.to_string(),
            completed,
            total,
            percent: progress_percent(completed, total),
            input: job.input_display(),
            outcome,
        }));
    }

    let summary = BatchSummary {
        run_id: run_id.to_string(),
        total,
        succeeded,
        failed: failures.len(),
        skipped: total - completed,
        cancelled: completed < total,
        failures,
        output_dirs,
        started_at,
        finished_at: chrono::Utc::now().to_rfc3339(),
    };

    info!(
        "Conversion run {} finished: {} succeeded, {} failed, {} skipped",
        run_id, summary.succeeded, summary.failed, summary.skipped
    );

    emit(BatchEvent::Finished(summary.clone()));
    summary
}
