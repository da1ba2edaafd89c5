// Conversion command handlers: file pickers, starting and cancelling a batch
use super::settings::load_settings;
use crate::conversion::{is_pdf, plan_jobs, run_batch, BatchEvent, ConversionState};
use crate::ghostscript::GhostscriptConverter;
use crate::models::BatchSummary;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tauri::{AppHandle, Emitter, State};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_plugin_opener::OpenerExt;
use tokio::sync::{mpsc, oneshot};

/// Text of the modal shown when a run ends
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionNotice {
    pub title: &'static str,
    pub message: String,
    pub warning: bool,
}

pub fn completion_notice(summary: &BatchSummary) -> CompletionNotice {
    if summary.all_succeeded() {
        return CompletionNotice {
            title: "Completed",
            message: "Conversion finished successfully.".to_string(),
            warning: false,
        };
    }

    let mut message = if summary.cancelled {
        format!(
            "Conversion cancelled.\n{} converted, {} failed, {} not processed.",
            summary.succeeded, summary.failed, summary.skipped
        )
    } else {
        format!(
            "Conversion finished with errors.\n{} of {} file(s) converted, {} failed.",
            summary.succeeded, summary.total, summary.failed
        )
    };

    for failure in summary.failures.iter().take(5) {
        let name = Path::new(&failure.input)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| failure.input.clone());
        message.push_str(&format!("\n- {}: {}", name, failure.reason));
    }
    if summary.failures.len() > 5 {
        message.push_str(&format!("\n... and {} more", summary.failures.len() - 5));
    }

    CompletionNotice {
        title: "Warning",
        message,
        warning: true,
    }
}

fn show_completion(app: &AppHandle, summary: &BatchSummary, open_output: bool) {
    let notice = completion_notice(summary);
    let kind = if notice.warning {
        MessageDialogKind::Warning
    } else {
        MessageDialogKind::Info
    };

    app.dialog()
        .message(notice.message)
        .title(notice.title)
        .kind(kind)
        .show(|_| {});

    if open_output && summary.succeeded > 0 {
        if let Some(dir) = summary.output_dirs.first() {
            if let Err(e) = app.opener().open_path(dir.clone(), None::<&str>) {
                warn!("Failed to open output folder {}: {}", dir, e);
            }
        }
    }
}

/// Multi-select dialog restricted to PDF files. Empty when cancelled.
#[tauri::command]
pub async fn select_pdf_files(app: AppHandle) -> Result<Vec<String>, String> {
    let (tx, rx) = oneshot::channel();

    app.dialog()
        .file()
        .set_title("Select PDF files")
        .add_filter("PDF files", &["pdf"])
        .pick_files(move |files| {
            let _ = tx.send(files);
        });

    let files = rx.await.map_err(|e| format!("File dialog closed unexpectedly: {}", e))?;

    Ok(files
        .unwrap_or_default()
        .into_iter()
        .filter_map(|file| file.into_path().ok())
        .map(|path| path.to_string_lossy().to_string())
        .collect())
}

/// Destination folder dialog. `None` keeps outputs next to each input.
#[tauri::command]
pub async fn select_destination_folder(app: AppHandle) -> Result<Option<String>, String> {
    let (tx, rx) = oneshot::channel();

    app.dialog()
        .file()
        .set_title("Select destination folder for the converted PDFs")
        .pick_folder(move |folder| {
            let _ = tx.send(folder);
        });

    let folder = rx.await.map_err(|e| format!("Folder dialog closed unexpectedly: {}", e))?;

    Ok(folder
        .and_then(|f| f.into_path().ok())
        .map(|path| path.to_string_lossy().to_string()))
}

/// Start a batch on a worker thread. Returns the run id.
#[tauri::command]
pub fn start_conversion(
    app: AppHandle,
    state: State<'_, Arc<ConversionState>>,
    files: Vec<String>,
    destination: Option<String>,
) -> Result<String, String> {
    if files.is_empty() {
        return Err("No files selected".to_string());
    }

    let binary = state
        .binary()
        .ok_or_else(|| "Ghostscript is not available yet".to_string())?;

    let files: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
    if let Some(not_pdf) = files.iter().find(|f| !is_pdf(f)) {
        return Err(format!("Not a PDF file: {}", not_pdf.display()));
    }

    let settings = load_settings();
    let destination = destination
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from);
    let jobs = plan_jobs(&files, destination.as_deref(), &settings.output_subfolder);

    let guard = state
        .inner()
        .try_begin()
        .ok_or_else(|| "A conversion is already running".to_string())?;
    let cancel = guard.cancel_token();
    let converter = GhostscriptConverter::new(binary, settings.conversion_timeout(), cancel.clone());

    let run_id = uuid::Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<BatchEvent>();

    // Forward worker events to the frontend
    let app_clone = app.clone();
    let open_output = settings.open_output_when_done;
    tauri::async_runtime::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                BatchEvent::Progress(progress) => {
                    let _ = app_clone.emit("conversion:progress", &progress);
                }
                BatchEvent::Finished(summary) => {
                    let _ = app_clone.emit("conversion:finished", &summary);
                    show_completion(&app_clone, &summary, open_output);
                }
            }
        }
    });

    let worker_run_id = run_id.clone();
    thread::Builder::new()
        .name("pdfa-worker".to_string())
        .spawn(move || {
            // Release the run slot before announcing completion
            let mut guard = Some(guard);
            run_batch(&worker_run_id, &jobs, &converter, &cancel, |event| {
                if matches!(event, BatchEvent::Finished(_)) {
                    guard.take();
                }
                let _ = tx.send(event);
            });
        })
        .map_err(|e| format!("Failed to start conversion worker: {}", e))?;

    info!("Conversion run {} started", run_id);
    Ok(run_id)
}

#[tauri::command]
pub fn cancel_conversion(state: State<'_, Arc<ConversionState>>) -> bool {
    let cancelled = state.cancel();
    if cancelled {
        info!("Conversion cancel requested");
    }
    cancelled
}

#[tauri::command]
pub fn open_folder(app: AppHandle, path: String) -> Result<(), String> {
    if !Path::new(&path).is_dir() {
        return Err(format!("Folder not found: {}", path));
    }

    app.opener()
        .open_path(path, None::<&str>)
        .map_err(|e| format!("Failed to open folder: {}", e))
}
