mod commands;
mod conversion;
mod file_manager;
mod ghostscript;
mod logging;
mod models;
mod process_manager;
mod utils;

use commands::{
    conversion::{cancel_conversion, open_folder, select_destination_folder, select_pdf_files, start_conversion},
    converter::{converter_status, get_converter_status},
    settings::{get_settings, load_settings, update_settings},
};
use conversion::ConversionState;
use file_manager::initialize_json_file;
use ghostscript::{ensure_available, publish_dir, BootstrapOptions, GhostscriptLocator, SystemInstaller, UserPathStore};
use log::{error, info, warn};
use models::{Settings, MANUAL_DOWNLOAD_URL};
use process_manager::CancelToken;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager, RunEvent, WindowEvent};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use utils::{get_settings_json_path, initialize_data_directories};

fn initialize_app_data() -> Result<(), String> {
    initialize_data_directories()?;
    initialize_json_file(&get_settings_json_path(), &Settings::default())?;

    println!("App data initialized successfully");
    Ok(())
}

fn show_main_window(app: &AppHandle) {
    if let Some(window) = app.get_webview_window("main") {
        let _ = window.show();
        let _ = window.unminimize();
        let _ = window.set_focus();
    }
}

fn fail_startup(app: &AppHandle, title: &str, message: String, kind: MessageDialogKind) {
    app.dialog()
        .message(message)
        .title(title)
        .kind(kind)
        .blocking_show();
    app.exit(1);
}

/// Locate or install Ghostscript before the window appears
fn bootstrap_converter(app: AppHandle, state: Arc<ConversionState>, cancel: CancelToken) {
    let settings = load_settings();
    let locator = GhostscriptLocator::from_env(&settings);
    let options = BootstrapOptions::from_settings(&settings);

    let binary = match ensure_available(&locator, &SystemInstaller, &options, &cancel) {
        Ok(binary) => binary,
        Err(e) => {
            error!("Ghostscript bootstrap failed: {}", e);
            fail_startup(
                &app,
                "Error",
                format!(
                    "Ghostscript could not be installed automatically ({}).\n\
                     Please install it manually from:\n{}",
                    e, MANUAL_DOWNLOAD_URL
                ),
                MessageDialogKind::Error,
            );
            return;
        }
    };

    if let Some(dir) = binary.dir() {
        if let Err(e) = publish_dir(&UserPathStore, dir) {
            warn!("Could not add Ghostscript to the user PATH: {}", e);
        }
    }

    if !binary.exists() {
        warn!("Ghostscript disappeared from {:?} after detection", binary.path);
        fail_startup(
            &app,
            "Warning",
            "Ghostscript was installed but could not be found.\n\
             Please restart the application or check the installation manually."
                .to_string(),
            MessageDialogKind::Warning,
        );
        return;
    }

    info!("Using Ghostscript at {:?}", binary.path);
    state.set_binary(binary);

    show_main_window(&app);
    let _ = app.emit("converter:ready", converter_status(&state));
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    if let Err(e) = initialize_app_data() {
        eprintln!("Failed to initialize app data: {}", e);
    }

    let conversion_state = Arc::new(ConversionState::new());
    let bootstrap_cancel = CancelToken::new();
    let setup_state = conversion_state.clone();
    let setup_cancel = bootstrap_cancel.clone();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            // Another instance tried to launch - focus this one once it is ready
            let ready = app
                .try_state::<Arc<ConversionState>>()
                .map_or(false, |state| state.binary().is_some());
            if ready {
                show_main_window(app);
            }
        }))
        .plugin(logging::build_log_plugin())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .manage(conversion_state.clone())
        .on_window_event(|window, event| {
            if let WindowEvent::Destroyed = event {
                if window.label() == "main" {
                    window.state::<Arc<ConversionState>>().cancel();
                }
            }
        })
        .setup(move |app| {
            logging::cleanup_old_logs();

            let handle = app.handle().clone();
            std::thread::Builder::new()
                .name("gs-bootstrap".to_string())
                .spawn(move || bootstrap_converter(handle, setup_state, setup_cancel))?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Converter status
            get_converter_status,
            // Conversion commands
            select_pdf_files,
            select_destination_folder,
            start_conversion,
            cancel_conversion,
            open_folder,
            // Settings commands
            get_settings,
            update_settings,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(move |_app, event| {
        if let RunEvent::Exit = event {
            bootstrap_cancel.cancel();
            conversion_state.cancel();
        }
    });
}
