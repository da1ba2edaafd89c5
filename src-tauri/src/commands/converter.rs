// Ghostscript status for the frontend
use crate::conversion::ConversionState;
use crate::models::ConverterStatus;
use std::sync::Arc;
use tauri::State;

pub fn converter_status(state: &ConversionState) -> ConverterStatus {
    let binary = state.binary();
    ConverterStatus {
        ready: binary.is_some(),
        binary_path: binary.as_ref().map(|b| b.path.to_string_lossy().to_string()),
        source: binary.map(|b| b.source),
        running: state.is_running(),
    }
}

#[tauri::command]
pub fn get_converter_status(state: State<'_, Arc<ConversionState>>) -> ConverterStatus {
    converter_status(&state)
}
