// Tauri command handlers - one file per domain
pub mod conversion;
pub mod converter;
pub mod settings;
