// Data models (structs)
pub mod conversion;
pub mod ghostscript;
pub mod settings;

pub use conversion::*;
pub use ghostscript::*;
pub use settings::*;
