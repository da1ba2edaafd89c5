// Path helpers
pub mod paths;

pub use paths::*;
