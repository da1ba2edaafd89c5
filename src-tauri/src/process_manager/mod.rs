// External process management
pub mod cancel;
pub mod command_runner;

pub use cancel::*;
pub use command_runner::*;
