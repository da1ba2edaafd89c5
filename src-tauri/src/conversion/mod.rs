// Batch conversion: job planning, the worker loop and run state
pub mod jobs;
pub mod state;
pub mod worker;

pub use jobs::*;
pub use state::*;
pub use worker::*;
