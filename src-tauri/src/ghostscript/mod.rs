// Ghostscript discovery, installation and invocation
pub mod bootstrap;
pub mod installer;
pub mod invoker;
pub mod locator;
pub mod path_env;

pub use bootstrap::*;
pub use installer::*;
pub use invoker::*;
pub use locator::*;
pub use path_env::*;
