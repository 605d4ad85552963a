pub mod event_source;
pub mod inputs;
pub mod panic_handler;
pub mod pdf;
pub mod reader;
pub mod session;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use reader::{Viewer, ViewerConfig};
pub use session::{run_with_event_source, settle};
