//! Logging abstractions
//!
//! The override pass logs through an injected [`Logger`] so that the host
//! decides where diagnostics go. Resolved secret values are never passed to
//! a logger; only property names, source names and lookup keys are.

mod traits;
mod noop;
mod console;
mod memory;

pub use traits::{Logger, LoggerExt, SharedLogger, LogLevel};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use memory::MemoryLogger;
