//! Console logger implementation

use super::traits::{LogLevel, Logger};

/// Environment variable selecting the minimum level of `ConsoleLogger::new()`
pub const LOG_LEVEL_ENV: &str = "PARAM_OVERRIDE_LOG_LEVEL";

/// A logger that writes to stderr
///
/// Startup diagnostics go to stderr so they never mix with application output.
/// Messages below `min_level` are dropped.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Create a console logger whose level comes from `PARAM_OVERRIDE_LOG_LEVEL`
    /// (default: info)
    pub fn new() -> Self {
        let min_level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|v| LogLevel::parse(&v))
            .unwrap_or(LogLevel::Info);
        Self {
            prefix: "[param-override]".to_string(),
            min_level,
        }
    }

    /// Create a console logger with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::new()
        }
    }

    /// Override the minimum level
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if level >= self.min_level {
            eprintln!("{} {}: {}", self.prefix, level, message);
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }
}
