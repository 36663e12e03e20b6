//! Human-readable dispatch log.
//!
//! The coordinator writes its narrative lines ("Running job for
//! repository…", "OK ran job…") through a [`DispatchLog`] handed to it at
//! construction, so tests can capture exactly what an operator would see.

use std::sync::Mutex;

/// Severity of a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Destination for dispatch log lines.
pub trait DispatchLog: Send + Sync {
    fn write(&self, level: LogLevel, line: &str);

    fn info(&self, line: &str) {
        self.write(LogLevel::Info, line);
    }

    fn warn(&self, line: &str) {
        self.write(LogLevel::Warn, line);
    }

    fn error(&self, line: &str) {
        self.write(LogLevel::Error, line);
    }
}

/// Forwards lines to `tracing` under the `githook::dispatch` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl DispatchLog for TracingLog {
    fn write(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Info => tracing::info!(target: "githook::dispatch", "{line}"),
            LogLevel::Warn => tracing::warn!(target: "githook::dispatch", "{line}"),
            LogLevel::Error => tracing::error!(target: "githook::dispatch", "{line}"),
        }
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, line)| line.contains(needle))
    }
}

impl DispatchLog for MemoryLog {
    fn write(&self, level: LogLevel, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, line.to_string()));
        }
    }
}
