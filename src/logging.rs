//! Logging for the installer.
//!
//! Two separate channels:
//!
//! - **Progress log ([`LogSink`])**: the human-readable, line-oriented account
//!   of what an action is doing. Always produced, mirrored verbatim to every
//!   attached sink.
//! - **Tracing ([`init`])**: developer diagnostics via `RUST_LOG`, written to
//!   stderr. Not part of the progress log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`.
///
/// ```bash
/// RUST_LOG=piwcs_installer=debug piwcs-installer update
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

/// A destination for progress log lines.
pub trait LogSink: Send + Sync {
    /// Append one line. `line` carries no trailing newline.
    fn line(&self, line: &str);

    /// Append an empty line.
    fn blank(&self) {
        self.line("");
    }
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn line(&self, line: &str) {
        (**self).line(line)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn line(&self, line: &str) {
        (**self).line(line)
    }
}

/// Writes lines to stdout.
pub struct Console;

impl LogSink for Console {
    fn line(&self, line: &str) {
        println!("{line}");
    }
}

/// Appends lines to a file.
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn line(&self, line: &str) {
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!("failed to mirror log line: {e}");
        }
    }
}

/// Mirrors every line to two sinks, in order.
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: LogSink, B: LogSink> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: LogSink, B: LogSink> LogSink for Tee<A, B> {
    fn line(&self, line: &str) {
        self.first.line(line);
        self.second.line(line);
    }
}

/// Keeps every line in memory.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
