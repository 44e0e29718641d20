#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured JSON run logs shared by the enrichment crates.
//!
//! Every record is appended as one JSON line. A logger can also tee a short
//! human-readable line to stderr so an operator watching the run sees the
//! same stream that lands in the file.

use std::{
    fmt,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Log severity level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational events.
    Info,
    /// Warning indicator.
    Warn,
    /// Error indicator.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Timestamp in ISO8601.
    pub timestamp: DateTime<Utc>,
    /// Module emitting the log.
    pub module: String,
    /// Severity.
    pub level: LogLevel,
    /// Message key, e.g. `enrich.place.accepted`.
    pub message: String,
    /// Arbitrary JSON payload.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl LogRecord {
    /// Creates a record with the provided info.
    #[must_use]
    pub fn new(module: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            module: module.into(),
            level,
            message: message.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Replaces the metadata with the fields of a JSON object.
    ///
    /// Non-object values are stored under a single `data` key.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        match metadata {
            serde_json::Value::Object(map) => self.metadata = map,
            serde_json::Value::Null => {}
            other => {
                self.metadata.insert("data".into(), other);
            }
        }
        self
    }

    /// Renders the single-line console form.
    #[must_use]
    pub fn console_line(&self) -> String {
        let mut line = format!("[{}] {} {}", self.level, self.module, self.message);
        for (key, value) in &self.metadata {
            match value {
                serde_json::Value::String(text) => line.push_str(&format!(" {key}={text}")),
                other => line.push_str(&format!(" {key}={other}")),
            }
        }
        line
    }
}

/// Builds the timestamped path of a run log, e.g. `run_log_20250101_093000.log`.
#[must_use]
pub fn run_log_path(dir: impl AsRef<Path>, prefix: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.as_ref().join(format!("{prefix}_{stamp}.log"))
}

/// Thread-safe JSON-lines logger with append-only semantics.
#[derive(Debug)]
pub struct JsonLogger {
    path: PathBuf,
    writer: Mutex<File>,
    echo: Option<LogLevel>,
}

impl JsonLogger {
    /// Creates or opens a logger at the desired path.
    ///
    /// # Errors
    ///
    /// The parent directory or the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
            echo: None,
        })
    }

    /// Tees records at or above `threshold` to stderr.
    #[must_use]
    pub const fn with_echo(mut self, threshold: LogLevel) -> Self {
        self.echo = Some(threshold);
        self
    }

    /// Writes a log record as JSON line.
    ///
    /// # Errors
    ///
    /// Serialization or the file write fails.
    pub fn log(&self, record: &LogRecord) -> Result<()> {
        {
            let mut writer = self.writer.lock();
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        if self.echo.is_some_and(|threshold| record.level >= threshold) {
            let mut stderr = io::stderr().lock();
            writeln!(stderr, "{}", record.console_line())?;
        }
        Ok(())
    }

    /// Returns the underlying file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
