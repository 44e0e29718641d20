use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use uuid::Uuid;

/// Builder for enrichment telemetry sinks.
pub struct EnrichmentTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    echo: Option<LogLevel>,
    run_id: Option<String>,
}

impl EnrichmentTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            echo: None,
            run_id: None,
        }
    }

    /// Sets the log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Echoes records at or above `threshold` to stderr.
    #[must_use]
    pub const fn echo(mut self, threshold: LogLevel) -> Self {
        self.echo = Some(threshold);
        self
    }

    /// Fixes the run id; a random one is generated otherwise.
    #[must_use]
    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Builds the telemetry handle.
    ///
    /// # Errors
    ///
    /// The log file cannot be created.
    pub fn build(self) -> Result<EnrichmentTelemetry> {
        let logger = match self.log_path {
            Some(path) => {
                let logger = JsonLogger::new(path)?;
                Some(match self.echo {
                    Some(threshold) => logger.with_echo(threshold),
                    None => logger,
                })
            }
            None => None,
        };
        Ok(EnrichmentTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                run_id: self
                    .run_id
                    .unwrap_or_else(|| format!("run-{}", Uuid::new_v4())),
                logger,
            }),
        })
    }
}

/// Telemetry handle shared by the runtime and its fetch hooks.
#[derive(Clone)]
pub struct EnrichmentTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for EnrichmentTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentTelemetry")
            .field("module", &self.inner.module)
            .field("run_id", &self.inner.run_id)
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    run_id: String,
    logger: Option<JsonLogger>,
}

impl EnrichmentTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> EnrichmentTelemetryBuilder {
        EnrichmentTelemetryBuilder::new(module)
    }

    /// Run id stamped on every record.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.inner.run_id
    }

    /// Log file, when one is configured.
    #[must_use]
    pub fn log_path(&self) -> Option<PathBuf> {
        self.inner
            .logger
            .as_ref()
            .map(|logger| logger.path().to_path_buf())
    }

    /// Logs structured metadata under a message key.
    ///
    /// # Errors
    ///
    /// Writing the log line fails.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let mut record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            record
                .metadata
                .insert("run_id".into(), Value::String(self.inner.run_id.clone()));
            logger.log(&record)?;
        }
        Ok(())
    }
}
