use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::BurnInError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal, e.g. a data-quality problem).
    Warning,
    /// Error-level event (one file was excluded).
    Error,
    /// Critical error (I/O or configuration failures).
    Critical,
}

impl IngestionSeverity {
    /// Classify an error.
    pub fn for_error(e: &BurnInError) -> Self {
        match e {
            BurnInError::Io(_) | BurnInError::ThreadPool(_) => Self::Critical,
            BurnInError::Config { .. } | BurnInError::Glob(_) | BurnInError::NoValidFiles { .. } => {
                Self::Critical
            }
            BurnInError::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            BurnInError::Json(_)
            | BurnInError::Regex(_)
            | BurnInError::NoFormatMatch { .. }
            | BurnInError::HeaderNotFound { .. }
            | BurnInError::Timestamp { .. }
            | BurnInError::Interval { .. }
            | BurnInError::SchemaMismatch { .. }
            | BurnInError::LengthMismatch { .. }
            | BurnInError::Trim { .. } => Self::Error,
            BurnInError::UnknownColumn { .. }
            | BurnInError::InvalidArgument { .. }
            | BurnInError::TypeMismatch { .. } => Self::Warning,
        }
    }
}

/// Context about one file's ingestion.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// The input path.
    pub path: PathBuf,
    /// Pipeline stage that produced the outcome (`"combine"` for files that made it through).
    pub stage: &'static str,
}

/// Minimal stats reported for a file that was ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Rows contributed to the combined dataset.
    pub rows: usize,
    /// Rows removed by trimming.
    pub trimmed_rows: usize,
}

/// Observer interface for per-file ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a file is ingested.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when a file is excluded from the load.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &BurnInError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &BurnInError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &BurnInError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &BurnInError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Forwards ingestion events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl IngestionObserver for LogObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        log::info!(
            "[ingest][ok] path={} rows={} trimmed={}",
            ctx.path.display(),
            stats.rows,
            stats.trimmed_rows
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &BurnInError) {
        let level = match severity {
            IngestionSeverity::Info => log::Level::Info,
            IngestionSeverity::Warning => log::Level::Warn,
            IngestionSeverity::Error | IngestionSeverity::Critical => log::Level::Error,
        };
        log::log!(
            level,
            "[ingest][{:?}] stage={} path={} err={}",
            severity,
            ctx.stage,
            ctx.path.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &BurnInError) {
        log::error!(
            "[ALERT][ingest][{:?}] stage={} path={} err={}",
            severity,
            ctx.stage,
            ctx.path.display(),
            error
        );
    }
}
