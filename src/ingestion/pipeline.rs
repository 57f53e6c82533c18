//! Multi-file ingestion entrypoint.
//!
//! [`ingest_files`] loads the format-config library, runs every per-file stage on the
//! [`ExecutionEngine`] and combines the surviving files into one [`CombinedDataset`].
//!
//! - A file that fails a stage is excluded from the load; its siblings are unaffected.
//! - If no file survives a stage the whole load fails with [`BurnInError::NoValidFiles`].
//! - If an [`IngestionObserver`] is provided, per-file successes, failures and alerts are
//!   reported to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::error::{BurnInError, BurnInResult};
use crate::execution::{
    ExecutionEngine, ExecutionMetricsSnapshot, ExecutionObserver, ExecutionOptions, StageItem,
    StageSummary,
};
use crate::types::CombinedDataset;

use super::combine::combine;
use super::config::ConfigLibrary;
use super::encoding::EncodingTag;
use super::file::FileState;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Lines searched for identifying and header patterns when nothing else is configured.
pub const DEFAULT_HEADER_LINE_LIMIT: usize = 256;

/// Tolerated equipment-off time before a span is trimmed.
pub const DEFAULT_MAX_OFF_TIME: Duration = Duration::from_secs(5 * 60);

const SHORT_MAX_OFF_TIME: Duration = Duration::from_secs(3 * 60);

/// Options controlling a load.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Lines searched for the identifying and header patterns.
    pub header_line_limit: usize,
    /// Tolerated continuous equipment-off time.
    pub max_off_time: Duration,
    /// Whether equipment-off spans are trimmed.
    pub do_trim: bool,
    /// Thread pool and throttling for the per-file stages.
    pub execution: ExecutionOptions,
    /// Optional observer for per-file outcomes.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Optional observer for stage engine events.
    pub execution_observer: Option<Arc<dyn ExecutionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("header_line_limit", &self.header_line_limit)
            .field("max_off_time", &self.max_off_time)
            .field("do_trim", &self.do_trim)
            .field("execution", &self.execution)
            .field("observer_set", &self.observer.is_some())
            .field("execution_observer_set", &self.execution_observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            header_line_limit: DEFAULT_HEADER_LINE_LIMIT,
            max_off_time: DEFAULT_MAX_OFF_TIME,
            do_trim: true,
            execution: ExecutionOptions::default(),
            observer: None,
            execution_observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    /// Reject unusable limits. Warns when the off-time tolerance is unusually short.
    pub fn validate(&self) -> BurnInResult<()> {
        if self.header_line_limit == 0 {
            return Err(BurnInError::invalid_argument("header_line_limit must be > 0"));
        }
        if self.max_off_time.is_zero() {
            return Err(BurnInError::invalid_argument("max_off_time must be > 0"));
        }
        if self.do_trim && self.max_off_time < SHORT_MAX_OFF_TIME {
            warn!(
                "max_off_time of {:?} is below {:?}; short pauses will be trimmed",
                self.max_off_time, SHORT_MAX_OFF_TIME
            );
        }
        Ok(())
    }
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    /// Position in the caller's input list.
    pub index: usize,
    pub path: PathBuf,
    pub encoding: EncodingTag,
    /// Name of the matched format config.
    pub config: Option<String>,
    /// Rows contributed after trimming.
    pub rows: usize,
    pub trimmed_rows: usize,
    /// Rendered error for an excluded file.
    pub error: Option<String>,
    pub failed_stage: Option<&'static str>,
}

impl FileOutcome {
    fn from_state(state: &FileState) -> Self {
        Self {
            index: state.index,
            path: state.path.clone(),
            encoding: state.encoding,
            config: state.config.as_ref().map(|c| c.name.clone()),
            rows: state.parsed.rows,
            trimmed_rows: state.trimmed_rows,
            error: state.error.as_ref().map(|e| e.to_string()),
            failed_stage: state.failed_stage,
        }
    }

    /// `true` if the file made it into the combined dataset.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub dataset: CombinedDataset,
    /// One entry per input path, in input order.
    pub outcomes: Vec<FileOutcome>,
    pub metrics: ExecutionMetricsSnapshot,
}

impl IngestionReport {
    /// Outcomes of files that were excluded.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }
}

/// Load the format configs at `config_location` and ingest `paths`.
///
/// `config_location` is a directory of `*.json` documents or a single document. A missing
/// location or two configs sharing a name abort the load.
///
/// # Examples
///
/// ```no_run
/// use burnin_data_processing::ingestion::{ingest_files, IngestionOptions};
///
/// # fn main() -> Result<(), burnin_data_processing::BurnInError> {
/// let report = ingest_files(
///     &["logs/rack1_a.csv", "logs/rack1_b.csv"],
///     "configs",
///     &IngestionOptions::default(),
/// )?;
/// println!("rows={}", report.dataset.row_count);
/// # Ok(())
/// # }
/// ```
pub fn ingest_files<P: AsRef<Path>>(
    paths: &[P],
    config_location: impl AsRef<Path>,
    options: &IngestionOptions,
) -> BurnInResult<IngestionReport> {
    let library = ConfigLibrary::load(config_location)?;
    ingest_with_library(paths, &library, options)
}

/// Ingest `paths` against an already loaded config library.
pub fn ingest_with_library<P: AsRef<Path>>(
    paths: &[P],
    library: &ConfigLibrary,
    options: &IngestionOptions,
) -> BurnInResult<IngestionReport> {
    options.validate()?;
    if paths.is_empty() {
        return Err(BurnInError::NoValidFiles {
            stage: "input".to_string(),
        });
    }
    if library.is_empty() {
        return Err(BurnInError::config("no usable format configs were loaded"));
    }

    let mut engine = ExecutionEngine::new(options.execution.clone())?;
    if let Some(obs) = &options.execution_observer {
        engine = engine.with_observer(Arc::clone(obs));
    }

    let mut files: Vec<FileState> = paths
        .iter()
        .enumerate()
        .map(|(i, p)| FileState::new(i, p.as_ref()))
        .collect();

    let started = engine.begin_run(files.len());
    let result = run_stages(&engine, &mut files, library, options);
    engine.finish_run(started);

    let outcomes: Vec<FileOutcome> = files.iter().map(FileOutcome::from_state).collect();
    report_failures(&files, options);
    result?;

    let dataset = combine(files)?;
    for outcome in outcomes.iter().filter(|o| o.is_ok()) {
        report_success(outcome, options);
    }

    info!(
        "loaded {} of {} files: {} rows, {} columns",
        dataset.boundaries.len(),
        outcomes.len(),
        dataset.row_count,
        dataset.schema.len()
    );
    Ok(IngestionReport {
        dataset,
        outcomes,
        metrics: engine.metrics().snapshot(),
    })
}

fn run_stages(
    engine: &ExecutionEngine,
    files: &mut [FileState],
    library: &ConfigLibrary,
    options: &IngestionOptions,
) -> BurnInResult<()> {
    let limit = options.header_line_limit;
    let max_off = options.max_off_time;

    check("read", engine.run_stage("read", files, FileState::read))?;
    check("decode", engine.run_stage("decode", files, FileState::decode))?;
    check(
        "split_lines",
        engine.run_stage("split_lines", files, FileState::split_lines),
    )?;
    check(
        "match_format",
        engine.run_stage("match_format", files, |f| f.match_format(library, limit)),
    )?;
    check(
        "header",
        engine.run_stage("header", files, |f| f.scan_header(limit)),
    )?;
    check(
        "start_time",
        engine.run_stage("start_time", files, FileState::scan_start_time),
    )?;
    check(
        "columns",
        engine.run_stage("columns", files, FileState::scan_columns),
    )?;
    check(
        "interval",
        engine.run_stage("interval", files, FileState::scan_interval),
    )?;
    check("parse", engine.run_stage("parse", files, FileState::parse))?;
    if options.do_trim {
        check("trim", engine.run_stage("trim", files, |f| f.trim(max_off)))?;
    }
    Ok(())
}

fn check(stage: &str, summary: StageSummary) -> BurnInResult<()> {
    if summary.remaining() == 0 {
        return Err(BurnInError::NoValidFiles {
            stage: stage.to_string(),
        });
    }
    Ok(())
}

fn report_failures(files: &[FileState], options: &IngestionOptions) {
    let Some(obs) = &options.observer else {
        return;
    };
    for file in files.iter().filter(|f| !f.is_active()) {
        let Some(err) = &file.error else { continue };
        let ctx = IngestionContext {
            path: file.path.clone(),
            stage: file.failed_stage.unwrap_or("unknown"),
        };
        let severity = IngestionSeverity::for_error(err);
        obs.on_failure(&ctx, severity, err);
        if severity >= options.alert_at_or_above {
            obs.on_alert(&ctx, severity, err);
        }
    }
}

fn report_success(outcome: &FileOutcome, options: &IngestionOptions) {
    if let Some(obs) = &options.observer {
        let ctx = IngestionContext {
            path: outcome.path.clone(),
            stage: "combine",
        };
        obs.on_success(
            &ctx,
            IngestionStats {
                rows: outcome.rows,
                trimmed_rows: outcome.trimmed_rows,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_documented_values() {
        let opts = IngestionOptions::default();
        assert_eq!(opts.header_line_limit, 256);
        assert_eq!(opts.max_off_time, Duration::from_secs(300));
        assert!(opts.do_trim);
        assert_eq!(opts.alert_at_or_above, IngestionSeverity::Critical);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let opts = IngestionOptions {
            header_line_limit: 0,
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(BurnInError::InvalidArgument { .. })
        ));

        let opts = IngestionOptions {
            max_off_time: Duration::ZERO,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn empty_input_reports_input_stage() {
        let library = ConfigLibrary::default();
        let paths: [&str; 0] = [];
        let err = ingest_with_library(&paths, &library, &IngestionOptions::default()).unwrap_err();
        assert!(matches!(err, BurnInError::NoValidFiles { ref stage } if stage == "input"));
    }

    #[test]
    fn missing_files_fail_at_read_stage() {
        let library = ConfigLibrary::from_configs([crate::ingestion::config::FormatConfig::from_json_str(
            r#"{"name": "a", "file_identifier": "^x$", "titles": [], "types": []}"#,
        )
        .unwrap()])
        .unwrap();
        let err = ingest_with_library(
            &["/definitely/not/here.csv"],
            &library,
            &IngestionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BurnInError::NoValidFiles { ref stage } if stage == "read"));
    }
}
