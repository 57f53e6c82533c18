//! The spreadsheet-style session a host application drives.
//!
//! A [`Session`] owns the combined dataset of one file set, the columns currently loaded out of
//! it, the active [`FilterSet`] and the reductions applied so far. Every public operation
//! returns `bool` or `Option`: errors never escape, they are logged and appended to an
//! in-memory diagnostic log ([`Session::diagnostics`]). A failed operation leaves the session
//! as it was.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use burnin_data_processing::processing::{AveragingKind, ReductionKind};
//! use burnin_data_processing::Session;
//!
//! let mut session = Session::new();
//! let files = ["logs/rack1_a.csv", "logs/rack1_b.csv"];
//! if session.load(&files, "configs", 256, Duration::from_secs(300), true) {
//!     session.load_column("Laser Power");
//!     session.filter("Laser Power", 0.5, 3, 0);
//!     session.reduce(ReductionKind::Cycle, AveragingKind::StableMean, 1, 0);
//!     println!("{} cycles", session.row_count());
//! }
//! for d in session.take_diagnostics() {
//!     eprintln!("{}: {}", d.operation, d.message);
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};

use crate::error::{BurnInError, BurnInResult};
use crate::ingestion::{ingest_files, FileOutcome, IngestionOptions, IngestionSeverity};
use crate::processing::{
    filter_column, AveragingKind, ColumnEntry, FilterSet, ReductionKind, ReductionPlan,
    ReductionState, MAX_COLS, MAX_ROWS,
};
use crate::types::{ColumnData, CombinedDataset, DataType, FileBoundary};

/// One failed operation, kept for later inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Name of the public operation that failed.
    pub operation: &'static str,
    pub severity: IngestionSeverity,
    pub message: String,
}

/// Session state: combined dataset, loaded columns, filter and reduction history.
#[derive(Debug, Default)]
pub struct Session {
    options: IngestionOptions,
    files: Vec<PathBuf>,
    config_location: Option<PathBuf>,
    dataset: CombinedDataset,
    outcomes: Vec<FileOutcome>,
    active: BTreeMap<String, ColumnEntry>,
    /// Unfiltered length of every active column.
    rows: usize,
    filter: FilterSet,
    reduction: ReductionState,
    /// Reductions applied since the last load, replayed on newly loaded columns.
    history: Vec<ReductionPlan>,
    initialized: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    /// An empty, uninitialized session with default ingestion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty session whose loads use `options` (observers, thread pool, limits).
    pub fn with_options(options: IngestionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// `true` once a load has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ---- loading ------------------------------------------------------------------------

    /// Ingest `files` with the configs at `config_location`, replacing the current dataset.
    pub fn load<P: AsRef<Path>>(
        &mut self,
        files: &[P],
        config_location: impl AsRef<Path>,
        header_line_limit: usize,
        max_off_time: Duration,
        do_trim: bool,
    ) -> bool {
        let options = IngestionOptions {
            header_line_limit,
            max_off_time,
            do_trim,
            ..self.options.clone()
        };
        self.load_with_options(files, config_location, &options)
    }

    /// Ingest `files` with explicit options, replacing the current dataset.
    pub fn load_with_options<P: AsRef<Path>>(
        &mut self,
        files: &[P],
        config_location: impl AsRef<Path>,
        options: &IngestionOptions,
    ) -> bool {
        let files: Vec<PathBuf> = files.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let location = config_location.as_ref().to_path_buf();
        let result = self.reingest(files, location, options.clone());
        self.guard("load", result).is_some()
    }

    /// Add one file to the current set and re-ingest.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> bool {
        self.add_files(&[path])
    }

    /// Add files to the current set and re-ingest.
    pub fn add_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> bool {
        let result = self.require_initialized().and_then(|location| {
            let mut files = self.files.clone();
            files.extend(paths.iter().map(|p| p.as_ref().to_path_buf()));
            self.reingest(files, location, self.options.clone())
        });
        self.guard("add_files", result).is_some()
    }

    /// Remove the file at `index` and re-ingest.
    pub fn remove_file(&mut self, index: usize) -> bool {
        self.remove_files(&[index])
    }

    /// Remove files by position and re-ingest.
    ///
    /// Duplicate indexes are ignored. Removing every file resets the session.
    pub fn remove_files(&mut self, indexes: &[usize]) -> bool {
        let result = self.try_remove_files(indexes);
        self.guard("remove_files", result).is_some()
    }

    fn try_remove_files(&mut self, indexes: &[usize]) -> BurnInResult<()> {
        let location = self.require_initialized()?;
        let mut sorted = indexes.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        if let Some(&bad) = sorted.iter().find(|&&i| i >= self.files.len()) {
            return Err(BurnInError::invalid_argument(format!(
                "file index {bad} out of range (0..{})",
                self.files.len()
            )));
        }
        let mut files = self.files.clone();
        for i in sorted {
            files.remove(i);
        }
        if files.is_empty() {
            info!("every file removed; resetting session");
            self.clear_all();
            return Ok(());
        }
        self.reingest(files, location, self.options.clone())
    }

    fn require_initialized(&self) -> BurnInResult<PathBuf> {
        match (&self.config_location, self.initialized) {
            (Some(loc), true) => Ok(loc.clone()),
            _ => Err(BurnInError::invalid_argument("session has not been loaded")),
        }
    }

    /// Full ingestion of `files`; on success replaces the dataset and reloads active columns.
    fn reingest(
        &mut self,
        files: Vec<PathBuf>,
        location: PathBuf,
        options: IngestionOptions,
    ) -> BurnInResult<()> {
        let report = ingest_files(&files, &location, &options)?;
        for failure in report.failures() {
            self.diagnostics.push(Diagnostic {
                operation: "load",
                severity: IngestionSeverity::Error,
                message: format!(
                    "{} excluded at stage '{}': {}",
                    failure.path.display(),
                    failure.failed_stage.unwrap_or("unknown"),
                    failure.error.as_deref().unwrap_or_default()
                ),
            });
        }

        let previously_loaded: Vec<String> = self.active.keys().cloned().collect();
        self.dataset = report.dataset;
        self.outcomes = report.outcomes;
        self.files = files;
        self.config_location = Some(location);
        self.options = options;
        self.initialized = true;
        self.reset_columns(previously_loaded);
        self.replay_reduction_state();
        Ok(())
    }

    /// Reload `titles` unreduced and unfiltered from the combined dataset.
    fn reset_columns(&mut self, titles: Vec<String>) {
        self.active.clear();
        self.filter.clear();
        self.history.clear();
        self.rows = self.dataset.row_count;
        for title in titles {
            match self.dataset.column(&title) {
                Some(data) => {
                    self.active.insert(title, ColumnEntry::new(data.clone()));
                }
                None => warn!("column '{title}' is not available after reload"),
            }
        }
    }

    /// Apply the remembered reduction state to freshly loaded, unfiltered columns.
    fn replay_reduction_state(&mut self) {
        if self.reduction.kind == ReductionKind::None && self.rows <= MAX_ROWS {
            return;
        }
        let state = self.reduction;
        match ReductionPlan::new(&state, &self.filter, self.rows) {
            Ok(plan) => self.apply_plan(plan),
            Err(err) => warn!("reduction state {state:?} left unapplied after reload: {err}"),
        }
    }

    // ---- membership ---------------------------------------------------------------------

    /// Input paths of the current file set.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Per-file outcomes of the last successful load, in input order.
    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    /// Where each combined file begins on the synthetic time axis.
    pub fn file_boundaries(&self) -> &[FileBoundary] {
        &self.dataset.boundaries
    }

    /// The combined, unreduced dataset.
    pub fn dataset(&self) -> &CombinedDataset {
        &self.dataset
    }

    // ---- columns ------------------------------------------------------------------------

    /// Every column title in the combined dataset.
    pub fn available_columns(&self) -> Vec<String> {
        self.dataset.titles()
    }

    /// Titles of the loaded columns, in title order.
    pub fn loaded_columns(&self) -> Vec<String> {
        self.active.keys().cloned().collect()
    }

    pub fn load_column(&mut self, title: &str) -> bool {
        self.load_columns(&[title])
    }

    /// Load columns from the combined dataset, applying every reduction made so far.
    ///
    /// All titles are checked before any is loaded. Already loaded titles are left alone.
    pub fn load_columns<S: AsRef<str>>(&mut self, titles: &[S]) -> bool {
        let result = self.try_load_columns(titles);
        self.guard("load_columns", result).is_some()
    }

    fn try_load_columns<S: AsRef<str>>(&mut self, titles: &[S]) -> BurnInResult<()> {
        if !self.initialized {
            return Err(BurnInError::invalid_argument("session has not been loaded"));
        }
        let mut new_titles: Vec<&str> = Vec::new();
        for title in titles.iter().map(|t| t.as_ref()) {
            if self.dataset.column(title).is_none() {
                return Err(BurnInError::unknown_column(title));
            }
            if !self.active.contains_key(title) && !new_titles.contains(&title) {
                new_titles.push(title);
            }
        }
        if self.active.len() + new_titles.len() > MAX_COLS {
            return Err(BurnInError::invalid_argument(format!(
                "loading {} more columns would exceed the {MAX_COLS} column limit",
                new_titles.len()
            )));
        }
        let mut loaded = Vec::with_capacity(new_titles.len());
        for title in new_titles {
            let Some(data) = self.dataset.column(title) else {
                return Err(BurnInError::unknown_column(title));
            };
            let mut entry = ColumnEntry::new(data.clone());
            for plan in &self.history {
                entry = plan.apply(&entry);
            }
            if entry.len() != self.rows {
                return Err(BurnInError::LengthMismatch {
                    column: title.to_string(),
                    expected: self.rows,
                    actual: entry.len(),
                });
            }
            loaded.push((title.to_string(), entry));
        }
        self.active.extend(loaded);
        Ok(())
    }

    pub fn unload_column(&mut self, title: &str) -> bool {
        self.unload_columns(&[title])
    }

    /// Drop loaded columns. Every title must be loaded.
    pub fn unload_columns<S: AsRef<str>>(&mut self, titles: &[S]) -> bool {
        let result = titles
            .iter()
            .map(|t| t.as_ref())
            .find(|t| !self.active.contains_key(*t))
            .map_or(Ok(()), |t| Err(BurnInError::unknown_column(t)));
        if self.guard("unload_columns", result).is_none() {
            return false;
        }
        for title in titles {
            self.active.remove(title.as_ref());
        }
        true
    }

    // ---- filtering and reduction --------------------------------------------------------

    /// Replace the active filter with the runs of `title` above `cutoff` of its span.
    pub fn filter(&mut self, title: &str, cutoff: f64, debounce: usize, max_range_len: usize) -> bool {
        let result = self.try_filter(title, cutoff, debounce, max_range_len);
        self.guard("filter", result).is_some()
    }

    fn try_filter(&mut self, title: &str, cutoff: f64, debounce: usize, max_range_len: usize) -> BurnInResult<()> {
        if !(0.0..1.0).contains(&cutoff) {
            return Err(BurnInError::invalid_argument(format!(
                "cutoff must satisfy 0 <= cutoff < 1 (got {cutoff})"
            )));
        }
        let entry = self
            .active
            .get(title)
            .ok_or_else(|| BurnInError::unknown_column(title))?;
        if !entry.data.data_type().is_numeric() {
            return Err(BurnInError::TypeMismatch {
                column: title.to_string(),
                message: "only numeric columns can be filtered".to_string(),
            });
        }
        if cutoff == 0.0 && max_range_len == 1 {
            return Ok(());
        }
        self.filter = filter_column(title, &entry.data, cutoff, debounce, max_range_len)?;
        Ok(())
    }

    /// Reduce every loaded column.
    ///
    /// The request is validated before any column changes. When a stage runs, the filter is
    /// consumed and cleared.
    pub fn reduce(
        &mut self,
        kind: ReductionKind,
        averaging: AveragingKind,
        group_size: usize,
        point_count: usize,
    ) -> bool {
        let state = ReductionState {
            kind,
            averaging,
            group_size,
            point_count,
        };
        let result = self.try_reduce(state);
        self.guard("reduce", result).is_some()
    }

    fn try_reduce(&mut self, state: ReductionState) -> BurnInResult<()> {
        if !self.initialized {
            return Err(BurnInError::invalid_argument("session has not been loaded"));
        }
        if let Some((title, entry)) = self.active.iter().find(|(_, e)| e.len() != self.rows) {
            return Err(BurnInError::LengthMismatch {
                column: title.clone(),
                expected: self.rows,
                actual: entry.len(),
            });
        }
        let plan = ReductionPlan::new(&state, &self.filter, self.rows)?;
        self.reduction = state;
        self.apply_plan(plan);
        Ok(())
    }

    fn apply_plan(&mut self, plan: ReductionPlan) {
        if plan.is_noop() {
            return;
        }
        let reduced: BTreeMap<String, ColumnEntry> = self
            .active
            .iter()
            .map(|(title, entry)| (title.clone(), plan.apply(entry)))
            .collect();
        info!(
            "reduced {} columns from {} to {} rows ({:?})",
            reduced.len(),
            self.rows,
            plan.output_rows,
            plan.stages
        );
        self.active = reduced;
        self.rows = plan.output_rows;
        self.filter.clear();
        self.history.push(plan);
    }

    /// The most recently requested reduction.
    pub fn reduction_state(&self) -> ReductionState {
        self.reduction
    }

    /// The active filter (empty: every row).
    pub fn filter_set(&self) -> &FilterSet {
        &self.filter
    }

    /// Rows returned by the getters: the filtered row count when a filter is active.
    pub fn row_count(&self) -> usize {
        if self.filter.is_empty() {
            self.rows
        } else {
            self.filter.row_count()
        }
    }

    // ---- access -------------------------------------------------------------------------

    /// A loaded column's values, restricted to the active filter.
    pub fn get(&self, title: &str) -> Option<ColumnData> {
        let entry = self.active.get(title)?;
        if self.filter.is_empty() {
            Some(entry.data.clone())
        } else {
            Some(entry.data.gather(&self.filter.as_ranges()))
        }
    }

    pub fn get_integers(&self, title: &str) -> Option<Vec<i64>> {
        match self.get(title)? {
            ColumnData::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_doubles(&self, title: &str) -> Option<Vec<f64>> {
        match self.get(title)? {
            ColumnData::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_strings(&self, title: &str) -> Option<Vec<String>> {
        match self.get(title)? {
            ColumnData::String(v) => Some(v),
            _ => None,
        }
    }

    /// Dispersion values of a loaded column, restricted to the active filter.
    pub fn get_error(&self, title: &str) -> Option<Vec<f64>> {
        let entry = self.active.get(title)?;
        if self.filter.is_empty() {
            Some(entry.errors.clone())
        } else {
            Some(entry.gather(&self.filter.as_ranges()).errors)
        }
    }

    /// `true` if `title` is loaded.
    pub fn contains(&self, title: &str) -> bool {
        self.active.contains_key(title)
    }

    /// Type of any available column; [`DataType::None`] if unknown.
    pub fn type_of(&self, title: &str) -> DataType {
        self.dataset.type_of(title)
    }

    // ---- resets -------------------------------------------------------------------------

    /// Reload every active column unreduced and unfiltered; forget reductions.
    pub fn clear_changes(&mut self) -> bool {
        if !self.initialized {
            let result: BurnInResult<()> =
                Err(BurnInError::invalid_argument("session has not been loaded"));
            return self.guard("clear_changes", result).is_some();
        }
        let titles = self.loaded_columns();
        self.reduction = ReductionState::default();
        self.reset_columns(titles);
        true
    }

    /// Reset to an empty, uninitialized session. Options and diagnostics are kept.
    pub fn clear_all(&mut self) {
        let options = std::mem::take(&mut self.options);
        let diagnostics = std::mem::take(&mut self.diagnostics);
        *self = Self {
            options,
            diagnostics,
            ..Self::default()
        };
    }

    // ---- diagnostics --------------------------------------------------------------------

    /// Failures recorded so far, oldest first.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the diagnostic log.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn guard<T>(&mut self, operation: &'static str, result: BurnInResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(err) => {
                let severity = IngestionSeverity::for_error(&err);
                match severity {
                    IngestionSeverity::Info | IngestionSeverity::Warning => {
                        warn!("{operation} failed: {err}")
                    }
                    _ => log::error!("{operation} failed: {err}"),
                }
                self.diagnostics.push(Diagnostic {
                    operation,
                    severity,
                    message: err.to_string(),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Schema, COMBINED_TIME};

    fn sample_session() -> Session {
        let power = ColumnData::Integer(vec![0, 0, 0, 10, 10, 10, 0, 0, 8, 8]);
        let temp = ColumnData::Double((0..10).map(|i| 20.0 + i as f64).collect());
        let tag = ColumnData::String((0..10).map(|i| format!("s{i}")).collect());
        let time = ColumnData::Double((0..10).map(f64::from).collect());
        let mut columns = BTreeMap::new();
        columns.insert("Power".to_string(), power);
        columns.insert("Temp".to_string(), temp);
        columns.insert("Tag".to_string(), tag);
        columns.insert(COMBINED_TIME.to_string(), time);
        let dataset = CombinedDataset {
            schema: Schema::new(vec![
                Field::new("Power", DataType::Integer),
                Field::new("Temp", DataType::Double),
                Field::new("Tag", DataType::String),
                Field::new(COMBINED_TIME, DataType::Double),
            ]),
            columns,
            time_axis: (0..10).map(f64::from).collect(),
            row_count: 10,
            ..Default::default()
        };
        Session {
            rows: dataset.row_count,
            dataset,
            initialized: true,
            config_location: Some(PathBuf::from("configs")),
            files: vec![PathBuf::from("a.csv")],
            ..Session::default()
        }
    }

    #[test]
    fn load_and_unload_columns() {
        let mut s = sample_session();
        assert!(s.load_columns(&["Power", "Temp"]));
        assert!(s.contains("Power"));
        assert_eq!(s.loaded_columns(), vec!["Power", "Temp"]);
        assert!(!s.load_column("Missing"));
        assert_eq!(s.diagnostics().len(), 1);
        assert_eq!(s.diagnostics()[0].operation, "load_columns");
        assert!(s.unload_column("Temp"));
        assert!(!s.unload_column("Temp"));
        assert_eq!(s.type_of("Temp"), DataType::Double);
        assert_eq!(s.type_of("Nope"), DataType::None);
        assert!(s.get_error("Power").unwrap().iter().all(|e| e.is_nan()));
    }

    #[test]
    fn filter_restricts_getters() {
        let mut s = sample_session();
        s.load_columns(&["Power", "Tag"]);
        assert!(s.filter("Power", 0.5, 1, 0));
        assert_eq!(s.filter_set().len(), 2);
        // The run still open at the end stops before the last row.
        assert_eq!(s.row_count(), 4);
        assert_eq!(s.get_integers("Power").unwrap(), vec![10, 10, 10, 8]);
        assert_eq!(s.get_strings("Tag").unwrap().len(), 4);
        assert!(s.get_doubles("Power").is_none());
    }

    #[test]
    fn invalid_filter_leaves_state_unchanged() {
        let mut s = sample_session();
        s.load_columns(&["Power", "Tag"]);
        assert!(s.filter("Power", 0.5, 1, 0));
        let before = s.filter_set().clone();
        assert!(!s.filter("Power", 1.0, 1, 0));
        assert!(!s.filter("Tag", 0.5, 1, 0));
        assert!(!s.filter("Temp", 0.5, 1, 0));
        assert_eq!(s.filter_set(), &before);
        assert_eq!(s.diagnostics().len(), 3);
        // Zero cutoff with unit range length does nothing.
        assert!(s.filter("Power", 0.0, 1, 1));
        assert_eq!(s.filter_set(), &before);
    }

    #[test]
    fn cycle_reduction_collapses_ranges() {
        let mut s = sample_session();
        s.load_columns(&["Power", "Temp", "Tag"]);
        assert!(!s.reduce(ReductionKind::Cycle, AveragingKind::OverallMean, 1, 0));
        assert!(s.filter("Power", 0.5, 1, 0));
        assert!(s.reduce(ReductionKind::Cycle, AveragingKind::OverallMean, 1, 0));
        assert!(s.filter_set().is_empty());
        assert_eq!(s.row_count(), 2);
        assert_eq!(s.get_integers("Power").unwrap(), vec![10, 8]);
        assert_eq!(s.get_doubles("Temp").unwrap(), vec![24.0, 28.0]);
        assert_eq!(s.get_strings("Tag").unwrap(), vec!["s3, s4, s5", "s8"]);
        assert_eq!(s.reduction_state().kind, ReductionKind::Cycle);

        // A column loaded afterwards receives the same reduction.
        assert!(s.load_column(COMBINED_TIME));
        assert_eq!(s.get_doubles(COMBINED_TIME).unwrap(), vec![4.0, 8.0]);
    }

    #[test]
    fn rejected_reduction_changes_nothing() {
        let mut s = sample_session();
        s.load_columns(&["Power"]);
        assert!(!s.reduce(ReductionKind::Cycle, AveragingKind::OverallMean, 1, 0));
        assert_eq!(s.row_count(), 10);
        assert_eq!(s.reduction_state(), ReductionState::default());
        assert_eq!(s.diagnostics().len(), 1);
    }

    #[test]
    fn zero_group_and_point_counts_do_nothing() {
        let mut s = sample_session();
        s.load_columns(&["Power"]);
        assert!(s.filter("Power", 0.5, 1, 0));
        assert!(s.reduce(ReductionKind::NGroup, AveragingKind::OverallMean, 0, 0));
        assert!(s.reduce(ReductionKind::NPoints, AveragingKind::OverallMean, 1, 0));
        assert_eq!(s.filter_set().len(), 2);
        assert!(s.reduce(ReductionKind::All, AveragingKind::StableMean, 1, 0));
        assert_eq!(s.row_count(), 2);
        assert_eq!(s.get_integers("Power").unwrap(), vec![10, 8]);
    }

    #[test]
    fn column_ceiling_rejects_the_whole_request() {
        let mut s = sample_session();
        let pad = ColumnEntry::new(ColumnData::Integer(vec![0; 10]));
        for i in 0..MAX_COLS - 1 {
            s.active.insert(format!("pad{i}"), pad.clone());
        }
        assert!(!s.load_columns(&["Power", "Temp"]));
        assert!(!s.contains("Power"));
        assert!(!s.contains("Temp"));
        assert_eq!(s.active.len(), MAX_COLS - 1);
        assert!(s.load_column("Power"));
        assert_eq!(s.active.len(), MAX_COLS);
    }

    #[test]
    fn clear_changes_restores_unreduced_columns() {
        let mut s = sample_session();
        s.load_columns(&["Power"]);
        assert!(s.reduce(ReductionKind::NPoints, AveragingKind::OverallMean, 1, 3));
        assert_eq!(s.row_count(), 3);
        assert!(s.clear_changes());
        assert_eq!(s.row_count(), 10);
        assert_eq!(s.get_integers("Power").unwrap().len(), 10);
        assert_eq!(s.reduction_state(), ReductionState::default());
    }

    #[test]
    fn clear_all_resets_everything() {
        let mut s = sample_session();
        s.load_columns(&["Power"]);
        s.clear_all();
        assert!(!s.is_initialized());
        assert!(s.available_columns().is_empty());
        assert!(s.loaded_columns().is_empty());
        assert!(!s.load_column("Power"));
        assert!(!s.clear_changes());
    }

    #[test]
    fn out_of_range_removal_fails() {
        let mut s = sample_session();
        assert!(!s.remove_files(&[0, 4]));
        assert_eq!(s.files().len(), 1);
        assert!(s.is_initialized());
    }
}
