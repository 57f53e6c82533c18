//! Per-file ingestion state and the stage functions that advance it.
//!
//! A [`FileState`] is created for every input path at the start of a load and dropped once its
//! rows have been copied into the combined dataset. Each stage function takes the state by
//! `&mut` and fails with a [`BurnInError`]; the pipeline records the first failure on the state,
//! which excludes the file from every later stage.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use log::debug;

use crate::error::{BurnInError, BurnInResult};
use crate::execution::StageItem;
use crate::types::{Schema, COMBINED_TIME};

use super::config::{ConfigLibrary, FormatConfig};
use super::encoding::{decode, detect_encoding, split_lines, EncodingTag};
use super::header::{
    find_header_boundary, scan_columns, scan_interval, scan_start_time, Interval, IntervalMethod,
    StartTimeMethod,
};
use super::matcher::match_format;
use super::parser::{automatic_interval, parse_data, FieldSplitter, ParsedData};
use super::trim::trim_file;

/// Everything known about one input file during a load.
#[derive(Debug)]
pub struct FileState {
    /// Position of the file in the caller's input list.
    pub index: usize,
    pub path: PathBuf,
    /// Raw bytes; emptied once decoded.
    pub raw: Vec<u8>,
    pub encoding: EncodingTag,
    /// Decoded text that the line spans index into.
    pub text: String,
    /// Byte spans of each line within `text`.
    pub lines: Vec<Range<usize>>,
    pub config: Option<Arc<FormatConfig>>,
    /// Index of the first data line.
    pub header_end: usize,
    pub schema: Schema,
    pub start_time: NaiveDateTime,
    pub interval: Option<Interval>,
    pub parsed: ParsedData,
    /// Rows removed by trimming.
    pub trimmed_rows: usize,
    /// First stage failure, if any. A file with an error takes no further part in the load.
    pub error: Option<BurnInError>,
    /// Stage that produced `error`.
    pub failed_stage: Option<&'static str>,
}

impl FileState {
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
            raw: Vec::new(),
            encoding: EncodingTag::Unknown,
            text: String::new(),
            lines: Vec::new(),
            config: None,
            header_end: 0,
            schema: Schema::default(),
            start_time: NaiveDateTime::default(),
            interval: None,
            parsed: ParsedData::default(),
            trimmed_rows: 0,
            error: None,
            failed_stage: None,
        }
    }

    /// `true` while no stage has failed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// File name used in boundary tables and logs.
    pub fn label(&self) -> String {
        file_label(&self.path)
    }

    /// Borrowed views of every line.
    pub fn line_views(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(|span| &self.text[span.clone()])
            .collect()
    }

    /// Measurement interval in seconds, once resolved.
    pub fn interval_secs(&self) -> Option<f64> {
        match self.interval {
            Some(Interval::Known(secs)) => Some(secs),
            _ => None,
        }
    }

    fn config(&self) -> BurnInResult<&Arc<FormatConfig>> {
        self.config.as_ref().ok_or_else(|| BurnInError::NoFormatMatch {
            path: self.path.display().to_string(),
        })
    }

    /// Read the file's bytes.
    pub fn read(&mut self) -> BurnInResult<()> {
        self.raw = fs::read(&self.path)?;
        Ok(())
    }

    /// Detect the byte-order mark and decode the body to text, releasing the raw bytes.
    pub fn decode(&mut self) -> BurnInResult<()> {
        let raw = std::mem::take(&mut self.raw);
        let (tag, body) = detect_encoding(&raw);
        self.encoding = tag;
        self.text = decode(tag, body);
        Ok(())
    }

    /// Record the span of every line in the decoded text.
    pub fn split_lines(&mut self) -> BurnInResult<()> {
        let base = self.text.as_ptr() as usize;
        self.lines = split_lines(&self.text)
            .into_iter()
            .map(|line| {
                let start = line.as_ptr() as usize - base;
                start..start + line.len()
            })
            .collect();
        Ok(())
    }

    /// Select the format config that identifies this file.
    pub fn match_format(&mut self, library: &ConfigLibrary, limit: usize) -> BurnInResult<()> {
        let matched = match_format(library, &self.line_views(), limit).ok_or_else(|| {
            BurnInError::NoFormatMatch {
                path: self.path.display().to_string(),
            }
        })?;
        debug!("{} matched config '{}'", self.label(), matched.name);
        self.config = Some(matched);
        Ok(())
    }

    /// Locate the first data line.
    pub fn scan_header(&mut self, limit: usize) -> BurnInResult<()> {
        let boundary = find_header_boundary(self.config()?, &self.line_views(), limit)?;
        self.header_end = boundary;
        Ok(())
    }

    /// Locate the test start time.
    pub fn scan_start_time(&mut self) -> BurnInResult<()> {
        let cfg = Arc::clone(self.config()?);
        let method = StartTimeMethod::from_spec(cfg.start_time.as_ref())?;
        let splitter = FieldSplitter::new(&cfg.delim);
        self.start_time = scan_start_time(
            &method,
            &self.line_views(),
            self.header_end,
            &self.path,
            &splitter,
        );
        Ok(())
    }

    /// Read the declared column schema.
    pub fn scan_columns(&mut self) -> BurnInResult<()> {
        let mut schema = scan_columns(self.config()?)?;
        schema.fields.retain(|f| f.name != COMBINED_TIME);
        self.schema = schema;
        Ok(())
    }

    /// Locate the measurement interval, or defer it until data is parsed.
    pub fn scan_interval(&mut self) -> BurnInResult<()> {
        let cfg = Arc::clone(self.config()?);
        let method = IntervalMethod::from_spec(cfg.interval.as_ref())?;
        let interval = scan_interval(&method, &self.line_views(), self.header_end, &self.schema)?;
        self.interval = Some(interval);
        Ok(())
    }

    /// Parse data rows and resolve a deferred interval.
    pub fn parse(&mut self) -> BurnInResult<()> {
        let cfg = Arc::clone(self.config()?);
        let splitter = FieldSplitter::new(&cfg.delim);
        self.parsed = parse_data(&self.line_views(), self.header_end, &self.schema, &splitter)?;
        if let Some(Interval::Deferred { title }) = &self.interval {
            let secs = automatic_interval(&self.parsed, title)?;
            self.interval = Some(Interval::Known(secs));
        }
        // Line views are no longer needed.
        self.lines = Vec::new();
        self.text = String::new();
        debug!("{} parsed {} rows", self.label(), self.parsed.rows);
        Ok(())
    }

    /// Cut equipment-off spans.
    pub fn trim(&mut self, max_off: Duration) -> BurnInResult<()> {
        let cfg = Arc::clone(self.config()?);
        let interval = self.interval_secs().ok_or_else(|| BurnInError::Interval {
            message: "interval unresolved before trimming".to_string(),
        })?;
        self.trimmed_rows = trim_file(
            &mut self.parsed,
            cfg.trim_filter_key.as_deref(),
            interval,
            max_off,
        )?;
        Ok(())
    }
}

impl StageItem for FileState {
    fn is_active(&self) -> bool {
        self.is_ok()
    }

    fn fail(&mut self, stage: &'static str, error: BurnInError) {
        self.failed_stage = Some(stage);
        self.error = Some(error);
    }
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
