//! Data-row parsing into typed columns, plus automatic interval detection.
//!
//! Numeric cells are read the way `scanf` reads them: leading whitespace is skipped, the longest
//! numeric prefix is taken and anything unreadable becomes zero. A bad cell never fails a row.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::error::{BurnInError, BurnInResult};
use crate::types::{ColumnData, ColumnMap, ColumnStats, Schema};

static INTEGER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?\d+").expect("static integer pattern")
});

static DOUBLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?|(?i:infinity|inf|nan))")
        .expect("static float pattern")
});

/// Splits a line on any character of a delimiter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSplitter {
    delims: Vec<char>,
}

impl FieldSplitter {
    pub fn new(delim: &str) -> Self {
        Self {
            delims: delim.chars().collect(),
        }
    }

    /// The delimiter byte, when the set is exactly one ASCII character.
    pub fn single_byte(&self) -> Option<u8> {
        match self.delims.as_slice() {
            [c] if c.is_ascii() => Some(*c as u8),
            _ => None,
        }
    }

    /// Split `line` into fields. Empty fields between delimiters are kept; an empty field after
    /// a trailing delimiter is not.
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        if self.delims.is_empty() {
            return vec![line];
        }
        let mut fields: Vec<&str> = line.split(self.delims.as_slice()).collect();
        if fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        fields
    }
}

/// Read an integer prefix (`"12abc"` → 12, `"3.7"` → 3); unreadable input is 0.
pub fn scan_integer(raw: &str) -> i64 {
    INTEGER_PREFIX
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Read a floating point prefix (`"2.5e1x"` → 25.0); unreadable input is 0.0.
pub fn scan_double(raw: &str) -> f64 {
    DOUBLE_PREFIX
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Typed columns and their statistics for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedData {
    pub columns: ColumnMap,
    pub stats: BTreeMap<String, ColumnStats>,
    pub rows: usize,
}

impl ParsedData {
    /// Recompute statistics and the shared row count, failing if columns disagree in length.
    pub fn refresh(&mut self) -> BurnInResult<()> {
        let mut expected: Option<usize> = None;
        for (title, data) in &self.columns {
            let len = data.len();
            match expected {
                None => expected = Some(len),
                Some(n) if n != len => {
                    return Err(BurnInError::LengthMismatch {
                        column: title.clone(),
                        expected: n,
                        actual: len,
                    });
                }
                Some(_) => {}
            }
        }
        self.rows = expected.unwrap_or(0);
        self.stats = self
            .columns
            .iter()
            .map(|(title, data)| (title.clone(), data.stats()))
            .collect();
        Ok(())
    }
}

/// Parse every data row (from `header_end` to the end) into the schema's typed columns.
///
/// Rows whose fields are all blank are skipped. A row with too few fields yields the type's
/// default for the missing cells.
pub fn parse_data(
    lines: &[&str],
    header_end: usize,
    schema: &Schema,
    splitter: &FieldSplitter,
) -> BurnInResult<ParsedData> {
    let data_lines = lines.get(header_end..).unwrap_or_default();
    let mut columns: Vec<ColumnData> = schema
        .fields
        .iter()
        .map(|f| {
            ColumnData::with_capacity(f.data_type, data_lines.len()).ok_or_else(|| {
                BurnInError::SchemaMismatch {
                    message: format!("column '{}' has no usable type", f.name),
                }
            })
        })
        .collect::<BurnInResult<_>>()?;

    match splitter.single_byte() {
        Some(delim) => {
            let body = data_lines.join("\n");
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .quoting(false)
                .delimiter(delim)
                .from_reader(body.as_bytes());
            for record in reader.records() {
                let record = record?;
                let fields: Vec<&str> = record.iter().collect();
                push_row(&mut columns, &fields);
            }
        }
        None => {
            for line in data_lines {
                push_row(&mut columns, &splitter.split(line));
            }
        }
    }

    let mut parsed = ParsedData {
        columns: schema
            .fields
            .iter()
            .map(|f| f.name.clone())
            .zip(columns)
            .collect(),
        ..Default::default()
    };
    parsed.refresh()?;
    Ok(parsed)
}

fn push_row(columns: &mut [ColumnData], fields: &[&str]) {
    if fields.iter().all(|f| f.trim().is_empty()) {
        return;
    }
    for (idx, column) in columns.iter_mut().enumerate() {
        let raw = fields.get(idx).copied().unwrap_or("");
        match column {
            ColumnData::Integer(v) => v.push(scan_integer(raw)),
            ColumnData::Double(v) => v.push(scan_double(raw)),
            ColumnData::String(v) => v.push(raw.trim().to_string()),
        }
    }
}

/// Result of automatic interval detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalEstimate {
    /// Mean absolute spacing, in seconds.
    pub mean: f64,
    /// Sample standard deviation of the spacing.
    pub stdev: f64,
}

impl IntervalEstimate {
    /// Spacing is considered regular when its deviation is within a quarter of its mean.
    pub fn is_reliable(&self) -> bool {
        self.stdev <= 0.25 * self.mean
    }
}

/// Estimate the measurement interval from successive absolute differences of `values`.
pub fn detect_interval(values: &[f64]) -> BurnInResult<IntervalEstimate> {
    if values.len() < 2 {
        return Err(BurnInError::Interval {
            message: format!("need at least 2 rows to detect an interval, found {}", values.len()),
        });
    }
    let diffs: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    let stdev = if diffs.len() > 1 {
        (diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    if !(mean > 0.0 && mean.is_finite()) {
        return Err(BurnInError::Interval {
            message: format!("detected interval {mean} is not positive"),
        });
    }
    Ok(IntervalEstimate { mean, stdev })
}

/// Resolve an automatic interval from the parsed column `title`.
///
/// Irregular spacing is logged and the mean is still used.
pub fn automatic_interval(parsed: &ParsedData, title: &str) -> BurnInResult<f64> {
    let values = parsed
        .columns
        .get(title)
        .and_then(ColumnData::as_f64)
        .ok_or_else(|| BurnInError::Interval {
            message: format!("Automatic interval column '{title}' is not a parsed numeric column"),
        })?;
    let estimate = detect_interval(&values)?;
    if !estimate.is_reliable() {
        warn!(
            "irregular spacing in '{title}' (mean {:.4}s, stdev {:.4}s); using the mean as the interval",
            estimate.mean, estimate.stdev
        );
    }
    Ok(estimate.mean)
}
