//! Removal of equipment-off spans.
//!
//! Burn-in racks cycle lasers on and off; an off period longer than the longest expected off
//! phase means a rig or part fault, and those rows are cut before files are combined.

use std::ops::Range;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{BurnInError, BurnInResult};
use crate::types::{ColumnData, COMBINED_TIME};

use super::parser::ParsedData;

/// Spans of `data` that stay below `cutoff` for longer than `max_off` seconds.
///
/// Each sample below the cutoff adds `interval` seconds of downtime; a sample at or above it
/// resets the count. Once downtime exceeds `max_off`, the span from the first low sample up to
/// the next sample at or above the cutoff (or the end of data) is returned.
pub fn find_trim_ranges<T>(data: &[T], cutoff: T, interval: f64, max_off: f64) -> Vec<Range<usize>>
where
    T: Copy + PartialOrd,
{
    let mut ranges = Vec::new();
    let mut downtime = 0.0;
    let mut first = 0;
    let mut i = 0;
    while i < data.len() {
        if data[i] >= cutoff {
            downtime = 0.0;
            first = i + 1;
            i += 1;
            continue;
        }
        downtime += interval;
        if downtime > max_off {
            let end = (i..data.len())
                .find(|&j| data[j] >= cutoff)
                .unwrap_or(data.len());
            ranges.push(first..end);
            downtime = 0.0;
            first = end;
            i = end;
            continue;
        }
        i += 1;
    }
    ranges
}

/// Trim one file's columns in place using its configured trim key.
///
/// Returns the number of rows removed. A missing, unknown or non-numeric key leaves the data
/// untouched.
pub fn trim_file(
    parsed: &mut ParsedData,
    trim_key: Option<&str>,
    interval: f64,
    max_off: Duration,
) -> BurnInResult<usize> {
    let Some(key) = trim_key.filter(|k| *k != COMBINED_TIME) else {
        debug!("no trim key configured; skipping trim");
        return Ok(0);
    };
    let Some(column) = parsed.columns.get(key) else {
        warn!("trim key '{key}' is not a parsed column; skipping trim");
        return Ok(0);
    };
    if !(interval > 0.0 && interval.is_finite()) {
        return Err(BurnInError::Trim {
            message: format!("cannot accumulate downtime with interval {interval}"),
        });
    }
    let max = parsed.stats.get(key).map_or(f64::NAN, |s| s.max);
    if max.is_nan() && !matches!(column, ColumnData::String(_)) {
        return Ok(0);
    }

    let max_off = max_off.as_secs_f64();
    let ranges = match column {
        ColumnData::Integer(v) => find_trim_ranges(v, (0.5 * max) as i64, interval, max_off),
        ColumnData::Double(v) => find_trim_ranges(v, 0.5 * max, interval, max_off),
        ColumnData::String(_) => {
            warn!("trim key '{key}' is a string column; skipping trim");
            return Ok(0);
        }
    };
    if ranges.is_empty() {
        return Ok(0);
    }

    let before = parsed.rows;
    for data in parsed.columns.values_mut() {
        for range in ranges.iter().rev() {
            data.remove_range(range.clone());
        }
    }
    parsed.refresh()?;
    let removed = before - parsed.rows;
    debug!("trimmed {removed} rows in {} spans using '{key}'", ranges.len());
    Ok(removed)
}
