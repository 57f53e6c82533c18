//! Hysteresis range filter.
//!
//! [`extract_ranges`] walks one numeric column and reports the runs of rows at or above a
//! threshold. A crossing in either direction only counts once `debounce` consecutive samples
//! sit on the new side, so isolated spikes do not split or create runs.

use std::ops::Range;

use crate::error::{BurnInError, BurnInResult};
use crate::types::{ColumnData, ColumnStats};

use super::stats::sub_range_split;

/// Half-open row range `[start, end)` on the dataset's row axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterRange {
    pub start: usize,
    pub end: usize,
}

impl FilterRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<(usize, usize)> for FilterRange {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<Range<usize>> for FilterRange {
    fn from(r: Range<usize>) -> Self {
        Self {
            start: r.start,
            end: r.end,
        }
    }
}

/// Ordered, non-overlapping, ascending ranges. Empty means "every row".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    ranges: Vec<FilterRange>,
}

impl FilterSet {
    /// Build a set from ranges that are already ascending and disjoint.
    pub fn from_ranges(ranges: Vec<FilterRange>) -> BurnInResult<Self> {
        for pair in ranges.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(BurnInError::invalid_argument(format!(
                    "filter ranges overlap or are unordered: {:?} then {:?}",
                    pair[0], pair[1]
                )));
            }
        }
        if let Some(r) = ranges.iter().find(|r| r.end < r.start) {
            return Err(BurnInError::invalid_argument(format!("inverted filter range {r:?}")));
        }
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[FilterRange] {
        &self.ranges
    }

    /// Ranges as `Range<usize>`, for slicing column storage.
    pub fn as_ranges(&self) -> Vec<Range<usize>> {
        self.ranges.iter().map(FilterRange::as_range).collect()
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Rows covered by all ranges.
    pub fn row_count(&self) -> usize {
        self.ranges.iter().map(FilterRange::len).sum()
    }

    /// Largest range end, i.e. the minimum column length the set can index.
    pub fn extent(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.end)
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

/// Find the runs of `data` at or above `threshold`.
///
/// `debounce` is the number of consecutive samples needed to accept a crossing (0 behaves as
/// 1). Each run is split into chunks of at most `max_range_len` rows (0: unlimited). A run still
/// open at the end of the data is closed at the last index, so the final sample is left out.
pub fn extract_ranges<T>(data: &[T], threshold: T, debounce: usize, max_range_len: usize) -> FilterSet
where
    T: Copy + PartialOrd,
{
    let n = debounce.max(1);
    let mut ranges = Vec::with_capacity(data.len() / 10);
    let mut in_run = false;
    let mut run_start = 0;
    let mut count = 0;

    for (i, &value) in data.iter().enumerate() {
        let above = value >= threshold;
        match (above, in_run) {
            (false, false) | (true, true) => count = 0,
            (true, false) => {
                count += 1;
                if count >= n {
                    in_run = true;
                    run_start = i + 1 - count;
                    count = 0;
                }
            }
            (false, true) => {
                count += 1;
                if count >= n {
                    in_run = false;
                    let run_end = i + 1 - count;
                    ranges.extend(
                        sub_range_split(run_start, run_end, max_range_len)
                            .into_iter()
                            .map(FilterRange::from),
                    );
                    count = 0;
                }
            }
        }
    }
    let last = data.len().saturating_sub(1);
    if in_run && last > run_start {
        ranges.extend(
            sub_range_split(run_start, last, max_range_len)
                .into_iter()
                .map(FilterRange::from),
        );
    }
    FilterSet { ranges }
}

/// Threshold for a cutoff fraction of a column's `[min, max]` span.
///
/// A cutoff of exactly 0 selects every row (the type's lowest value).
pub fn threshold_for(stats: &ColumnStats, cutoff: f64) -> f64 {
    if cutoff == 0.0 {
        return f64::MIN;
    }
    stats.min + cutoff * (stats.max - stats.min)
}

/// Run the hysteresis filter over a numeric column.
pub fn filter_column(
    title: &str,
    data: &ColumnData,
    cutoff: f64,
    debounce: usize,
    max_range_len: usize,
) -> BurnInResult<FilterSet> {
    if !(0.0..1.0).contains(&cutoff) {
        return Err(BurnInError::invalid_argument(format!(
            "cutoff must satisfy 0 <= cutoff < 1 (got {cutoff})"
        )));
    }
    let stats = data.stats();
    let threshold = threshold_for(&stats, cutoff);
    let set = match data {
        ColumnData::Integer(v) => {
            let t = if cutoff == 0.0 { i64::MIN } else { threshold as i64 };
            extract_ranges(v, t, debounce, max_range_len)
        }
        ColumnData::Double(v) => extract_ranges(v, threshold, debounce, max_range_len),
        ColumnData::String(_) => {
            return Err(BurnInError::TypeMismatch {
                column: title.to_string(),
                message: "only numeric columns can be filtered".to_string(),
            });
        }
    };
    log::debug!(
        "filter on '{title}': threshold {threshold}, {} ranges, {} rows",
        set.len(),
        set.row_count()
    );
    Ok(set)
}
