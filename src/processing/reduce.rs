//! Destructive reduction of loaded columns.
//!
//! A reduction request is first turned into a [`ReductionPlan`] (validated, with the resulting
//! row count known up front), then applied column by column with [`ReductionPlan::apply`].
//! Planning never touches data, so a rejected request leaves every column unchanged.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use log::debug;

use crate::error::{BurnInError, BurnInResult};
use crate::types::ColumnData;

use super::filter::FilterSet;
use super::stats::{point_groups, sub_range_split, AveragingKind, MAX_ROWS};

/// Separator used when string cells are merged.
pub const STRING_SEPARATOR: &str = ", ";

/// Which reduction stages a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReductionKind {
    /// No reduction unless the row ceiling forces one.
    #[default]
    None,
    /// One row per filtered range.
    Cycle,
    /// Consecutive groups of a fixed size.
    NGroup,
    /// Exactly a target number of rows.
    NPoints,
    /// Cycle, then NGroup, then NPoints.
    All,
}

impl fmt::Display for ReductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Cycle => "DEFAULT",
            Self::NGroup => "ngroup",
            Self::NPoints => "npoints",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

impl FromStr for ReductionKind {
    type Err = BurnInError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "default" | "cycle" => Ok(Self::Cycle),
            "ngroup" => Ok(Self::NGroup),
            "npoints" => Ok(Self::NPoints),
            "all" => Ok(Self::All),
            other => Err(BurnInError::invalid_argument(format!(
                "unknown reduction kind '{other}'"
            ))),
        }
    }
}

/// The reduction most recently requested of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReductionState {
    pub kind: ReductionKind,
    pub averaging: AveragingKind,
    pub group_size: usize,
    pub point_count: usize,
}

impl Default for ReductionState {
    fn default() -> Self {
        Self {
            kind: ReductionKind::None,
            averaging: AveragingKind::StableMean,
            group_size: 1,
            point_count: 0,
        }
    }
}

/// One step of a reduction plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionStage {
    /// Collapse every filter range to one row.
    Cycle,
    /// Groups of this many rows; the trailing group may be short.
    NGroup(usize),
    /// Exactly this many rows.
    NPoints(usize),
}

/// A validated sequence of stages together with the filter they consume.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionPlan {
    pub stages: Vec<ReductionStage>,
    pub averaging: AveragingKind,
    /// Filter applied by the first stage (empty: every row).
    pub filter: FilterSet,
    /// Row count of every column once the plan has run.
    pub output_rows: usize,
}

impl ReductionPlan {
    /// Validate `state` against the current filter and row count.
    ///
    /// `rows` is the unfiltered length of the loaded columns.
    pub fn new(state: &ReductionState, filter: &FilterSet, rows: usize) -> BurnInResult<Self> {
        if !filter.is_empty() && filter.extent() > rows {
            return Err(BurnInError::invalid_argument(format!(
                "filter reaches row {} but only {rows} rows are loaded",
                filter.extent()
            )));
        }
        let mut stages = Vec::new();
        let mut current = if filter.is_empty() {
            rows
        } else {
            filter.row_count()
        };

        let wants_cycle = matches!(state.kind, ReductionKind::Cycle | ReductionKind::All);
        if state.kind == ReductionKind::Cycle && filter.is_empty() {
            return Err(BurnInError::invalid_argument(
                "cycle reduction requires an active filter",
            ));
        }
        if wants_cycle && !filter.is_empty() {
            stages.push(ReductionStage::Cycle);
            current = filter.len();
        }

        // A group size of 0 or 1 and a point count of 0 leave their stage out.
        if matches!(state.kind, ReductionKind::NGroup | ReductionKind::All) && state.group_size > 1 {
            stages.push(ReductionStage::NGroup(state.group_size));
            current = current.div_ceil(state.group_size);
        }

        if matches!(state.kind, ReductionKind::NPoints | ReductionKind::All) && state.point_count > 0 {
            let target = state.point_count.min(MAX_ROWS);
            if current > target {
                stages.push(ReductionStage::NPoints(target));
                current = target;
            }
        }

        if current > MAX_ROWS {
            debug!("{current} rows exceed the row ceiling; forcing a point reduction");
            stages.push(ReductionStage::NPoints(MAX_ROWS));
            current = MAX_ROWS;
        }

        let filter = if stages.is_empty() {
            FilterSet::default()
        } else {
            filter.clone()
        };
        Ok(Self {
            stages,
            averaging: state.averaging,
            filter,
            output_rows: current,
        })
    }

    /// `true` when the plan leaves data untouched.
    pub fn is_noop(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage on one column.
    pub fn apply(&self, entry: &ColumnEntry) -> ColumnEntry {
        let mut filter = Some(&self.filter).filter(|f| !f.is_empty());
        let mut current = entry.clone();
        for stage in &self.stages {
            current = match stage {
                ReductionStage::Cycle => match filter.take() {
                    Some(f) => reduce_ranges(&current, &f.as_ranges(), self.averaging),
                    None => current,
                },
                ReductionStage::NGroup(size) => {
                    let source = gather_filtered(current, filter.take());
                    let groups = if source.is_empty() {
                        Vec::new()
                    } else {
                        sub_range_split(0, source.len(), *size)
                    };
                    reduce_ranges(&source, &groups, self.averaging)
                }
                ReductionStage::NPoints(points) => {
                    let source = gather_filtered(current, filter.take());
                    let groups = point_groups(source.len(), *points);
                    reduce_ranges(&source, &groups, self.averaging)
                }
            };
        }
        current
    }
}

/// A loaded column: typed values plus one dispersion value per row (NaN where undefined).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEntry {
    pub data: ColumnData,
    pub errors: Vec<f64>,
}

impl ColumnEntry {
    /// A column with no dispersion information yet.
    pub fn new(data: ColumnData) -> Self {
        let errors = vec![f64::NAN; data.len()];
        Self { data, errors }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rows covered by `ranges`, concatenated.
    pub fn gather(&self, ranges: &[Range<usize>]) -> Self {
        let mut errors = Vec::with_capacity(ranges.iter().map(|r| r.len()).sum());
        for r in ranges {
            errors.extend_from_slice(&self.errors[r.clone()]);
        }
        Self {
            data: self.data.gather(ranges),
            errors,
        }
    }
}

fn gather_filtered(entry: ColumnEntry, filter: Option<&FilterSet>) -> ColumnEntry {
    match filter {
        Some(f) => entry.gather(&f.as_ranges()),
        None => entry,
    }
}

/// `true` when every error in `range` can serve as a reciprocal-variance weight.
fn has_usable_errors(errors: &[f64], range: &Range<usize>) -> bool {
    errors
        .get(range.clone())
        .is_some_and(|e| !e.is_empty() && e.iter().all(|&s| s.is_finite() && s > 0.0))
}

/// Collapse each range of `entry` to one row.
pub fn reduce_ranges(entry: &ColumnEntry, ranges: &[Range<usize>], averaging: AveragingKind) -> ColumnEntry {
    let mut errors = Vec::with_capacity(ranges.len());
    let data = match &entry.data {
        ColumnData::String(values) => {
            let joined = ranges
                .iter()
                .map(|r| {
                    errors.push(f64::NAN);
                    values[r.clone()].join(STRING_SEPARATOR)
                })
                .collect();
            ColumnData::String(joined)
        }
        numeric => {
            let values = numeric.as_f64().unwrap_or_default();
            let weights: Vec<f64> = entry.errors.iter().map(|s| 1.0 / (s * s)).collect();
            let mut averages = Vec::with_capacity(ranges.len());
            for r in ranges {
                let w: &[f64] = if has_usable_errors(&entry.errors, r) { &weights } else { &[] };
                let (center, spread) = averaging.summarize(&values, r.clone(), w);
                averages.push(center);
                errors.push(spread);
            }
            match numeric {
                ColumnData::Integer(_) => {
                    ColumnData::Integer(averages.into_iter().map(round_to_i64).collect())
                }
                _ => ColumnData::Double(averages),
            }
        }
    };
    ColumnEntry { data, errors }
}

fn round_to_i64(x: f64) -> i64 {
    if x.is_finite() { x.round() as i64 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::filter::FilterRange;

    fn sample_filter() -> FilterSet {
        FilterSet::from_ranges(vec![
            FilterRange::new(0, 4),
            FilterRange::new(4, 6),
            FilterRange::new(8, 10),
        ])
        .unwrap()
    }

    fn state(kind: ReductionKind) -> ReductionState {
        ReductionState {
            kind,
            averaging: AveragingKind::OverallMean,
            group_size: 3,
            point_count: 4,
        }
    }

    #[test]
    fn cycle_yields_one_row_per_range() {
        let entry = ColumnEntry::new(ColumnData::Double((0..10).map(f64::from).collect()));
        let plan = ReductionPlan::new(&state(ReductionKind::Cycle), &sample_filter(), 10).unwrap();
        assert_eq!(plan.output_rows, 3);
        let out = plan.apply(&entry);
        assert_eq!(out.data, ColumnData::Double(vec![1.5, 4.5, 8.5]));
        assert_eq!(out.errors.len(), 3);
        assert!((out.errors[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cycle_without_filter_is_rejected() {
        let err = ReductionPlan::new(&state(ReductionKind::Cycle), &FilterSet::default(), 10);
        assert!(matches!(err, Err(BurnInError::InvalidArgument { .. })));
    }

    #[test]
    fn ngroup_keeps_short_trailing_group() {
        let entry = ColumnEntry::new(ColumnData::Integer(vec![1, 2, 3, 4, 5, 6, 7]));
        let plan = ReductionPlan::new(&state(ReductionKind::NGroup), &FilterSet::default(), 7).unwrap();
        let out = plan.apply(&entry);
        assert_eq!(out.data, ColumnData::Integer(vec![2, 5, 7]));
        assert_eq!(plan.output_rows, 3);
        assert_eq!(out.errors[2], 0.0);
    }

    #[test]
    fn npoints_is_exact() {
        for n in 4..40 {
            let entry = ColumnEntry::new(ColumnData::Double(vec![1.0; n]));
            let plan = ReductionPlan::new(&state(ReductionKind::NPoints), &FilterSet::default(), n).unwrap();
            let out = plan.apply(&entry);
            assert_eq!(out.len(), 4);
            assert_eq!(plan.output_rows, 4);
        }
    }

    #[test]
    fn all_runs_every_stage_in_order() {
        let entry = ColumnEntry::new(ColumnData::Double((0..10).map(f64::from).collect()));
        let st = ReductionState {
            kind: ReductionKind::All,
            averaging: AveragingKind::OverallMean,
            group_size: 2,
            point_count: 1,
        };
        let plan = ReductionPlan::new(&st, &sample_filter(), 10).unwrap();
        assert_eq!(
            plan.stages,
            vec![
                ReductionStage::Cycle,
                ReductionStage::NGroup(2),
                ReductionStage::NPoints(1)
            ]
        );
        let out = plan.apply(&entry);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn strings_are_joined_with_nan_dispersion() {
        let entry = ColumnEntry::new(ColumnData::String(
            ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect(),
        ));
        let out = reduce_ranges(&entry, &[0..3, 3..4], AveragingKind::StableMean);
        assert_eq!(out.data, ColumnData::String(vec!["a, b, c".into(), "d".into()]));
        assert!(out.errors.iter().all(|e| e.is_nan()));
    }

    #[test]
    fn prior_errors_weight_the_average() {
        let entry = ColumnEntry {
            data: ColumnData::Double(vec![1.0, 3.0]),
            errors: vec![1.0, 0.5],
        };
        // Weights 1 and 4.
        let out = reduce_ranges(&entry, &[0..2], AveragingKind::OverallMean);
        assert_eq!(out.data, ColumnData::Double(vec![2.6]));

        let unweighted = ColumnEntry::new(ColumnData::Double(vec![1.0, 3.0]));
        let out = reduce_ranges(&unweighted, &[0..2], AveragingKind::OverallMean);
        assert_eq!(out.data, ColumnData::Double(vec![2.0]));
    }

    #[test]
    fn zero_parameters_leave_their_stage_out() {
        let entry = ColumnEntry::new(ColumnData::Double((0..10).map(f64::from).collect()));
        let st = ReductionState {
            kind: ReductionKind::All,
            averaging: AveragingKind::StableMean,
            group_size: 1,
            point_count: 0,
        };
        let plan = ReductionPlan::new(&st, &sample_filter(), 10).unwrap();
        assert_eq!(plan.stages, vec![ReductionStage::Cycle]);
        assert_eq!(plan.apply(&entry).len(), 3);

        let st = ReductionState {
            kind: ReductionKind::NGroup,
            group_size: 0,
            ..st
        };
        assert!(ReductionPlan::new(&st, &FilterSet::default(), 10).unwrap().is_noop());
        let st = ReductionState {
            kind: ReductionKind::NPoints,
            ..st
        };
        assert!(ReductionPlan::new(&st, &FilterSet::default(), 10).unwrap().is_noop());

        // The row ceiling still forces a point reduction.
        let plan = ReductionPlan::new(&st, &FilterSet::default(), MAX_ROWS + 1).unwrap();
        assert_eq!(plan.stages, vec![ReductionStage::NPoints(MAX_ROWS)]);
    }

    #[test]
    fn none_is_noop_and_keeps_filter() {
        let plan = ReductionPlan::new(&ReductionState::default(), &sample_filter(), 10).unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.output_rows, 6);
    }

    #[test]
    fn kind_names_round_trip() {
        assert_eq!("DEFAULT".parse::<ReductionKind>().unwrap(), ReductionKind::Cycle);
        assert_eq!("npoints".parse::<ReductionKind>().unwrap(), ReductionKind::NPoints);
        assert_eq!(ReductionKind::NGroup.to_string(), "ngroup");
        assert!("sideways".parse::<ReductionKind>().is_err());
    }
}
