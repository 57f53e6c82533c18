//! Range filtering and statistical reduction of loaded columns.
//!
//! - [`filter`]: hysteresis threshold filter producing a [`FilterSet`]
//! - [`stats`]: plain, weighted and interquartile ("stable") statistics over index ranges
//! - [`reduce`]: cycle, group and point-count reduction driven by a [`ReductionPlan`]
//!
//! ## Example: filter then reduce by cycle
//!
//! ```rust
//! use burnin_data_processing::processing::{
//!     filter_column, AveragingKind, ColumnEntry, ReductionKind, ReductionPlan, ReductionState,
//! };
//! use burnin_data_processing::types::ColumnData;
//!
//! let power = ColumnData::Integer(vec![0, 0, 0, 10, 10, 10, 0, 0]);
//! let cycles = filter_column("Laser Power", &power, 0.5, 1, 0).unwrap();
//! assert_eq!(cycles.len(), 1);
//!
//! let state = ReductionState {
//!     kind: ReductionKind::Cycle,
//!     averaging: AveragingKind::OverallMean,
//!     ..Default::default()
//! };
//! let plan = ReductionPlan::new(&state, &cycles, power.len()).unwrap();
//! let reduced = plan.apply(&ColumnEntry::new(power));
//! assert_eq!(reduced.data, ColumnData::Integer(vec![10]));
//! ```

pub mod filter;
pub mod reduce;
pub mod stats;

pub use filter::{extract_ranges, filter_column, threshold_for, FilterRange, FilterSet};
pub use reduce::{
    reduce_ranges, ColumnEntry, ReductionKind, ReductionPlan, ReductionStage, ReductionState,
    STRING_SEPARATOR,
};
pub use stats::{
    mean, median, stable_mean, stable_median, stable_period_convert, stable_stdev, stdev,
    sub_range_split, AveragingKind, MAX_COLS, MAX_ROWS,
};
