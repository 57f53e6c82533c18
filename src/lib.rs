//! `burnin-data-processing` ingests laser burn-in test logs into one combined, typed dataset and
//! reduces it for analysis.
//!
//! The primary entrypoint for applications is [`Session`], a stateful, spreadsheet-style view over
//! a set of log files. Library users who want the pieces directly can call
//! [`ingestion::ingest_files`] and the functions in [`processing`].
//!
//! ## Ingestion
//!
//! Each input file goes through these stages, concurrently with the other files:
//!
//! - **encoding**: UTF-8 / UTF-16 detection from the byte-order mark
//! - **format match**: the first config (by name) whose identifying pattern matches
//! - **header**: header line, start time, sample interval and column schema
//! - **parse**: typed columns (`INT`, `DOUBLE`, `STRING`); the interval is inferred when the
//!   header does not state it
//! - **trim**: equipment-off spans longer than the tolerated off time are removed
//!
//! A file that fails a stage is excluded and reported; the rest are ordered by start time and
//! stitched onto one synthetic time axis (the `Combined Time` column).
//!
//! Format configs are JSON files:
//!
//! ```json
//! {
//!   "name": "Rack Logger",
//!   "file_identifier": "Rack Logger v2.*",
//!   "header_identifier": "Time,Laser Power,Diode Temp,State",
//!   "delim": ",",
//!   "titles": ["Time", "Laser Power", "Diode Temp", "State"],
//!   "types": ["DOUBLE", "INT", "DOUBLE", "STRING"],
//!   "trim_filter_key": "Laser Power",
//!   "start_time": {
//!     "method": "InFile",
//!     "params": { "re_pattern": "Start: (.*)", "time_pattern": "%Y-%m-%d %H:%M:%S" }
//!   },
//!   "interval": {
//!     "method": "InFile",
//!     "params": { "re_pattern": "Interval: (.*)", "time_pattern": "%H:%M:%S" }
//!   }
//! }
//! ```
//!
//! Identifying, header and in-file patterns must match a whole line. Start times can also come
//! from the file path (`InFilePath`) or the first data row (`InData`); intervals can be fixed
//! (`value`) or inferred from a time column (`Automatic`).
//!
//! ## Processing
//!
//! - [`processing::filter_column`]: hysteresis threshold filter producing a [`processing::FilterSet`]
//! - [`processing::ReductionPlan`]: cycle, fixed-size group and point-count reductions with
//!   stable or overall mean/median averaging and a dispersion value per reduced row
//!
//! ## Session example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use burnin_data_processing::processing::{AveragingKind, ReductionKind};
//! use burnin_data_processing::Session;
//!
//! let mut session = Session::new();
//! assert!(session.load(&["run_01.csv"], "configs/", 256, Duration::from_secs(300), true));
//! session.load_columns(&["Laser Power", "Diode Temp"]);
//! session.filter("Laser Power", 0.5, 5, 0);
//! session.reduce(ReductionKind::All, AveragingKind::StableMean, 1, 1000);
//! let temps = session.get_doubles("Diode Temp").unwrap_or_default();
//! let spread = session.get_error("Diode Temp").unwrap_or_default();
//! println!("{} points, first spread {:?}", temps.len(), spread.first());
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: config library, per-file stages, combination and observers
//! - [`processing`]: filter, statistics and reduction
//! - [`execution`]: the parallel stage engine used by ingestion
//! - [`session`]: the stateful facade
//! - [`types`]: schema, column storage and the combined dataset
//! - [`error`]: the crate error type

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod processing;
pub mod session;
pub mod types;

pub use error::{BurnInError, BurnInResult};
pub use session::{Diagnostic, Session};
pub use types::DataType;
