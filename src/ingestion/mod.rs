//! Log ingestion: from raw bytes in N files to one combined, typed, time-ordered dataset.
//!
//! Most callers should use [`ingest_files`] (from [`pipeline`]) which:
//!
//! - loads the format-config library from a directory or file ([`config`])
//! - runs every per-file stage concurrently, excluding files that fail ([`file`])
//! - stitches the surviving files into a [`crate::types::CombinedDataset`] ([`combine`])
//! - optionally reports per-file success/failure/alerts to an [`IngestionObserver`]
//!
//! The individual stages are also available:
//! - [`encoding`]: byte-order-mark detection and decoding
//! - [`matcher`]: format detection against the config library
//! - [`header`]: header boundary, start time, interval and column schema
//! - [`parser`]: typed column parsing and automatic interval detection
//! - [`trim`]: equipment-off span removal

pub mod combine;
pub mod config;
pub mod encoding;
pub mod file;
pub mod header;
pub mod matcher;
pub mod observability;
pub mod parser;
pub mod pipeline;
pub mod trim;

pub use config::{ConfigLibrary, FormatConfig};
pub use encoding::EncodingTag;
pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    LogObserver,
};
pub use pipeline::{
    ingest_files, ingest_with_library, FileOutcome, IngestionOptions, IngestionReport,
    DEFAULT_HEADER_LINE_LIMIT, DEFAULT_MAX_OFF_TIME,
};
