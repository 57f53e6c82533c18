use thiserror::Error;

/// Convenience result type used across ingestion, filtering and reduction.
pub type BurnInResult<T> = Result<T, BurnInError>;

/// Error type returned by ingestion and processing functions.
///
/// This is a single error enum shared by the per-file pipeline, the config loader and the
/// session operations. The [`crate::session::Session`] never lets one of these escape: each
/// public operation turns it into a `false`/empty result plus a diagnostic record.
#[derive(Debug, Error)]
pub enum BurnInError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration document is not valid JSON or does not decode into a format config.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A pattern in a format config does not compile.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// The config directory could not be enumerated.
    #[error("glob error: {0}")]
    Glob(#[from] glob::PatternError),

    /// Single-byte delimited record could not be read.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The ingestion thread pool could not be built.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Fatal configuration failure (ambiguous format names, unreadable config location).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// No candidate format config identified the file.
    #[error("no format config matches '{path}'")]
    NoFormatMatch { path: String },

    /// The matched config's header pattern was not found within the header window.
    #[error("header boundary not found (config '{config}', searched {searched} lines)")]
    HeaderNotFound { config: String, searched: usize },

    /// Start time could not be located or the start-time strategy is unusable.
    #[error("start time error: {message}")]
    Timestamp { message: String },

    /// Measurement interval could not be located or the interval strategy is unusable.
    #[error("interval error: {message}")]
    Interval { message: String },

    /// Titles and types disagree, or a named column is missing from the schema.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// Columns that must share a row count do not.
    #[error("length mismatch: column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Trimming could not be applied to the configured key.
    #[error("trim error: {message}")]
    Trim { message: String },

    /// Every file failed at the named pipeline stage.
    #[error("no valid files remain after stage '{stage}'")]
    NoValidFiles { stage: String },

    /// The requested column is not available or not loaded.
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    /// An operation received parameters outside its accepted range.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The column's type does not support the requested operation.
    #[error("type mismatch for '{column}': {message}")]
    TypeMismatch { column: String, message: String },
}

impl BurnInError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }
}
