//! Core data model types.
//!
//! Parsed log data is stored column-wise: every column title maps to exactly one
//! [`ColumnData`] vector whose variant fixes the column's [`DataType`]. The same representation
//! is used for one file's parsed rows, the combined multi-file dataset, and the session's active
//! column store.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::BurnInError;

/// Title of the synthetic time column added when files are combined.
pub const COMBINED_TIME: &str = "Combined Time";

/// Logical data type of a column.
///
/// Format configs name types as `"INT"`, `"DOUBLE"` or `"STRING"` (or the codes 0/1/2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(try_from = "TypeCode")]
pub enum DataType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Double,
    /// Whitespace-trimmed text.
    String,
    /// Error sentinel; never the type of a stored column.
    #[default]
    None,
}

impl DataType {
    /// `true` for the two numeric column types.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Double)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Integer => "INT",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::None => "NONE",
        };
        f.write_str(s)
    }
}

impl FromStr for DataType {
    type Err = BurnInError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => Ok(Self::Integer),
            "DOUBLE" | "FLOAT" => Ok(Self::Double),
            "STRING" | "STR" => Ok(Self::String),
            other => Err(BurnInError::config(format!("unknown column type '{other}'"))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeCode {
    Code(u8),
    Name(String),
}

impl TryFrom<TypeCode> for DataType {
    type Error = BurnInError;

    fn try_from(code: TypeCode) -> Result<Self, Self::Error> {
        match code {
            TypeCode::Code(0) => Ok(Self::Integer),
            TypeCode::Code(1) => Ok(Self::Double),
            TypeCode::Code(2) => Ok(Self::String),
            TypeCode::Code(n) => Err(BurnInError::config(format!("unknown column type code {n}"))),
            TypeCode::Name(name) => name.parse(),
        }
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column title.
    pub name: String,
    /// Column data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields. Position in the list is the field's position in a delimited row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the type of a field by name, if present.
    pub fn type_of(&self, name: &str) -> Option<DataType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.data_type)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Typed storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl ColumnData {
    /// An empty column of the given type, or `None` for [`DataType::None`].
    pub fn empty(data_type: DataType) -> Option<Self> {
        Self::with_capacity(data_type, 0)
    }

    /// An empty column of the given type with reserved capacity.
    pub fn with_capacity(data_type: DataType, capacity: usize) -> Option<Self> {
        match data_type {
            DataType::Integer => Some(Self::Integer(Vec::with_capacity(capacity))),
            DataType::Double => Some(Self::Double(Vec::with_capacity(capacity))),
            DataType::String => Some(Self::String(Vec::with_capacity(capacity))),
            DataType::None => None,
        }
    }

    /// An empty column of the same type.
    pub fn empty_like(&self) -> Self {
        match self {
            Self::Integer(_) => Self::Integer(Vec::new()),
            Self::Double(_) => Self::Double(Vec::new()),
            Self::String(_) => Self::String(Vec::new()),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Integer(_) => DataType::Integer,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `n` default values (0, 0.0 or the empty string).
    pub fn push_defaults(&mut self, n: usize) {
        match self {
            Self::Integer(v) => v.resize(v.len() + n, 0),
            Self::Double(v) => v.resize(v.len() + n, 0.0),
            Self::String(v) => v.resize(v.len() + n, String::new()),
        }
    }

    /// Append another column of the same type.
    ///
    /// A column of a different type contributes `other.len()` default values instead, so the
    /// length invariant still holds.
    pub fn extend_from(&mut self, other: &ColumnData) {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.extend_from_slice(b),
            (Self::Double(a), Self::Double(b)) => a.extend_from_slice(b),
            (Self::String(a), Self::String(b)) => a.extend(b.iter().cloned()),
            (this, other) => this.push_defaults(other.len()),
        }
    }

    /// Remove the rows in `range`.
    pub fn remove_range(&mut self, range: Range<usize>) {
        match self {
            Self::Integer(v) => {
                v.drain(range);
            }
            Self::Double(v) => {
                v.drain(range);
            }
            Self::String(v) => {
                v.drain(range);
            }
        }
    }

    /// Concatenate the rows covered by `ranges`, in order.
    pub fn gather(&self, ranges: &[Range<usize>]) -> Self {
        fn pick<T: Clone>(v: &[T], ranges: &[Range<usize>]) -> Vec<T> {
            let total = ranges.iter().map(|r| r.len()).sum();
            let mut out = Vec::with_capacity(total);
            for r in ranges {
                out.extend_from_slice(&v[r.clone()]);
            }
            out
        }
        match self {
            Self::Integer(v) => Self::Integer(pick(v, ranges)),
            Self::Double(v) => Self::Double(pick(v, ranges)),
            Self::String(v) => Self::String(pick(v, ranges)),
        }
    }

    /// Numeric view of the column (`None` for string columns).
    pub fn as_f64(&self) -> Option<Vec<f64>> {
        match self {
            Self::Integer(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Self::Double(v) => Some(v.clone()),
            Self::String(_) => None,
        }
    }

    /// Max/min/count statistics for the column.
    pub fn stats(&self) -> ColumnStats {
        let (max, min) = match self {
            Self::Integer(v) => (
                v.iter().max().map_or(f64::NAN, |&x| x as f64),
                v.iter().min().map_or(f64::NAN, |&x| x as f64),
            ),
            Self::Double(v) => (
                v.iter().copied().fold(f64::NAN, f64::max),
                v.iter().copied().fold(f64::NAN, f64::min),
            ),
            Self::String(_) => (f64::NAN, f64::NAN),
        };
        ColumnStats {
            max,
            min,
            counts: vec![self.len()],
        }
    }
}

/// Running statistics for a column.
///
/// `max`/`min` are NaN for string columns and empty columns. `counts` holds one row count per
/// contributing file (a single entry for a per-file column).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub max: f64,
    pub min: f64,
    pub counts: Vec<usize>,
}

impl ColumnStats {
    /// Fold another file's statistics into these.
    pub fn merge(&mut self, other: &ColumnStats) {
        self.max = self.max.max(other.max);
        self.min = self.min.min(other.min);
        self.counts.extend_from_slice(&other.counts);
    }

    /// Total row count over all contributing files.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Column title → typed data, ordered by title.
pub type ColumnMap = BTreeMap<String, ColumnData>;

/// Where one input file starts on the combined time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FileBoundary {
    /// Position of the file in start-time order.
    pub index: usize,
    /// File name of the source.
    pub label: String,
    /// Seconds from the start of the combined time axis.
    pub synthetic_offset: f64,
    /// Wall-clock start of the file's recording.
    pub start_time: NaiveDateTime,
}

/// All successfully ingested files stitched into one continuous dataset.
///
/// Every column (including [`COMBINED_TIME`]) has exactly [`CombinedDataset::row_count`] rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedDataset {
    /// Global schema: union of every file's (title, type), first-seen type wins.
    pub schema: Schema,
    /// Typed column storage.
    pub columns: ColumnMap,
    /// Synthetic time, in seconds, one entry per row.
    pub time_axis: Vec<f64>,
    /// One entry per combined file, in time order.
    pub boundaries: Vec<FileBoundary>,
    /// Merged per-column statistics.
    pub stats: BTreeMap<String, ColumnStats>,
    /// Rows in every column.
    pub row_count: usize,
}

impl CombinedDataset {
    /// Titles of every available column, in schema order.
    pub fn titles(&self) -> Vec<String> {
        self.schema.field_names().map(str::to_string).collect()
    }

    /// Type of a column, [`DataType::None`] if unknown.
    pub fn type_of(&self, title: &str) -> DataType {
        self.schema.type_of(title).unwrap_or(DataType::None)
    }

    /// Borrow a column's data.
    pub fn column(&self, title: &str) -> Option<&ColumnData> {
        self.columns.get(title)
    }

    /// `true` when nothing has been combined.
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Check that every column has `row_count` rows.
    pub fn validate_lengths(&self) -> Result<(), BurnInError> {
        for (title, data) in &self.columns {
            if data.len() != self.row_count {
                return Err(BurnInError::LengthMismatch {
                    column: title.clone(),
                    expected: self.row_count,
                    actual: data.len(),
                });
            }
        }
        Ok(())
    }
}
