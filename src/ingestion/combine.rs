//! Stitching of per-file results into one continuous dataset.

use std::collections::{BTreeMap, HashSet};

use log::info;

use crate::error::{BurnInError, BurnInResult};
use crate::types::{
    ColumnData, ColumnStats, CombinedDataset, DataType, Field, FileBoundary, Schema, COMBINED_TIME,
};

use super::file::FileState;

/// Combine every successful file into a [`CombinedDataset`].
///
/// Files are ordered by start time (ties keep input order). Each file contributes its rows to
/// every global column, filling columns it lacks with default values, and advances the
/// synthetic time axis by one interval per row.
pub fn combine(files: Vec<FileState>) -> BurnInResult<CombinedDataset> {
    let mut files: Vec<FileState> = files.into_iter().filter(FileState::is_ok).collect();
    if files.is_empty() {
        return Err(BurnInError::NoValidFiles {
            stage: "combine".to_string(),
        });
    }
    files.sort_by_key(|f| f.start_time);

    let mut seen = HashSet::new();
    let mut schema = Schema::default();
    for file in &files {
        for field in &file.schema.fields {
            if seen.insert(field.name.clone()) {
                schema.fields.push(field.clone());
            }
        }
    }

    let row_count: usize = files.iter().map(|f| f.parsed.rows).sum();

    let mut time_axis = Vec::with_capacity(row_count);
    let mut boundaries = Vec::with_capacity(files.len());
    let mut offset = 0.0;
    for (index, file) in files.iter().enumerate() {
        let interval = file.interval_secs().ok_or_else(|| BurnInError::Interval {
            message: format!("{} has no resolved interval", file.label()),
        })?;
        boundaries.push(FileBoundary {
            index,
            label: file.label(),
            synthetic_offset: offset,
            start_time: file.start_time,
        });
        for _ in 0..file.parsed.rows {
            time_axis.push(offset);
            offset += interval;
        }
    }

    let mut columns = BTreeMap::new();
    let mut stats = BTreeMap::new();
    for Field { name, data_type } in &schema.fields {
        let Some(mut combined) = ColumnData::with_capacity(*data_type, row_count) else {
            continue;
        };
        let mut merged = ColumnStats {
            max: f64::NAN,
            min: f64::NAN,
            counts: Vec::with_capacity(files.len()),
        };
        for file in &files {
            match file.parsed.columns.get(name) {
                Some(data) if data.data_type() == *data_type => {
                    combined.extend_from(data);
                    match file.parsed.stats.get(name) {
                        Some(s) => merged.merge(s),
                        None => merged.merge(&data.stats()),
                    }
                }
                _ => {
                    let mut filler = combined.empty_like();
                    filler.push_defaults(file.parsed.rows);
                    combined.extend_from(&filler);
                    // Filler rows are counted but never move the extrema.
                    merged.counts.push(file.parsed.rows);
                }
            }
        }
        columns.insert(name.clone(), combined);
        stats.insert(name.clone(), merged);
    }

    let time_column = ColumnData::Double(time_axis.clone());
    stats.insert(COMBINED_TIME.to_string(), time_column.stats());
    columns.insert(COMBINED_TIME.to_string(), time_column);
    schema
        .fields
        .push(Field::new(COMBINED_TIME, DataType::Double));

    let dataset = CombinedDataset {
        schema,
        columns,
        time_axis,
        boundaries,
        stats,
        row_count,
    };
    dataset.validate_lengths()?;
    info!(
        "combined {} files into {} rows x {} columns",
        dataset.boundaries.len(),
        dataset.row_count,
        dataset.schema.len()
    );
    Ok(dataset)
}
