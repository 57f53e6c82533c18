//! Header scanning: header/data boundary, test start time, measurement interval and column
//! schema.
//!
//! Each scan reads the matched [`FormatConfig`] and the file's lines. Structural problems
//! (missing header, unknown strategy, bad schema) fail the file; a start time that cannot be
//! parsed only degrades to the Unix epoch with a warning.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::warn;
use regex::Regex;

use crate::error::{BurnInError, BurnInResult};
use crate::types::{DataType, Schema};

use super::config::{whole_line_regex, FormatConfig, StrategySpec};
use super::parser::FieldSplitter;

/// Index of the first data row: one past the line matching the config's header pattern.
pub fn find_header_boundary(cfg: &FormatConfig, lines: &[&str], limit: usize) -> BurnInResult<usize> {
    let searched = limit.min(lines.len());
    let not_found = || BurnInError::HeaderNotFound {
        config: cfg.name.clone(),
        searched,
    };
    let pattern = cfg.header_identifier.as_ref().ok_or_else(not_found)?;
    lines[..searched]
        .iter()
        .position(|line| pattern.is_match(line))
        .map(|idx| idx + 1)
        .ok_or_else(not_found)
}

/// How a file's start time is found.
#[derive(Debug, Clone)]
pub enum StartTimeMethod {
    /// Whole-line pattern over the header region; capture group 1 holds the time.
    InFile { pattern: Regex, time_pattern: String },
    /// Pattern searched anywhere in the file path.
    InFilePath { pattern: Regex, time_pattern: String },
    /// Delimited field `col_index` of the first data row.
    InData { col_index: usize, time_pattern: String },
}

impl StartTimeMethod {
    /// Resolve a config's `start_time` block.
    pub fn from_spec(spec: Option<&StrategySpec>) -> BurnInResult<Self> {
        let spec = spec.ok_or_else(|| timestamp_err("config has no start_time block"))?;
        let params = &spec.params;
        let time_pattern = params
            .time_pattern
            .clone()
            .ok_or_else(|| timestamp_err(format!("{} start time needs a time_pattern", spec.method)))?;
        let re_pattern = || {
            params
                .re_pattern
                .as_deref()
                .ok_or_else(|| timestamp_err(format!("{} start time needs a re_pattern", spec.method)))
        };
        match spec.method.as_str() {
            "InFile" => Ok(Self::InFile {
                pattern: whole_line_regex(re_pattern()?)?,
                time_pattern,
            }),
            "InFilePath" => Ok(Self::InFilePath {
                pattern: Regex::new(re_pattern()?)?,
                time_pattern,
            }),
            "InData" => Ok(Self::InData {
                col_index: params
                    .col_index
                    .ok_or_else(|| timestamp_err("InData start time needs a col_index"))?,
                time_pattern,
            }),
            other => Err(timestamp_err(format!("unknown start time method '{other}'"))),
        }
    }
}

fn timestamp_err(message: impl Into<String>) -> BurnInError {
    BurnInError::Timestamp {
        message: message.into(),
    }
}

fn interval_err(message: impl Into<String>) -> BurnInError {
    BurnInError::Interval {
        message: message.into(),
    }
}

/// Locate and parse the start time of a file.
///
/// A value that is missing or does not parse with the configured time pattern yields the Unix
/// epoch.
pub fn scan_start_time(
    method: &StartTimeMethod,
    lines: &[&str],
    header_end: usize,
    path: &Path,
    splitter: &FieldSplitter,
) -> NaiveDateTime {
    let (raw, time_pattern) = match method {
        StartTimeMethod::InFile { pattern, time_pattern } => (
            lines[..header_end.min(lines.len())]
                .iter()
                .find_map(|line| capture(pattern, line)),
            time_pattern,
        ),
        StartTimeMethod::InFilePath { pattern, time_pattern } => (
            pattern
                .find(&path.to_string_lossy())
                .map(|m| m.as_str().to_string()),
            time_pattern,
        ),
        StartTimeMethod::InData { col_index, time_pattern } => (
            lines
                .get(header_end)
                .and_then(|row| splitter.split(row).into_iter().nth(*col_index))
                .map(|field| field.trim().to_string()),
            time_pattern,
        ),
    };

    match raw.as_deref().and_then(|s| parse_start_time(s, time_pattern)) {
        Some(t) => t,
        None => {
            warn!(
                "unable to read start time from {} ({:?} with '{time_pattern}'); using epoch",
                path.display(),
                raw
            );
            NaiveDateTime::default()
        }
    }
}

/// Group 1 of a match when the pattern has one, else the whole match.
fn capture(pattern: &Regex, text: &str) -> Option<String> {
    let caps = pattern.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().to_string())
}

/// Parse a wall-clock time; date-only patterns resolve to midnight.
pub fn parse_start_time(text: &str, time_pattern: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, time_pattern)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, time_pattern)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a duration written as a time of day (`"00:01:30"` with `"%H:%M:%S"`), falling back to
/// a plain number of seconds. Returns seconds.
pub fn parse_duration(text: &str, time_pattern: &str) -> Option<f64> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, time_pattern)
        .ok()
        .map(|t| f64::from(t.num_seconds_from_midnight()) + f64::from(t.nanosecond()) * 1e-9)
        .or_else(|| text.parse::<f64>().ok())
}

/// How a file's measurement interval is found.
#[derive(Debug, Clone)]
pub enum IntervalMethod {
    /// Whole-line pattern over the header region; capture group 1 holds a duration.
    InFile { pattern: Regex, time_pattern: String },
    /// Fixed number of seconds.
    Value(f64),
    /// Mean spacing of the named numeric column, computed after parsing.
    Automatic { title: String },
}

impl IntervalMethod {
    /// Resolve a config's `interval` block.
    pub fn from_spec(spec: Option<&StrategySpec>) -> BurnInResult<Self> {
        let spec = spec.ok_or_else(|| interval_err("config has no interval block"))?;
        let params = &spec.params;
        match spec.method.as_str() {
            "InFile" => {
                let re = params
                    .re_pattern
                    .as_deref()
                    .ok_or_else(|| interval_err("InFile interval needs a re_pattern"))?;
                let time_pattern = params
                    .time_pattern
                    .clone()
                    .ok_or_else(|| interval_err("InFile interval needs a time_pattern"))?;
                Ok(Self::InFile {
                    pattern: whole_line_regex(re)?,
                    time_pattern,
                })
            }
            "value" | "Value" => match params.increment {
                Some(secs) if secs > 0.0 && secs.is_finite() => Ok(Self::Value(secs)),
                other => Err(interval_err(format!("invalid fixed increment {other:?}"))),
            },
            "Automatic" => params
                .title
                .clone()
                .map(|title| Self::Automatic { title })
                .ok_or_else(|| interval_err("Automatic interval needs a title")),
            other => Err(interval_err(format!("unknown interval method '{other}'"))),
        }
    }
}

/// Interval as known after header scanning.
#[derive(Debug, Clone, PartialEq)]
pub enum Interval {
    /// Seconds between successive rows.
    Known(f64),
    /// Computed from the named column once data is parsed.
    Deferred { title: String },
}

/// Extract or validate the measurement interval.
pub fn scan_interval(
    method: &IntervalMethod,
    lines: &[&str],
    header_end: usize,
    schema: &Schema,
) -> BurnInResult<Interval> {
    match method {
        IntervalMethod::InFile { pattern, time_pattern } => {
            let raw = lines[..header_end.min(lines.len())]
                .iter()
                .find_map(|line| capture(pattern, line))
                .ok_or_else(|| interval_err("interval line not found in header"))?;
            match parse_duration(&raw, time_pattern) {
                Some(secs) if secs > 0.0 => Ok(Interval::Known(secs)),
                _ => Err(interval_err(format!(
                    "unable to parse interval '{raw}' with '{time_pattern}'"
                ))),
            }
        }
        IntervalMethod::Value(secs) => Ok(Interval::Known(*secs)),
        IntervalMethod::Automatic { title } => match schema.type_of(title) {
            Some(t) if t.is_numeric() => Ok(Interval::Deferred {
                title: title.clone(),
            }),
            Some(t) => Err(interval_err(format!(
                "Automatic interval column '{title}' is {t}, not numeric"
            ))),
            None => Err(interval_err(format!(
                "Automatic interval column '{title}' is not a declared column"
            ))),
        },
    }
}

/// The column schema declared by the config, in positional order.
pub fn scan_columns(cfg: &FormatConfig) -> BurnInResult<Schema> {
    let schema = cfg.schema()?;
    if schema.is_empty() {
        return Err(BurnInError::SchemaMismatch {
            message: format!("config '{}' declares no columns", cfg.name),
        });
    }
    if let Some(f) = schema.fields.iter().find(|f| f.data_type == DataType::None) {
        return Err(BurnInError::SchemaMismatch {
            message: format!("column '{}' has no usable type", f.name),
        });
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::config::StrategyParams;

    fn config() -> FormatConfig {
        FormatConfig::from_json_str(
            r#"{
                "name": "rack",
                "file_identifier": "Rack ID:.*",
                "header_identifier": "Time,Power,Channel",
                "titles": ["Time", "Power", "Channel"],
                "types": ["DOUBLE", "INT", "STRING"]
            }"#,
        )
        .unwrap()
    }

    fn spec(method: &str, params: StrategyParams) -> StrategySpec {
        StrategySpec {
            method: method.to_string(),
            params,
        }
    }

    const LINES: [&str; 6] = [
        "Rack ID: 12",
        "Start: 2024-03-01 08:30:00",
        "Interval: 00:00:05",
        "Time,Power,Channel",
        "0.0,10,a",
        "5.0,11,b",
    ];

    #[test]
    fn boundary_is_one_past_header_line() {
        assert_eq!(find_header_boundary(&config(), &LINES, 256).unwrap(), 4);
        assert!(matches!(
            find_header_boundary(&config(), &LINES, 3),
            Err(BurnInError::HeaderNotFound { searched: 3, .. })
        ));
    }

    #[test]
    fn start_time_from_header_line() {
        let method = StartTimeMethod::from_spec(Some(&spec(
            "InFile",
            StrategyParams {
                re_pattern: Some("Start: (.*)".into()),
                time_pattern: Some("%Y-%m-%d %H:%M:%S".into()),
                ..Default::default()
            },
        )))
        .unwrap();
        let t = scan_start_time(&method, &LINES, 4, Path::new("x.csv"), &FieldSplitter::new(","));
        assert_eq!(t.to_string(), "2024-03-01 08:30:00");
    }

    #[test]
    fn start_time_from_path_uses_whole_match() {
        let method = StartTimeMethod::from_spec(Some(&spec(
            "InFilePath",
            StrategyParams {
                re_pattern: Some(r"\d{8}_\d{6}".into()),
                time_pattern: Some("%Y%m%d_%H%M%S".into()),
                ..Default::default()
            },
        )))
        .unwrap();
        let t = scan_start_time(
            &method,
            &LINES,
            4,
            Path::new("/logs/rack12_20240301_083000.csv"),
            &FieldSplitter::new(","),
        );
        assert_eq!(t.to_string(), "2024-03-01 08:30:00");
    }

    #[test]
    fn start_time_from_first_data_row() {
        let lines = ["Rack ID: 1", "Stamp,Power", " 2024-01-02 , 5"];
        let method = StartTimeMethod::from_spec(Some(&spec(
            "InData",
            StrategyParams {
                col_index: Some(0),
                time_pattern: Some("%Y-%m-%d".into()),
                ..Default::default()
            },
        )))
        .unwrap();
        let t = scan_start_time(&method, &lines, 2, Path::new("x"), &FieldSplitter::new(","));
        assert_eq!(t.to_string(), "2024-01-02 00:00:00");
    }

    #[test]
    fn unparseable_start_time_defaults_to_epoch() {
        let method = StartTimeMethod::from_spec(Some(&spec(
            "InFile",
            StrategyParams {
                re_pattern: Some("Start: (.*)".into()),
                time_pattern: Some("%d/%m/%Y".into()),
                ..Default::default()
            },
        )))
        .unwrap();
        let t = scan_start_time(&method, &LINES, 4, Path::new("x"), &FieldSplitter::new(","));
        assert_eq!(t, NaiveDateTime::default());
    }

    #[test]
    fn unknown_methods_fail() {
        assert!(matches!(
            StartTimeMethod::from_spec(Some(&spec(
                "Sundial",
                StrategyParams {
                    time_pattern: Some("%H".into()),
                    ..Default::default()
                }
            ))),
            Err(BurnInError::Timestamp { .. })
        ));
        assert!(matches!(
            IntervalMethod::from_spec(Some(&spec("Guess", StrategyParams::default()))),
            Err(BurnInError::Interval { .. })
        ));
        assert!(StartTimeMethod::from_spec(None).is_err());
    }

    #[test]
    fn interval_strategies() {
        let schema = config().schema().unwrap();

        let in_file = IntervalMethod::from_spec(Some(&spec(
            "InFile",
            StrategyParams {
                re_pattern: Some("Interval: (.*)".into()),
                time_pattern: Some("%H:%M:%S".into()),
                ..Default::default()
            },
        )))
        .unwrap();
        assert_eq!(scan_interval(&in_file, &LINES, 4, &schema).unwrap(), Interval::Known(5.0));

        let fixed = IntervalMethod::from_spec(Some(&spec(
            "value",
            StrategyParams {
                increment: Some(60.0),
                ..Default::default()
            },
        )))
        .unwrap();
        assert_eq!(scan_interval(&fixed, &LINES, 4, &schema).unwrap(), Interval::Known(60.0));

        let auto = IntervalMethod::Automatic {
            title: "Time".into(),
        };
        assert_eq!(
            scan_interval(&auto, &LINES, 4, &schema).unwrap(),
            Interval::Deferred {
                title: "Time".into()
            }
        );

        let auto_str = IntervalMethod::Automatic {
            title: "Channel".into(),
        };
        assert!(scan_interval(&auto_str, &LINES, 4, &schema).is_err());
    }

    #[test]
    fn durations_fall_back_to_seconds() {
        assert_eq!(parse_duration("00:01:30", "%H:%M:%S"), Some(90.0));
        assert_eq!(parse_duration(" 2.5 ", "%H:%M:%S"), Some(2.5));
        assert_eq!(parse_duration("soon", "%H:%M:%S"), None);
    }
}
