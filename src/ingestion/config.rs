//! Declarative format configurations and the config library loader.
//!
//! A format config describes one family of log files: how to recognise it, where its header
//! ends, what its columns are, and how to find the test start time and measurement interval.
//! Configs are JSON documents (see [`ConfigDocument`]); a config location is either a directory
//! of `*.json` files or a single file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use crate::error::{BurnInError, BurnInResult};
use crate::types::{DataType, Field, Schema};

/// Raw JSON shape of one format config.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    pub name: String,
    #[serde(default)]
    pub file_identifier: Option<String>,
    #[serde(default)]
    pub header_identifier: Option<String>,
    #[serde(default = "default_delim")]
    pub delim: String,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub types: Vec<DataType>,
    #[serde(default)]
    pub trim_filter_key: Option<String>,
    #[serde(default)]
    pub start_time: Option<StrategySpec>,
    #[serde(default)]
    pub interval: Option<StrategySpec>,
}

fn default_delim() -> String {
    ",".to_string()
}

/// A `{ "method": ..., "params": {...} }` block.
///
/// The method name is resolved when a file is scanned, so an unknown method fails that file
/// rather than the whole config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StrategySpec {
    pub method: String,
    #[serde(default)]
    pub params: StrategyParams,
}

/// Union of the parameters used by the start-time and interval strategies.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StrategyParams {
    #[serde(default)]
    pub re_pattern: Option<String>,
    #[serde(default)]
    pub time_pattern: Option<String>,
    #[serde(default)]
    pub col_index: Option<usize>,
    #[serde(default)]
    pub increment: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A validated format config, shared read-only by every file that matches it.
#[derive(Debug, Clone)]
pub struct FormatConfig {
    pub name: String,
    /// Identifying pattern, anchored to match a whole line.
    pub file_identifier: Regex,
    /// Header pattern, anchored to match a whole line.
    pub header_identifier: Option<Regex>,
    /// Set of delimiter characters.
    pub delim: String,
    pub titles: Vec<String>,
    pub types: Vec<DataType>,
    pub trim_filter_key: Option<String>,
    pub start_time: Option<StrategySpec>,
    pub interval: Option<StrategySpec>,
}

impl FormatConfig {
    /// Validate a decoded document and compile its line patterns.
    pub fn from_document(doc: ConfigDocument) -> BurnInResult<Self> {
        let identifier = doc
            .file_identifier
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| BurnInError::config(format!("config '{}' has no file_identifier", doc.name)))?;
        let file_identifier = whole_line_regex(identifier)?;
        let header_identifier = doc
            .header_identifier
            .as_deref()
            .map(whole_line_regex)
            .transpose()?;

        Ok(Self {
            name: doc.name,
            file_identifier,
            header_identifier,
            delim: doc.delim,
            titles: doc.titles,
            types: doc.types,
            trim_filter_key: doc.trim_filter_key,
            start_time: doc.start_time,
            interval: doc.interval,
        })
    }

    /// Decode and validate a single JSON object.
    pub fn from_json_str(json: &str) -> BurnInResult<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    /// Titles paired with declared types, in column order.
    ///
    /// Fails when the two lists differ in length.
    pub fn schema(&self) -> BurnInResult<Schema> {
        if self.titles.len() != self.types.len() {
            return Err(BurnInError::SchemaMismatch {
                message: format!(
                    "config '{}' declares {} titles but {} types",
                    self.name,
                    self.titles.len(),
                    self.types.len()
                ),
            });
        }
        Ok(Schema::new(
            self.titles
                .iter()
                .zip(&self.types)
                .map(|(t, ty)| Field::new(t.clone(), *ty))
                .collect(),
        ))
    }
}

/// Compile `pattern` so that it only matches an entire line.
pub(crate) fn whole_line_regex(pattern: &str) -> BurnInResult<Regex> {
    Ok(Regex::new(&format!("^(?:{pattern})$"))?)
}

/// Format configs keyed by name.
///
/// Iteration is in name order, which makes first-match-wins format detection reproducible.
#[derive(Debug, Clone, Default)]
pub struct ConfigLibrary {
    configs: BTreeMap<String, Arc<FormatConfig>>,
}

impl ConfigLibrary {
    /// Build a library from already-validated configs.
    ///
    /// Two configs sharing a name are an ambiguous-name error.
    pub fn from_configs(configs: impl IntoIterator<Item = FormatConfig>) -> BurnInResult<Self> {
        let mut lib = Self::default();
        for cfg in configs {
            lib.insert(cfg)?;
        }
        Ok(lib)
    }

    /// Load every config found at `location` (a directory of `*.json` files, or one file).
    ///
    /// Documents that fail to decode, or lack a usable identifying pattern, are skipped with a
    /// warning. A missing location and duplicate config names are fatal.
    pub fn load(location: impl AsRef<Path>) -> BurnInResult<Self> {
        let location = location.as_ref();
        if !location.exists() {
            return Err(BurnInError::config(format!(
                "config location does not exist ({})",
                location.display()
            )));
        }

        let files = if location.is_dir() {
            let pattern = format!(
                "{}/*.json",
                glob::Pattern::escape(&location.to_string_lossy())
            );
            let mut files = Vec::new();
            for entry in glob::glob(&pattern)? {
                match entry {
                    Ok(path) => files.push(path),
                    Err(err) => {
                        return Err(BurnInError::config(format!(
                            "unable to read config directory ({}): {err}",
                            location.display()
                        )));
                    }
                }
            }
            files
        } else {
            vec![location.to_path_buf()]
        };

        let mut lib = Self::default();
        for path in files {
            let text = match fs::read_to_string(&path) {
                Ok(t) => t,
                Err(err) => {
                    warn!("skipping unreadable config {}: {err}", path.display());
                    continue;
                }
            };
            lib.insert_documents(&text, &path.display().to_string())?;
        }
        debug!("loaded {} format configs from {}", lib.len(), location.display());
        Ok(lib)
    }

    /// Add the configs held in one JSON document (an object or an array of objects).
    pub fn insert_documents(&mut self, json: &str, origin: &str) -> BurnInResult<()> {
        let value: serde_json::Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(err) => {
                warn!("skipping invalid config document {origin}: {err}");
                return Ok(());
            }
        };
        let items = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        for item in items {
            let cfg = serde_json::from_value::<ConfigDocument>(item)
                .map_err(BurnInError::from)
                .and_then(FormatConfig::from_document);
            match cfg {
                Ok(cfg) => self.insert(cfg)?,
                Err(err) => warn!("skipping config in {origin}: {err}"),
            }
        }
        Ok(())
    }

    fn insert(&mut self, cfg: FormatConfig) -> BurnInResult<()> {
        if self.configs.contains_key(&cfg.name) {
            return Err(BurnInError::config(format!(
                "ambiguous format name '{}' (defined more than once)",
                cfg.name
            )));
        }
        self.configs.insert(cfg.name.clone(), Arc::new(cfg));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FormatConfig>> {
        self.configs.get(name)
    }

    /// Configs in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<FormatConfig>> {
        self.configs.values()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
