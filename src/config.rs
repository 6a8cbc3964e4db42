use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// How CSV files are turned into trees.
pub struct CsvOptions {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_has_header")]
    pub has_header: bool,
    /// Rows sampled to infer leaf types; `None` reads the whole file.
    #[serde(default = "default_max_infer_records")]
    pub max_infer_records: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_delimiter() -> char { ',' }
fn default_has_header() -> bool { true }
fn default_max_infer_records() -> Option<usize> { Some(100) }
fn default_batch_size() -> usize { 8192 }

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            has_header: default_has_header(),
            max_infer_records: default_max_infer_records(),
            batch_size: default_batch_size(),
        }
    }
}

impl CsvOptions {
    /// The delimiter as the single byte the CSV reader expects. Only ASCII
    /// characters are one byte long in UTF-8 text.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.is_ascii().then(|| self.delimiter as u8)
    }
}

#[derive(Debug, Clone, Deserialize)]
/// Everything needed to build a `RecordIterator` from a JSON document.
pub struct IteratorConfig {
    #[serde(rename = "fileName", alias = "file_name")]
    pub file_name: String,
    pub path: String,
    /// Leaf names to decode; all leaves when absent. Kept untyped so that a
    /// malformed selection is reported as a selection error.
    #[serde(default)]
    pub selection: Option<serde_json::Value>,
    #[serde(default)]
    pub csv: CsvOptions,
}

impl IteratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The configured selection, validated as a list of leaf names.
    pub fn selection(&self) -> Result<Option<Vec<String>>> {
        self.selection.as_ref().map(selection_from_value).transpose()
    }
}

/// Converts an untyped selection into leaf names. Anything other than an
/// array of strings is rejected.
pub fn selection_from_value(value: &serde_json::Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::selection(value.to_string()))?;
    items
        .iter()
        .map(|item| match item.as_str() {
            Some(name) => Ok(name.to_string()),
            None => Err(Error::selection(item.to_string())),
        })
        .collect()
}
