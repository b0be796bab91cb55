//! Tabular dataset model and ingestion (CSV / JSON)

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while building or loading a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON input must be an object or an array of objects")]
    UnsupportedJson,

    #[error("row {0} is not a JSON object")]
    NotAnObject(usize),

    #[error("dataset has no header row")]
    MissingHeader,

    #[error("duplicate header: {0}")]
    DuplicateHeader(String),

    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),
}

/// Source format of a dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") | Some("txt") => Some(DatasetFormat::Csv),
            Some("json") => Some(DatasetFormat::Json),
            _ => None,
        }
    }
}

/// Options for reading CSV input.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ';')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            quote: b'"',
        }
    }
}

/// A parsed table: ordered unique headers and rows keyed by header.
///
/// Every row holds exactly one entry per header; missing values are empty
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct TabularDataset {
    headers: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

/// Unchecked wire form, validated through [`TabularDataset::new`]
#[derive(Deserialize)]
struct RawDataset {
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<HashMap<String, String>>,
}

impl TryFrom<RawDataset> for TabularDataset {
    type Error = DatasetError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        Self::new(raw.headers, raw.rows)
    }
}

impl TabularDataset {
    /// Build a dataset, normalizing rows to the header set.
    pub fn new(
        headers: Vec<String>,
        rows: Vec<HashMap<String, String>>,
    ) -> Result<Self, DatasetError> {
        let mut seen = IndexSet::with_capacity(headers.len());
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(DatasetError::DuplicateHeader(header.clone()));
            }
        }
        let mut dataset = Self {
            headers,
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            dataset.push_row(row);
        }
        Ok(dataset)
    }

    /// Append a row; keys outside the header set are dropped, absent ones become "".
    pub fn push_row(&mut self, mut row: HashMap<String, String>) {
        let normalized = self
            .headers
            .iter()
            .map(|h| (h.clone(), row.remove(h).unwrap_or_default()))
            .collect();
        self.rows.push(normalized);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[HashMap<String, String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }

    /// Cell value, "" when absent
    pub fn cell(&self, row: usize, header: &str) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(header))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// All values of one column, in row order
    pub fn column<'a>(&'a self, header: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows
            .iter()
            .map(move |r| r.get(header).map(String::as_str).unwrap_or(""))
    }

    /// Parse delimited text with a header row first.
    pub fn from_csv_str(input: &str, options: &CsvOptions) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(input.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim_start_matches('\u{feff}').trim();
                if h.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    h.to_string()
                }
            })
            .collect();

        if headers.is_empty() || input.trim().is_empty() {
            return Err(DatasetError::MissingHeader);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
                .collect();
            rows.push(row);
        }

        Self::new(headers, rows)
    }

    /// Parse an array of flat objects, or a single object treated as one row.
    pub fn from_json_str(input: &str) -> Result<Self, DatasetError> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        let objects = match value {
            serde_json::Value::Array(items) => items,
            obj @ serde_json::Value::Object(_) => vec![obj],
            _ => return Err(DatasetError::UnsupportedJson),
        };

        let mut headers: IndexSet<String> = IndexSet::new();
        let mut rows = Vec::with_capacity(objects.len());
        for (index, item) in objects.into_iter().enumerate() {
            let serde_json::Value::Object(map) = item else {
                return Err(DatasetError::NotAnObject(index));
            };
            let mut row = HashMap::with_capacity(map.len());
            for (key, value) in map {
                headers.insert(key.clone());
                row.insert(key, json_cell(value));
            }
            rows.push(row);
        }

        Self::new(headers.into_iter().collect(), rows)
    }

    /// Load a dataset file, picking the format from its extension.
    pub fn load(path: &Path, options: &CsvOptions) -> Result<Self, DatasetError> {
        let format = DatasetFormat::from_path(path)
            .ok_or_else(|| DatasetError::UnsupportedFormat(path.display().to_string()))?;
        Self::load_as(path, format, options)
    }

    /// Load a dataset file with an explicit format.
    pub fn load_as(
        path: &Path,
        format: DatasetFormat,
        options: &CsvOptions,
    ) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = match format {
            DatasetFormat::Csv => Self::from_csv_str(&content, options)?,
            DatasetFormat::Json => Self::from_json_str(&content)?,
        };
        tracing::debug!(
            path = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.headers.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }
}

fn json_cell(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}
