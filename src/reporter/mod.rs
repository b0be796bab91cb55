//! Reporter module for output formatting

pub mod console;
pub mod json;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

use crate::EvaluationReport;
use serde::Serialize;

/// A report tagged with where its input came from (file path or `<stdin>`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcedReport {
    pub source: String,
    #[serde(flatten)]
    pub report: EvaluationReport,
}

impl SourcedReport {
    pub fn new(source: impl Into<String>, report: EvaluationReport) -> Self {
        Self {
            source: source.into(),
            report,
        }
    }
}
