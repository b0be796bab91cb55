//! JSON reporter for machine-readable output

use super::SourcedReport;
use crate::analyzer::AggregateStats;
use crate::anomaly::AnomalyReport;
use crate::{EvaluationReport, Grade};
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| fallback.to_string())
    }

    /// A single report, exactly `{overallScore, ruleScores, recommendations}`
    pub fn report(&self, report: &EvaluationReport) -> String {
        self.render(report, "{}")
    }

    pub fn report_anomalies(&self, report: &AnomalyReport) -> String {
        self.render(report, "{}")
    }

    /// Report with summary
    pub fn report_with_summary(
        &self,
        results: &[SourcedReport],
        stats: &AggregateStats,
    ) -> String {
        let output = JsonOutput {
            results,
            summary: JsonSummary {
                evaluated: stats.evaluated,
                average_score: stats.average_score,
                average_grade: Grade::from_score(stats.average_score).to_string(),
                min_score: stats.min_score,
                total_recommendations: stats.total_recommendations,
            },
        };
        self.render(&output, "{}")
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    results: &'a [SourcedReport],
    summary: JsonSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    evaluated: usize,
    average_score: f64,
    average_grade: String,
    min_score: f64,
    total_recommendations: usize,
}
