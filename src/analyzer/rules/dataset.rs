//! Tabular data-quality rules.
//!
//! Penalty rules start at 100 and subtract `factor × rate%` per offending
//! column, flooring at 0. Cells that fail a check are penalties, never errors.

use super::ScoringRule;
use crate::analyzer::stats::{iqr_fences, parse_number, sorted};
use crate::{RuleResult, TabularDataset};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex is valid")
    })
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Column type inferred from its first non-empty value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Numeric,
    Email,
    Text,
}

impl InferredType {
    pub fn of(value: &str) -> Self {
        let value = value.trim();
        if parse_number(value).is_some() {
            InferredType::Numeric
        } else if email_pattern().is_match(value) {
            InferredType::Email
        } else {
            InferredType::Text
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            InferredType::Numeric => parse_number(value).is_some(),
            InferredType::Email => email_pattern().is_match(value.trim()),
            InferredType::Text => true,
        }
    }
}

impl std::fmt::Display for InferredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferredType::Numeric => write!(f, "numeric"),
            InferredType::Email => write!(f, "email"),
            InferredType::Text => write!(f, "text"),
        }
    }
}

/// Infer a column's type from its first non-empty value
pub fn infer_column_type(dataset: &TabularDataset, header: &str) -> Option<InferredType> {
    dataset
        .column(header)
        .find(|v| !is_blank(v))
        .map(InferredType::of)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Share of non-empty cells over every (row, header) pair
pub struct CompletenessRule;

impl CompletenessRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CompletenessRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringRule<TabularDataset> for CompletenessRule {
    fn id(&self) -> &'static str {
        "completeness"
    }

    fn evaluate(&self, dataset: &TabularDataset) -> RuleResult {
        let total = dataset.row_count() * dataset.headers().len();
        let filled = dataset
            .headers()
            .iter()
            .map(|h| dataset.column(h).filter(|v| !is_blank(v)).count())
            .sum::<usize>();
        let score = if total == 0 {
            0.0
        } else {
            percent(filled, total)
        };
        RuleResult::new(
            "Completeness",
            format!("{} of {} cells are filled", filled, total),
            score,
        )
    }
}

/// Penalizes values that disagree with their column's inferred type
pub struct TypeConsistencyRule {
    penalty_factor: f64,
}

impl TypeConsistencyRule {
    pub fn new(penalty_factor: f64) -> Self {
        Self { penalty_factor }
    }
}

impl ScoringRule<TabularDataset> for TypeConsistencyRule {
    fn id(&self) -> &'static str {
        "type-consistency"
    }

    fn evaluate(&self, dataset: &TabularDataset) -> RuleResult {
        let mut score = 100.0;
        let mut offenders = Vec::new();

        for header in dataset.headers() {
            let Some(expected) = infer_column_type(dataset, header) else {
                continue;
            };
            let values: Vec<&str> = dataset.column(header).filter(|v| !is_blank(v)).collect();
            let violations = values.iter().filter(|v| !expected.accepts(v)).count();
            if violations > 0 {
                let rate = percent(violations, values.len());
                score -= self.penalty_factor * rate;
                offenders.push(format!("{} ({:.0}% not {})", header, rate, expected));
            }
        }

        let description = if offenders.is_empty() {
            "Every column holds a single value type".to_string()
        } else {
            format!("Mixed types in: {}", offenders.join(", "))
        };
        RuleResult::new("Type Consistency", description, score.max(0.0))
    }
}

/// Flags rows whose content repeats another row
pub struct UniquenessRule;

impl UniquenessRule {
    pub fn new() -> Self {
        Self
    }

    /// Indices of every row that shares its content with another row
    pub fn duplicate_rows(dataset: &TabularDataset) -> Vec<usize> {
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut duplicates: HashSet<usize> = HashSet::new();
        for index in 0..dataset.row_count() {
            let key = canonical_row(dataset, index);
            match first_seen.get(&key) {
                Some(&first) => {
                    duplicates.insert(first);
                    duplicates.insert(index);
                }
                None => {
                    first_seen.insert(key, index);
                }
            }
        }
        let mut out: Vec<usize> = duplicates.into_iter().collect();
        out.sort_unstable();
        out
    }
}

impl Default for UniquenessRule {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical_row(dataset: &TabularDataset, index: usize) -> String {
    let values: Vec<&str> = dataset
        .headers()
        .iter()
        .map(|h| dataset.cell(index, h))
        .collect();
    serde_json::to_string(&values).unwrap_or_default()
}

impl ScoringRule<TabularDataset> for UniquenessRule {
    fn id(&self) -> &'static str {
        "uniqueness"
    }

    fn evaluate(&self, dataset: &TabularDataset) -> RuleResult {
        let rows = dataset.row_count();
        let duplicates = Self::duplicate_rows(dataset).len();
        let score = if rows == 0 {
            0.0
        } else {
            100.0 * (1.0 - duplicates as f64 / rows as f64)
        };
        RuleResult::new(
            "Uniqueness",
            format!("{} of {} rows are duplicated", duplicates, rows),
            score.max(0.0),
        )
    }
}

/// Checks email-looking columns against a simple address pattern
pub struct FormatValidityRule {
    penalty_factor: f64,
}

impl FormatValidityRule {
    pub fn new(penalty_factor: f64) -> Self {
        Self { penalty_factor }
    }

    fn is_email_column(header: &str) -> bool {
        let lowered = header.to_lowercase();
        lowered.contains("email") || lowered.contains("mail")
    }
}

impl ScoringRule<TabularDataset> for FormatValidityRule {
    fn id(&self) -> &'static str {
        "format-validity"
    }

    fn evaluate(&self, dataset: &TabularDataset) -> RuleResult {
        let mut score = 100.0;
        let mut offenders = Vec::new();

        for header in dataset.headers().iter().filter(|h| Self::is_email_column(h)) {
            let values: Vec<&str> = dataset.column(header).filter(|v| !is_blank(v)).collect();
            let invalid = values
                .iter()
                .filter(|v| !email_pattern().is_match(v.trim()))
                .count();
            if invalid > 0 {
                let rate = percent(invalid, values.len());
                score -= self.penalty_factor * rate;
                offenders.push(format!("{} ({} invalid)", header, invalid));
            }
        }

        let description = if offenders.is_empty() {
            "All checked formats are valid".to_string()
        } else {
            format!("Invalid email addresses in: {}", offenders.join(", "))
        };
        RuleResult::new("Format Validity", description, score.max(0.0))
    }
}

/// IQR outlier check on numeric columns with enough samples
pub struct DistributionRule {
    penalty_factor: f64,
    rate_trigger: f64,
    min_samples: usize,
}

impl DistributionRule {
    pub fn new(penalty_factor: f64, rate_trigger: f64) -> Self {
        Self {
            penalty_factor,
            rate_trigger,
            min_samples: 10,
        }
    }
}

impl ScoringRule<TabularDataset> for DistributionRule {
    fn id(&self) -> &'static str {
        "distribution"
    }

    fn evaluate(&self, dataset: &TabularDataset) -> RuleResult {
        let mut score = 100.0;
        let mut offenders = Vec::new();

        for header in dataset.headers() {
            if infer_column_type(dataset, header) != Some(InferredType::Numeric) {
                continue;
            }
            let values: Vec<f64> = dataset.column(header).filter_map(parse_number).collect();
            if values.len() <= self.min_samples {
                continue;
            }
            let ordered = sorted(&values);
            let Some((low, high)) = iqr_fences(&ordered, 1.5) else {
                continue;
            };
            let outliers = values.iter().filter(|v| **v < low || **v > high).count();
            let rate = percent(outliers, values.len());
            if rate > self.rate_trigger {
                score -= self.penalty_factor * rate;
                offenders.push(format!("{} ({:.0}% outliers)", header, rate));
            }
        }

        let description = if offenders.is_empty() {
            "No column has an abnormal share of outliers".to_string()
        } else {
            format!("Heavy outlier share in: {}", offenders.join(", "))
        };
        RuleResult::new("Distribution", description, score.max(0.0))
    }
}
