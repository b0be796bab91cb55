//! Gauge: Heuristic Quality Scorer
//!
//! This library scores LLM prompts and tabular datasets with a fixed battery of
//! independent heuristic rules, optionally blends in a qualitative score from an
//! LLM judge, and turns low-scoring rules into actionable recommendations.

pub mod analyzer;
pub mod anomaly;
pub mod config;
pub mod dataset;
pub mod error;
pub mod judge;
pub mod logging;
pub mod reporter;

pub use analyzer::{ChallengeEvaluator, DatasetEvaluator, PromptEvaluator};
pub use dataset::TabularDataset;
pub use error::EvaluationError;

use serde::{Deserialize, Serialize};

/// Outcome of a single scoring rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    /// Human-readable rule name (also the remediation lookup key)
    pub name: String,
    /// What the rule observed
    pub description: String,
    /// Score (0-100)
    pub score: f64,
}

impl RuleResult {
    /// Build a result, clamping the score into 0-100
    pub fn new(name: impl Into<String>, description: impl Into<String>, score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            name: name.into(),
            description: description.into(),
            score,
        }
    }
}

/// The result of one evaluation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    /// Overall score (0-100, one decimal)
    pub overall_score: f64,
    /// One entry per rule, in evaluation order
    pub rule_scores: Vec<RuleResult>,
    /// Deduplicated remediation hints for low-scoring rules
    pub recommendations: Vec<String>,
}

impl EvaluationReport {
    /// Letter grade for the overall score
    pub fn grade(&self) -> Grade {
        Grade::from_score(self.overall_score)
    }

    /// Look up a rule result by name
    pub fn rule(&self, name: &str) -> Option<&RuleResult> {
        self.rule_scores.iter().find(|r| r.name == name)
    }
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::A,
            s if s >= 80.0 => Grade::B,
            s if s >= 70.0 => Grade::C,
            s if s >= 60.0 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::F => write!(f, "F"),
        }
    }
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Public API: score a prompt with the default rule tables and no judge.
pub fn evaluate_prompt(prompt: &str) -> Result<EvaluationReport, EvaluationError> {
    PromptEvaluator::new().evaluate(prompt)
}

/// Public API: score a dataset with the default rule tables and no judge.
pub fn evaluate_dataset(dataset: &TabularDataset) -> Result<EvaluationReport, EvaluationError> {
    DatasetEvaluator::new().evaluate(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_from_score() {
        assert_eq!(Grade::from_score(100.0), Grade::A);
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.9), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(79.9), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.9), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn test_rule_result_clamps() {
        assert_eq!(RuleResult::new("x", "", 140.0).score, 100.0);
        assert_eq!(RuleResult::new("x", "", -3.0).score, 0.0);
        assert_eq!(RuleResult::new("x", "", f64::NAN).score, 0.0);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = EvaluationReport {
            overall_score: 54.3,
            rule_scores: vec![RuleResult::new("Length", "too short", 30.0)],
            recommendations: vec!["Develop the prompt".to_string()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overallScore"], 54.3);
        assert_eq!(json["ruleScores"][0]["name"], "Length");
        assert_eq!(json["ruleScores"][0]["score"], 30.0);
        assert_eq!(json["recommendations"][0], "Develop the prompt");
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(54.285), 54.3);
        assert_eq!(round1(85.0), 85.0);
        assert_eq!(round1(33.33333), 33.3);
    }
}
