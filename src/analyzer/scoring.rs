//! Aggregation of rule scores into one overall score

use crate::{round1, Grade, RuleResult};
use serde::{Deserialize, Serialize};

/// Tunable blending weights and penalty factors.
///
/// The defaults are empirical and kept for compatibility with existing
/// reports; none of them is load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    /// Weight of the judge score when one is available
    pub judge_weight: f64,
    /// Weight of the rule average when a judge score is available
    pub rule_weight: f64,
    /// Points removed per missing challenge element (rules-only path)
    pub missing_element_penalty: f64,
    /// Type consistency: points per percent of inconsistent values
    pub type_penalty: f64,
    /// Format validity: points per percent of invalid values
    pub format_penalty: f64,
    /// Distribution: points per percent of outliers
    pub outlier_penalty: f64,
    /// Distribution: outlier rate (percent) above which the penalty applies
    pub outlier_rate_trigger: f64,
    /// Rules scoring strictly below this get a recommendation
    pub recommendation_threshold: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            judge_weight: 0.7,
            rule_weight: 0.3,
            missing_element_penalty: 5.0,
            type_penalty: 0.5,
            format_penalty: 0.3,
            outlier_penalty: 0.2,
            outlier_rate_trigger: 20.0,
            recommendation_threshold: 60.0,
        }
    }
}

/// Calculator for overall scores
pub struct ScoreCalculator;

impl ScoreCalculator {
    /// Unweighted mean of the rule scores (0 when there are none)
    pub fn rule_average(rules: &[RuleResult]) -> f64 {
        if rules.is_empty() {
            return 0.0;
        }
        rules.iter().map(|r| r.score).sum::<f64>() / rules.len() as f64
    }

    /// Combine rule scores with an optional judge score.
    ///
    /// With a judge score: `judge_weight × judge + rule_weight × average`.
    /// Without: the rule average minus the missing-element penalty.
    /// The result is clamped to 0-100 and rounded to one decimal.
    pub fn overall(
        rules: &[RuleResult],
        judge_score: Option<f64>,
        missing_elements: usize,
        weights: &ScoringWeights,
    ) -> f64 {
        let average = Self::rule_average(rules);
        let raw = match judge_score.filter(|s| s.is_finite()) {
            Some(judge) => weights.judge_weight * judge + weights.rule_weight * average,
            None => average - weights.missing_element_penalty * missing_elements as f64,
        };
        round1(raw.clamp(0.0, 100.0))
    }

    /// Get a description of the grade
    pub fn grade_description(grade: Grade) -> &'static str {
        match grade {
            Grade::A => "Excellent - ready to use as is",
            Grade::B => "Good - a few details could be sharper",
            Grade::C => "Fair - usable but several aspects need work",
            Grade::D => "Poor - significant quality issues",
            Grade::F => "Failing - needs major improvements",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(scores: &[f64]) -> Vec<RuleResult> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| RuleResult::new(format!("r{}", i), "", *s))
            .collect()
    }

    #[test]
    fn test_rule_average() {
        assert_eq!(ScoreCalculator::rule_average(&rules(&[30.0, 60.0, 90.0])), 60.0);
        assert_eq!(ScoreCalculator::rule_average(&[]), 0.0);
    }

    #[test]
    fn test_overall_without_judge_is_rounded_average() {
        let r = rules(&[30.0, 40.0, 50.0, 50.0, 100.0, 50.0, 60.0]);
        let overall = ScoreCalculator::overall(&r, None, 0, &ScoringWeights::default());
        assert_eq!(overall, 54.3);
    }

    #[test]
    fn test_overall_blends_judge_score() {
        let r = rules(&[50.0, 50.0]);
        let overall = ScoreCalculator::overall(&r, Some(80.0), 0, &ScoringWeights::default());
        // 0.7 * 80 + 0.3 * 50 = 71
        assert_eq!(overall, 71.0);
    }

    #[test]
    fn test_judge_score_ignores_missing_elements() {
        let r = rules(&[50.0]);
        let overall = ScoreCalculator::overall(&r, Some(50.0), 4, &ScoringWeights::default());
        assert_eq!(overall, 50.0);
    }

    #[test]
    fn test_missing_elements_penalty() {
        let r = rules(&[80.0]);
        let overall = ScoreCalculator::overall(&r, None, 3, &ScoringWeights::default());
        assert_eq!(overall, 65.0);
    }

    #[test]
    fn test_overall_clamped() {
        let r = rules(&[10.0]);
        assert_eq!(
            ScoreCalculator::overall(&r, None, 10, &ScoringWeights::default()),
            0.0
        );
        assert_eq!(
            ScoreCalculator::overall(&r, Some(1000.0), 0, &ScoringWeights::default()),
            100.0
        );
    }

    #[test]
    fn test_non_finite_judge_score_is_ignored() {
        let r = rules(&[40.0]);
        assert_eq!(
            ScoreCalculator::overall(&r, Some(f64::NAN), 0, &ScoringWeights::default()),
            40.0
        );
    }

    #[test]
    fn test_weights_deserialize_partial() {
        let w: ScoringWeights = serde_json::from_str(r#"{"judgeWeight": 0.5}"#).unwrap();
        assert_eq!(w.judge_weight, 0.5);
        assert_eq!(w.rule_weight, 0.3);
    }

    #[test]
    fn test_grade_description_all_grades() {
        assert!(ScoreCalculator::grade_description(Grade::A).contains("Excellent"));
        assert!(ScoreCalculator::grade_description(Grade::B).contains("Good"));
        assert!(ScoreCalculator::grade_description(Grade::C).contains("Fair"));
        assert!(ScoreCalculator::grade_description(Grade::D).contains("Poor"));
        assert!(ScoreCalculator::grade_description(Grade::F).contains("Failing"));
    }
}
