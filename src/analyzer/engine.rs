//! Evaluators - run a rule battery, aggregate, and build the report

use super::recommendations::RecommendationGenerator;
use super::rules::{
    dataset_rules, prompt_rules, Challenge, ChallengeSubmission, RequiredElementsRule, ScoringRule,
};
use super::tables::EvaluatorTables;
use super::{ScoreCalculator, ScoringWeights};
use crate::judge::{JudgeKind, JudgeRequest, NoJudge, QualityJudge};
use crate::{EvaluationError, EvaluationReport, RuleResult, TabularDataset};
use std::sync::Arc;

/// Rows included verbatim in the dataset summary sent to the judge
const JUDGE_SAMPLE_ROWS: usize = 5;

/// State shared by every evaluator: tables, weights, judge
#[derive(Clone)]
struct Scoring {
    tables: EvaluatorTables,
    weights: ScoringWeights,
    judge: Arc<dyn QualityJudge>,
}

impl Scoring {
    fn new() -> Self {
        Self {
            tables: EvaluatorTables::default(),
            weights: ScoringWeights::default(),
            judge: Arc::new(NoJudge),
        }
    }

    /// Ask the judge; any failure means "no judge score"
    fn judge_score(&self, request: &JudgeRequest) -> Option<f64> {
        match self.judge.judge(request) {
            Ok(Some(score)) => {
                tracing::debug!(score, "judge score");
                Some(score)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "judge unavailable, using rule scores only");
                None
            }
        }
    }

    fn finish(
        &self,
        rule_scores: Vec<RuleResult>,
        judge_score: Option<f64>,
        missing_elements: usize,
    ) -> EvaluationReport {
        let overall_score =
            ScoreCalculator::overall(&rule_scores, judge_score, missing_elements, &self.weights);
        let recommendations = RecommendationGenerator::new(
            &self.tables.remediations,
            self.weights.recommendation_threshold,
        )
        .generate(&rule_scores);
        tracing::info!(
            overall_score,
            rules = rule_scores.len(),
            judged = judge_score.is_some(),
            "evaluation complete"
        );
        EvaluationReport {
            overall_score,
            rule_scores,
            recommendations,
        }
    }
}

fn run_rules<I: ?Sized>(rules: &[Box<dyn ScoringRule<I>>], input: &I) -> Vec<RuleResult> {
    rules
        .iter()
        .map(|rule| {
            let result = rule.evaluate(input);
            tracing::debug!(rule = rule.id(), score = result.score, "rule evaluated");
            result
        })
        .collect()
}

macro_rules! scoring_builders {
    ($ty:ty) => {
        impl $ty {
            /// Replace keyword and remediation tables
            pub fn with_tables(mut self, tables: EvaluatorTables) -> Self {
                self.scoring.tables = tables;
                self.rebuild();
                self
            }

            /// Replace blending weights and penalty factors
            pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
                self.scoring.weights = weights;
                self.rebuild();
                self
            }

            /// Inject the judge collaborator
            pub fn with_judge(mut self, judge: Arc<dyn QualityJudge>) -> Self {
                self.scoring.judge = judge;
                self
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Scores free-text prompts
pub struct PromptEvaluator {
    scoring: Scoring,
    rules: Vec<Box<dyn ScoringRule<str>>>,
}

impl PromptEvaluator {
    pub fn new() -> Self {
        let scoring = Scoring::new();
        let rules = prompt_rules(&scoring.tables.keywords);
        Self { scoring, rules }
    }

    fn rebuild(&mut self) {
        self.rules = prompt_rules(&self.scoring.tables.keywords);
    }

    /// Rule results only (no judge, no aggregation)
    pub fn rule_scores(&self, prompt: &str) -> Vec<RuleResult> {
        run_rules(&self.rules, prompt)
    }

    /// Evaluate a prompt. Fails only when the prompt is empty.
    pub fn evaluate(&self, prompt: &str) -> Result<EvaluationReport, EvaluationError> {
        if prompt.trim().is_empty() {
            return Err(EvaluationError::EmptyPrompt);
        }
        let rule_scores = self.rule_scores(prompt);
        let judge_score = self.scoring.judge_score(&JudgeRequest::prompt(prompt));
        Ok(self.scoring.finish(rule_scores, judge_score, 0))
    }
}

scoring_builders!(PromptEvaluator);

/// Scores tabular datasets
pub struct DatasetEvaluator {
    scoring: Scoring,
    rules: Vec<Box<dyn ScoringRule<TabularDataset>>>,
}

impl DatasetEvaluator {
    pub fn new() -> Self {
        let scoring = Scoring::new();
        let rules = dataset_rules(&scoring.weights);
        Self { scoring, rules }
    }

    fn rebuild(&mut self) {
        self.rules = dataset_rules(&self.scoring.weights);
    }

    /// Evaluate a dataset. A dataset without rows yields a single zero-score result.
    pub fn evaluate(&self, dataset: &TabularDataset) -> Result<EvaluationReport, EvaluationError> {
        if dataset.is_empty() {
            tracing::info!("dataset has no rows");
            let rule_scores = vec![RuleResult::new("Dataset", "no data", 0.0)];
            return Ok(self.scoring.finish(rule_scores, None, 0));
        }
        let rule_scores = run_rules(&self.rules, dataset);
        let request = JudgeRequest {
            kind: JudgeKind::Dataset,
            content: summarize(dataset),
            context: None,
        };
        let judge_score = self.scoring.judge_score(&request);
        Ok(self.scoring.finish(rule_scores, judge_score, 0))
    }
}

scoring_builders!(DatasetEvaluator);

/// Text sketch of a dataset for the judge: shape, headers, first rows
fn summarize(dataset: &TabularDataset) -> String {
    let headers = dataset.headers();
    let mut out = format!(
        "{} rows, {} columns\n{}\n",
        dataset.row_count(),
        headers.len(),
        headers.join(";")
    );
    for index in 0..dataset.row_count().min(JUDGE_SAMPLE_ROWS) {
        let line: Vec<&str> = headers.iter().map(|h| dataset.cell(index, h)).collect();
        out.push_str(&line.join(";"));
        out.push('\n');
    }
    out
}

/// Scores a prompt submitted against a challenge
pub struct ChallengeEvaluator {
    scoring: Scoring,
    rules: Vec<Box<dyn ScoringRule<str>>>,
    required: RequiredElementsRule,
}

impl ChallengeEvaluator {
    pub fn new() -> Self {
        let scoring = Scoring::new();
        let rules = prompt_rules(&scoring.tables.keywords);
        Self {
            scoring,
            rules,
            required: RequiredElementsRule::new(),
        }
    }

    fn rebuild(&mut self) {
        self.rules = prompt_rules(&self.scoring.tables.keywords);
    }

    /// Evaluate a submission. Without a judge score, each missing required
    /// element costs `missing_element_penalty` points.
    pub fn evaluate(
        &self,
        challenge: &Challenge,
        prompt: &str,
    ) -> Result<EvaluationReport, EvaluationError> {
        if prompt.trim().is_empty() {
            return Err(EvaluationError::EmptyPrompt);
        }
        let submission = ChallengeSubmission { challenge, prompt };
        let mut rule_scores = run_rules(&self.rules, prompt);
        rule_scores.push(self.required.evaluate(&submission));

        let missing = challenge.missing_elements(prompt).len();
        let request = JudgeRequest {
            kind: JudgeKind::Challenge,
            content: prompt.to_string(),
            context: Some(format!("{}\n{}", challenge.title, challenge.description)),
        };
        let judge_score = self.scoring.judge_score(&request);
        Ok(self.scoring.finish(rule_scores, judge_score, missing))
    }
}

scoring_builders!(ChallengeEvaluator);

/// Aggregate statistics over a batch of reports
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AggregateStats {
    /// Number of inputs evaluated
    pub evaluated: usize,
    /// Average overall score (one decimal)
    pub average_score: f64,
    /// Lowest overall score
    pub min_score: f64,
    /// Total recommendations across reports
    pub total_recommendations: usize,
}

impl AggregateStats {
    pub fn from_reports<'a, I>(reports: I) -> Self
    where
        I: IntoIterator<Item = &'a EvaluationReport>,
    {
        let mut stats = AggregateStats {
            min_score: f64::INFINITY,
            ..AggregateStats::default()
        };
        let mut total = 0.0;
        for report in reports {
            stats.evaluated += 1;
            total += report.overall_score;
            stats.min_score = stats.min_score.min(report.overall_score);
            stats.total_recommendations += report.recommendations.len();
        }
        if stats.evaluated == 0 {
            return AggregateStats::default();
        }
        stats.average_score = crate::round1(total / stats.evaluated as f64);
        stats
    }
}
