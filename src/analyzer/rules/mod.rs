//! Scoring rules for prompts and datasets

pub mod challenge;
pub mod dataset;
pub mod prompt;

pub use challenge::{Challenge, ChallengeSubmission, RequiredElementsRule};
pub use dataset::{
    CompletenessRule, DistributionRule, FormatValidityRule, TypeConsistencyRule, UniquenessRule,
};
pub use prompt::{KeywordPresenceRule, LengthRule, StructureRule};

use crate::analyzer::tables::KeywordTables;
use crate::analyzer::ScoringWeights;
use crate::{RuleResult, TabularDataset};

/// Trait for scoring rules.
///
/// A rule inspects one input and produces exactly one [`RuleResult`]. Rules
/// never see each other's output and must not panic on malformed input.
pub trait ScoringRule<I: ?Sized>: Send + Sync {
    /// Stable kebab-case identifier of the rule
    fn id(&self) -> &'static str;

    /// Score the input (0-100)
    fn evaluate(&self, input: &I) -> RuleResult;
}

/// Ordered prompt rule battery
pub fn prompt_rules(keywords: &KeywordTables) -> Vec<Box<dyn ScoringRule<str>>> {
    vec![
        Box::new(LengthRule::new()),
        Box::new(KeywordPresenceRule::context(keywords.context.clone())),
        Box::new(KeywordPresenceRule::role(keywords.role.clone())),
        Box::new(KeywordPresenceRule::format(keywords.format.clone())),
        Box::new(KeywordPresenceRule::instructions(
            keywords.instructions.clone(),
        )),
        Box::new(StructureRule::new()),
        Box::new(KeywordPresenceRule::examples(keywords.examples.clone())),
    ]
}

/// Ordered dataset rule battery
pub fn dataset_rules(weights: &ScoringWeights) -> Vec<Box<dyn ScoringRule<TabularDataset>>> {
    vec![
        Box::new(CompletenessRule::new()),
        Box::new(TypeConsistencyRule::new(weights.type_penalty)),
        Box::new(UniquenessRule::new()),
        Box::new(FormatValidityRule::new(weights.format_penalty)),
        Box::new(DistributionRule::new(
            weights.outlier_penalty,
            weights.outlier_rate_trigger,
        )),
    ]
}
