//! Analyzer module - rule batteries, aggregation and recommendations

pub mod engine;
pub mod recommendations;
pub mod rules;
pub mod scoring;
pub mod stats;
pub mod tables;

pub use engine::{AggregateStats, ChallengeEvaluator, DatasetEvaluator, PromptEvaluator};
pub use recommendations::RecommendationGenerator;
pub use scoring::{ScoreCalculator, ScoringWeights};
pub use tables::{EvaluatorTables, KeywordTables, Remediation, RemediationTable};
