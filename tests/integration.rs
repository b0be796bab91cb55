//! Library-level tests against the fixtures in test-data/

use gauge::analyzer::rules::Challenge;
use gauge::analyzer::{EvaluatorTables, KeywordTables};
use gauge::anomaly::{AnomalyDetector, AnomalyMethod};
use gauge::config::load_config;
use gauge::dataset::CsvOptions;
use gauge::{ChallengeEvaluator, DatasetEvaluator, Grade, PromptEvaluator, TabularDataset};
use std::fs;
use std::path::Path;

fn prompt(name: &str) -> String {
    fs::read_to_string(Path::new("test-data/prompts").join(name)).unwrap()
}

fn dataset(name: &str) -> TabularDataset {
    TabularDataset::load(
        &Path::new("test-data/datasets").join(name),
        &CsvOptions::default(),
    )
    .unwrap()
}

#[test]
fn good_prompt_scores_a() {
    let report = gauge::evaluate_prompt(&prompt("good.txt")).unwrap();
    assert_eq!(report.overall_score, 97.1);
    assert_eq!(report.grade(), Grade::A);
    assert!(report.recommendations.is_empty());
}

#[test]
fn weak_prompt_gets_recommendations_in_rule_order() {
    let report = gauge::evaluate_prompt(&prompt("weak.txt")).unwrap();
    assert_eq!(report.overall_score, 54.3);
    assert_eq!(report.grade(), Grade::F);
    assert_eq!(report.recommendations.len(), 5);
    assert!(report.recommendations[0].starts_with("Develop the prompt"));
    assert!(report.recommendations[4].starts_with("Structure the prompt"));
}

#[test]
fn weak_prompt_scores_lower_than_good_prompt() {
    let evaluator = PromptEvaluator::new();
    let good = evaluator.evaluate(&prompt("good.txt")).unwrap();
    let weak = evaluator.evaluate(&prompt("weak.txt")).unwrap();
    assert!(weak.overall_score < good.overall_score);
}

#[test]
fn customers_dataset_scores() {
    let report = gauge::evaluate_dataset(&dataset("customers.csv")).unwrap();
    assert_eq!(report.rule("Completeness").unwrap().score, 95.0);
    assert_eq!(report.rule("Type Consistency").unwrap().score, 67.5);
    assert_eq!(report.rule("Uniqueness").unwrap().score, 60.0);
    assert_eq!(report.rule("Format Validity").unwrap().score, 92.5);
    assert_eq!(report.rule("Distribution").unwrap().score, 100.0);
    assert_eq!(report.overall_score, 83.0);
    assert!(report.recommendations.is_empty());
}

#[test]
fn csv_and_json_fixtures_agree() {
    let csv = dataset("customers.csv");
    let json = dataset("customers.json");
    assert_eq!(csv.row_count(), json.row_count());
    assert_eq!(csv.headers(), json.headers());
    let evaluator = DatasetEvaluator::new();
    assert_eq!(
        evaluator.evaluate(&csv).unwrap().rule_scores,
        evaluator.evaluate(&json).unwrap().rule_scores
    );
}

#[test]
fn challenge_fixture_penalizes_missing_elements() {
    let content = fs::read_to_string("test-data/challenges/bail.json").unwrap();
    let challenge: Challenge = serde_json::from_str(&content).unwrap();
    let report = ChallengeEvaluator::new()
        .evaluate(&challenge, &prompt("good.txt"))
        .unwrap();
    assert_eq!(report.overall_score, 81.3);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.contains("every element the challenge asks for")));
}

#[test]
fn amounts_fixture_anomalies() {
    let ds = dataset("amounts.csv");
    let zscore = AnomalyDetector::new(AnomalyMethod::ZScore)
        .detect(&ds, "amount")
        .unwrap();
    assert_eq!(zscore.anomalies.len(), 1);
    assert_eq!(zscore.anomalies[0].value, 500.0);

    let percentile = AnomalyDetector::new(AnomalyMethod::Percentile)
        .detect(&ds, "amount")
        .unwrap();
    assert!(percentile.anomalies.iter().any(|a| a.value == 500.0));
}

#[test]
fn fixture_config_is_found_from_prompt_dir() {
    let config = load_config(Path::new("test-data/prompts"), None).unwrap();
    assert_eq!(config.ignore, vec!["**/drafts/**"]);
}

#[test]
fn custom_tables_change_scores() {
    let tables = EvaluatorTables {
        keywords: KeywordTables {
            context: vec!["contract".to_string()],
            role: vec!["you are".to_string()],
            format: vec!["bullet".to_string()],
            instructions: vec!["summarize".to_string()],
            examples: vec!["at most".to_string()],
        },
        ..EvaluatorTables::default()
    };
    let english = "You are a lawyer.\nSummarize the contract below in bullet points, at most five.";
    let default_report = PromptEvaluator::new().evaluate(english).unwrap();
    let custom_report = PromptEvaluator::new()
        .with_tables(tables)
        .evaluate(english)
        .unwrap();
    assert!(custom_report.overall_score > default_report.overall_score);
    assert_eq!(custom_report.overall_score, 97.1);
}
