//! Maps low-scoring rules to remediation messages

use super::tables::RemediationTable;
use crate::RuleResult;
use indexmap::IndexMap;

/// Turns rule results into deduplicated recommendations
pub struct RecommendationGenerator<'a> {
    table: &'a RemediationTable,
    threshold: f64,
}

impl<'a> RecommendationGenerator<'a> {
    pub fn new(table: &'a RemediationTable, threshold: f64) -> Self {
        Self { table, threshold }
    }

    /// Recommendations for every rule scoring below the threshold.
    ///
    /// Entries sharing a key collapse into one: the message of the last rule
    /// wins, the position of the first one is kept. Rules without a table
    /// entry are skipped.
    pub fn generate(&self, rules: &[RuleResult]) -> Vec<String> {
        let mut by_key: IndexMap<&str, &str> = IndexMap::new();
        for rule in rules.iter().filter(|r| r.score < self.threshold) {
            match self.table.get(&rule.name) {
                Some(remediation) => {
                    by_key.insert(remediation.key.as_str(), remediation.message.as_str());
                }
                None => tracing::debug!(rule = %rule.name, "no remediation for rule"),
            }
        }
        by_key.into_values().map(str::to_string).collect()
    }
}
