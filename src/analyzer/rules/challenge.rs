//! Prompt-challenge support: a challenge lists elements a submitted prompt must cover.

use super::ScoringRule;
use crate::RuleResult;
use serde::{Deserialize, Serialize};

/// A prompt-writing challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Words or phrases the prompt is expected to mention
    #[serde(default)]
    pub required_elements: Vec<String>,
}

impl Challenge {
    /// Required elements absent from the prompt (case-insensitive substring)
    pub fn missing_elements(&self, prompt: &str) -> Vec<&str> {
        let lowered = prompt.to_lowercase();
        self.required_elements
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty() && !lowered.contains(&e.to_lowercase()))
            .collect()
    }
}

/// A prompt submitted against a challenge
#[derive(Debug, Clone, Copy)]
pub struct ChallengeSubmission<'a> {
    pub challenge: &'a Challenge,
    pub prompt: &'a str,
}

/// Share of the challenge's required elements the prompt covers
pub struct RequiredElementsRule;

impl RequiredElementsRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RequiredElementsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ScoringRule<ChallengeSubmission<'a>> for RequiredElementsRule {
    fn id(&self) -> &'static str {
        "required-elements"
    }

    fn evaluate(&self, submission: &ChallengeSubmission<'a>) -> RuleResult {
        let required = submission
            .challenge
            .required_elements
            .iter()
            .filter(|e| !e.trim().is_empty())
            .count();
        if required == 0 {
            return RuleResult::new(
                "Required Elements",
                "Challenge has no required elements",
                100.0,
            );
        }
        let missing = submission.challenge.missing_elements(submission.prompt);
        let present = required - missing.len();
        let description = if missing.is_empty() {
            "All required elements are covered".to_string()
        } else {
            format!("Missing: {}", missing.join(", "))
        };
        RuleResult::new(
            "Required Elements",
            description,
            100.0 * present as f64 / required as f64,
        )
    }
}
