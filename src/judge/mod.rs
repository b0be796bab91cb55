//! Optional LLM judge that contributes a qualitative score.
//!
//! The judge is strictly additive: evaluators call it once, and any error or
//! unparseable reply falls back to the rule-only score.

pub mod chat;

pub use chat::{is_ai_available, ChatJudge, JudgeProvider};

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors from a judge call. Never surfaced to evaluation callers.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("API key not set (tried {0})")]
    NoApiKey(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited - try again later")]
    RateLimited,
    #[error("API error: {0}")]
    ApiError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("judge unavailable: {0}")]
    Unavailable(String),
}

/// What kind of subject the judge is asked to rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeKind {
    Prompt,
    Dataset,
    Challenge,
}

/// Input handed to a judge
#[derive(Debug, Clone)]
pub struct JudgeRequest {
    pub kind: JudgeKind,
    /// The prompt text, or a textual summary of a dataset
    pub content: String,
    /// Extra instructions (e.g. the challenge statement)
    pub context: Option<String>,
}

impl JudgeRequest {
    pub fn prompt(content: &str) -> Self {
        Self {
            kind: JudgeKind::Prompt,
            content: content.to_string(),
            context: None,
        }
    }

    /// Full instruction text sent to the model. Always asks for an `NN/100` grade.
    pub fn render(&self) -> String {
        let (role, subject) = match self.kind {
            JudgeKind::Prompt => (
                "You are an expert in prompt engineering.",
                "Evaluate the quality of the following prompt written for a language model",
            ),
            JudgeKind::Dataset => (
                "You are a data quality analyst.",
                "Evaluate the quality of the dataset summarized below",
            ),
            JudgeKind::Challenge => (
                "You are grading a prompt-engineering exercise.",
                "Evaluate how well the following prompt answers the challenge",
            ),
        };
        let context = self
            .context
            .as_deref()
            .map(|c| format!("\n## Challenge\n{}\n", c))
            .unwrap_or_default();
        format!(
            "{role}\n{subject} (clarity, context, precision, expected output).\n{context}\n## Subject\n{content}\n\nGive a short justification, then end with the overall grade on its own line in the form NN/100.",
            role = role,
            subject = subject,
            context = context,
            content = self.content,
        )
    }
}

/// An external qualitative scorer.
///
/// `Ok(None)` means the judge answered but gave no usable score.
pub trait QualityJudge: Send + Sync {
    fn judge(&self, request: &JudgeRequest) -> Result<Option<f64>, JudgeError>;
}

/// Judge that never scores (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJudge;

impl QualityJudge for NoJudge {
    fn judge(&self, _request: &JudgeRequest) -> Result<Option<f64>, JudgeError> {
        Ok(None)
    }
}

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\s*/\s*100\b").expect("static regex is valid"))
}

/// Extract the first `NN/100` grade from free text; values above 100 are rejected.
pub fn parse_judge_score(text: &str) -> Option<f64> {
    let caps = score_pattern().captures(text)?;
    let value: u32 = caps.get(1)?.as_str().parse().ok()?;
    (value <= 100).then_some(value as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_judge_score() {
        assert_eq!(parse_judge_score("Note finale : 72/100"), Some(72.0));
        assert_eq!(parse_judge_score("score 85 / 100, well done"), Some(85.0));
        assert_eq!(parse_judge_score("0/100"), Some(0.0));
        assert_eq!(parse_judge_score("first 40/100 then 90/100"), Some(40.0));
        assert_eq!(parse_judge_score("no grade here"), None);
        assert_eq!(parse_judge_score("150/100"), None);
        assert_eq!(parse_judge_score("8/10"), None);
        assert_eq!(parse_judge_score("12/1000"), None);
        assert_eq!(parse_judge_score("12/1000 then 64/100."), Some(64.0));
    }

    #[test]
    fn test_no_judge_returns_none() {
        assert!(matches!(
            NoJudge.judge(&JudgeRequest::prompt("x")),
            Ok(None)
        ));
    }

    #[test]
    fn test_render_mentions_subject_and_format() {
        let request = JudgeRequest {
            kind: JudgeKind::Challenge,
            content: "Résume ce texte".to_string(),
            context: Some("Write a summary prompt".to_string()),
        };
        let rendered = request.render();
        assert!(rendered.contains("Résume ce texte"));
        assert!(rendered.contains("Write a summary prompt"));
        assert!(rendered.contains("NN/100"));
    }
}
