//! Prompt-quality rules: length, keyword presence and layout.

use super::ScoringRule;
use crate::RuleResult;
use regex::Regex;
use std::sync::OnceLock;

/// Scores how long the trimmed prompt is
pub struct LengthRule {
    too_short: usize,
    short: usize,
    too_long: usize,
}

impl LengthRule {
    pub fn new() -> Self {
        Self {
            too_short: 20,
            short: 50,
            too_long: 2000,
        }
    }
}

impl Default for LengthRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringRule<str> for LengthRule {
    fn id(&self) -> &'static str {
        "length"
    }

    fn evaluate(&self, prompt: &str) -> RuleResult {
        let len = prompt.trim().chars().count();
        let (score, description) = if len < self.too_short {
            (30.0, format!("Prompt is too short ({} characters)", len))
        } else if len < self.short {
            (60.0, format!("Prompt is short ({} characters)", len))
        } else if len > self.too_long {
            (70.0, format!("Prompt is very long ({} characters)", len))
        } else {
            (100.0, format!("Prompt length is adequate ({} characters)", len))
        };
        RuleResult::new("Length", description, score)
    }
}

/// Binary rule: full marks when any keyword appears (case-insensitive substring)
pub struct KeywordPresenceRule {
    id: &'static str,
    name: &'static str,
    keywords: Vec<String>,
    present: (f64, &'static str),
    absent: (f64, &'static str),
}

impl KeywordPresenceRule {
    pub fn context(keywords: Vec<String>) -> Self {
        Self {
            id: "context",
            name: "Context",
            keywords,
            present: (100.0, "Context is provided"),
            absent: (40.0, "No context given to the model"),
        }
    }

    pub fn role(keywords: Vec<String>) -> Self {
        Self {
            id: "role",
            name: "Role",
            keywords,
            present: (100.0, "A role is defined for the model"),
            absent: (50.0, "No role defined for the model"),
        }
    }

    pub fn format(keywords: Vec<String>) -> Self {
        Self {
            id: "format",
            name: "Format",
            keywords,
            present: (100.0, "Output format is specified"),
            absent: (50.0, "Output format is not specified"),
        }
    }

    pub fn instructions(keywords: Vec<String>) -> Self {
        Self {
            id: "instructions",
            name: "Instructions",
            keywords,
            present: (100.0, "Task is stated with an explicit action verb"),
            absent: (40.0, "No explicit instruction verb found"),
        }
    }

    pub fn examples(keywords: Vec<String>) -> Self {
        Self {
            id: "examples-constraints",
            name: "Examples & Constraints",
            keywords,
            present: (100.0, "Examples or constraints are given"),
            absent: (60.0, "No examples or constraints given"),
        }
    }

    fn matches(&self, lowered: &str) -> Option<&str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()))
    }
}

impl ScoringRule<str> for KeywordPresenceRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn evaluate(&self, prompt: &str) -> RuleResult {
        let lowered = prompt.to_lowercase();
        match self.matches(&lowered) {
            Some(keyword) => {
                tracing::trace!(rule = self.id, keyword, "keyword matched");
                RuleResult::new(self.name, self.present.1, self.present.0)
            }
            None => RuleResult::new(self.name, self.absent.1, self.absent.0),
        }
    }
}

fn layout_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:[-*•]\s|\d+[.)]\s?)").expect("static regex is valid")
    })
}

/// Rewards visible structure: line breaks, bullets, numbering, or enough body
pub struct StructureRule {
    min_length: usize,
}

impl StructureRule {
    pub fn new() -> Self {
        Self { min_length: 100 }
    }
}

impl Default for StructureRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringRule<str> for StructureRule {
    fn id(&self) -> &'static str {
        "structure"
    }

    fn evaluate(&self, prompt: &str) -> RuleResult {
        let trimmed = prompt.trim();
        let structured = trimmed.contains('\n')
            || layout_pattern().is_match(trimmed)
            || trimmed.chars().count() > self.min_length;
        if structured {
            RuleResult::new("Structure", "Prompt is structured", 80.0)
        } else {
            RuleResult::new("Structure", "Prompt has no visible structure", 50.0)
        }
    }
}
