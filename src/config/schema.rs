//! Config schema and deserialization

use crate::analyzer::{EvaluatorTables, KeywordTables, RemediationTable, ScoringWeights};
use crate::dataset::CsvOptions;
use crate::judge::{ChatJudge, JudgeError, JudgeProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Per-table keyword replacements. A present list replaces the default list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

impl KeywordOverrides {
    fn merge_from(&mut self, base: KeywordOverrides) {
        self.context = self.context.take().or(base.context);
        self.role = self.role.take().or(base.role);
        self.format = self.format.take().or(base.format);
        self.instructions = self.instructions.take().or(base.instructions);
        self.examples = self.examples.take().or(base.examples);
    }

    fn apply(&self, tables: &mut KeywordTables) {
        let lists = [
            (&self.context, &mut tables.context),
            (&self.role, &mut tables.role),
            (&self.format, &mut tables.format),
            (&self.instructions, &mut tables.instructions),
            (&self.examples, &mut tables.examples),
        ];
        for (replacement, target) in lists {
            if let Some(words) = replacement {
                *target = words.iter().map(|w| w.to_lowercase()).collect();
            }
        }
    }
}

/// Remediation entry for one rule name. Without a key the rule name is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub message: String,
}

/// Partial scoring weights; unset fields keep their default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_element_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_rate_trigger: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_threshold: Option<f64>,
}

impl WeightOverrides {
    fn merge_from(&mut self, base: WeightOverrides) {
        self.judge_weight = self.judge_weight.or(base.judge_weight);
        self.rule_weight = self.rule_weight.or(base.rule_weight);
        self.missing_element_penalty = self
            .missing_element_penalty
            .or(base.missing_element_penalty);
        self.type_penalty = self.type_penalty.or(base.type_penalty);
        self.format_penalty = self.format_penalty.or(base.format_penalty);
        self.outlier_penalty = self.outlier_penalty.or(base.outlier_penalty);
        self.outlier_rate_trigger = self.outlier_rate_trigger.or(base.outlier_rate_trigger);
        self.recommendation_threshold = self
            .recommendation_threshold
            .or(base.recommendation_threshold);
    }

    fn resolve(&self) -> ScoringWeights {
        let d = ScoringWeights::default();
        ScoringWeights {
            judge_weight: self.judge_weight.unwrap_or(d.judge_weight),
            rule_weight: self.rule_weight.unwrap_or(d.rule_weight),
            missing_element_penalty: self
                .missing_element_penalty
                .unwrap_or(d.missing_element_penalty),
            type_penalty: self.type_penalty.unwrap_or(d.type_penalty),
            format_penalty: self.format_penalty.unwrap_or(d.format_penalty),
            outlier_penalty: self.outlier_penalty.unwrap_or(d.outlier_penalty),
            outlier_rate_trigger: self.outlier_rate_trigger.unwrap_or(d.outlier_rate_trigger),
            recommendation_threshold: self
                .recommendation_threshold
                .unwrap_or(d.recommendation_threshold),
        }
    }
}

/// LLM judge settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<JudgeProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Full endpoint URL (required for Azure OpenAI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl JudgeConfig {
    fn merge_from(&mut self, base: JudgeConfig) {
        self.provider = self.provider.or(base.provider);
        self.model = self.model.take().or(base.model);
        self.endpoint = self.endpoint.take().or(base.endpoint);
        self.timeout_secs = self.timeout_secs.or(base.timeout_secs);
    }

    /// Build a chat judge, reading the API key from the environment
    pub fn build(&self) -> Result<ChatJudge, JudgeError> {
        let provider = self.provider.unwrap_or_default();
        let mut judge = ChatJudge::from_env(provider)?;
        if let Some(ref model) = self.model {
            judge = judge.model(model);
        }
        if let Some(ref endpoint) = self.endpoint {
            judge = judge.endpoint(endpoint);
        }
        if let Some(secs) = self.timeout_secs {
            judge = judge.timeout(Duration::from_secs(secs));
        }
        Ok(judge)
    }
}

/// Per-path override configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverride {
    /// Glob patterns this override applies to
    pub files: Vec<String>,

    /// Threshold for matched prompt files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
}

/// Root config structure for .gaugerc.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Minimum overall score (exit 1 if below). Default: 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,

    /// Glob patterns for prompt files to skip in directory mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub keywords: KeywordOverrides,

    /// Rule name -> remediation, added to or replacing the defaults
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub remediations: HashMap<String, RemediationOverride>,

    #[serde(default)]
    pub weights: WeightOverrides,

    #[serde(default)]
    pub judge: JudgeConfig,

    /// Single-character CSV field delimiter (default ';')
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_delimiter: Option<char>,

    /// Extensions treated as prompt files in directory mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompt_extensions: Vec<String>,

    /// Per-path threshold overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ConfigOverride>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(
        mut self,
        cli_threshold: Option<u8>,
        cli_delimiter: Option<char>,
    ) -> Self {
        if cli_threshold.is_some() {
            self.threshold = cli_threshold;
        }
        if cli_delimiter.is_some() {
            self.csv_delimiter = cli_delimiter;
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.threshold.is_none() {
            self.threshold = base.threshold;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }
        if self.csv_delimiter.is_none() {
            self.csv_delimiter = base.csv_delimiter;
        }
        if self.prompt_extensions.is_empty() {
            self.prompt_extensions = base.prompt_extensions;
        }

        self.keywords.merge_from(base.keywords);
        self.weights.merge_from(base.weights);
        self.judge.merge_from(base.judge);

        for (rule, remediation) in base.remediations {
            self.remediations.entry(rule).or_insert(remediation);
        }

        let mut all_ignores = base.ignore;
        all_ignores.append(&mut self.ignore);
        self.ignore = all_ignores;

        // Prepend base overrides
        let mut all_overrides = base.overrides;
        all_overrides.append(&mut self.overrides);
        self.overrides = all_overrides;
    }

    /// Keyword and remediation tables with overrides applied
    pub fn tables(&self) -> EvaluatorTables {
        let mut keywords = KeywordTables::default();
        self.keywords.apply(&mut keywords);

        let mut remediations = RemediationTable::default();
        let mut custom: Vec<_> = self.remediations.iter().collect();
        custom.sort_by(|a, b| a.0.cmp(b.0));
        for (rule, entry) in custom {
            let key = entry.key.as_deref().unwrap_or(rule);
            remediations.insert(rule, key, &entry.message);
        }

        EvaluatorTables {
            keywords,
            remediations,
        }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights.resolve()
    }

    /// CSV options; a non-ASCII delimiter is an error
    pub fn csv_options(&self) -> anyhow::Result<CsvOptions> {
        let mut options = CsvOptions::default();
        if let Some(c) = self.csv_delimiter {
            if !c.is_ascii() {
                anyhow::bail!("CSV delimiter must be a single ASCII character, got '{}'", c);
            }
            options.delimiter = c as u8;
        }
        Ok(options)
    }

    /// Extensions picked up in directory mode (lowercase, without dot)
    pub fn prompt_extensions(&self) -> Vec<String> {
        if self.prompt_extensions.is_empty() {
            vec!["txt".to_string(), "md".to_string(), "prompt".to_string()]
        } else {
            self.prompt_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect()
        }
    }

    /// Threshold for a given file, after applying matching overrides in order
    pub fn threshold_for(&self, file_path: &Path) -> Option<u8> {
        let mut threshold = self.threshold;
        for override_cfg in &self.overrides {
            if Self::matches_override(file_path, &override_cfg.files) {
                if let Some(t) = override_cfg.threshold {
                    threshold = Some(t);
                }
            }
        }
        threshold
    }

    /// Check if a file path matches any of the override patterns
    fn matches_override(file_path: &Path, patterns: &[String]) -> bool {
        patterns.iter().any(|pattern| match globset::Glob::new(pattern) {
            Ok(glob) => glob.compile_matcher().is_match(file_path),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "invalid override pattern");
                false
            }
        })
    }
}
