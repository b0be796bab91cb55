//! Immutable lookup tables handed to evaluators at construction time.
//!
//! Defaults target French-language prompts (the keyword lists match on
//! lowercase substrings); every table can be replaced from `.gaugerc.json`.

use indexmap::IndexMap;

/// Keyword lists driving the prompt presence rules
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTables {
    pub context: Vec<String>,
    pub role: Vec<String>,
    pub format: Vec<String>,
    pub instructions: Vec<String>,
    pub examples: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            context: owned(&["contexte", "texte", "document", "données", "information"]),
            role: owned(&["tu es", "vous êtes", "agis comme", "rôle", "expert"]),
            format: owned(&[
                "format",
                "json",
                "liste",
                "tableau",
                "markdown",
                "csv",
                "puces",
                "structure",
            ]),
            instructions: owned(&[
                "fais",
                "génère",
                "résume",
                "extrais",
                "analyse",
                "explique",
                "rédige",
                "écris",
                "traduis",
                "classe",
                "compare",
                "identifie",
            ]),
            examples: owned(&[
                "exemple",
                "par exemple",
                "ex:",
                "contrainte",
                "maximum",
                "minimum",
                "ne pas",
                "doit",
                "limite",
                "uniquement",
            ]),
        }
    }
}

/// One remediation entry: dedup key plus message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    pub key: String,
    pub message: String,
}

/// Rule name → remediation lookup
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationTable {
    entries: IndexMap<String, Remediation>,
}

impl RemediationTable {
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add or replace the remediation for a rule name
    pub fn insert(&mut self, rule_name: &str, key: &str, message: &str) {
        self.entries.insert(
            rule_name.to_string(),
            Remediation {
                key: key.to_string(),
                message: message.to_string(),
            },
        );
    }

    pub fn get(&self, rule_name: &str) -> Option<&Remediation> {
        self.entries.get(rule_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RemediationTable {
    fn default() -> Self {
        let mut table = Self::empty();
        // Prompt rules
        table.insert(
            "Length",
            "length",
            "Develop the prompt: describe the task, the expected output and the audience in more detail",
        );
        table.insert(
            "Context",
            "context",
            "Provide context: the text, document or data the model should work from",
        );
        table.insert(
            "Role",
            "role",
            "Define a role for the model (e.g. \"Tu es un expert en ...\")",
        );
        table.insert(
            "Format",
            "format",
            "Specify the expected output format (JSON, list, table, ...)",
        );
        table.insert(
            "Instructions",
            "instructions",
            "State the task with an explicit action verb (résume, extrais, génère, ...)",
        );
        table.insert(
            "Structure",
            "structure",
            "Structure the prompt with line breaks, bullets or numbered steps",
        );
        table.insert(
            "Examples & Constraints",
            "examples",
            "Add an example or explicit constraints (length, tone, exclusions)",
        );
        table.insert(
            "Required Elements",
            "requirements",
            "Cover every element the challenge asks for",
        );
        // Dataset rules
        table.insert("Dataset", "dataset", "Provide a dataset with at least one row");
        table.insert("Completeness", "completeness", "Fill in or impute missing values");
        table.insert("Type Consistency", "consistency", "Harmonize value types within each column");
        table.insert("Uniqueness", "uniqueness", "Remove duplicate rows");
        table.insert(
            "Format Validity",
            "consistency",
            "Harmonize value formats within each column (e.g. valid email addresses)",
        );
        table.insert("Distribution", "distribution", "Review outliers in numeric columns");
        table
    }
}

/// Everything an evaluator needs besides the input itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluatorTables {
    pub keywords: KeywordTables,
    pub remediations: RemediationTable,
}
