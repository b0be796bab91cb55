//! Configuration loading for Gauge

mod schema;

pub use schema::{
    Config, ConfigOverride, JudgeConfig, KeywordOverrides, RemediationOverride, WeightOverrides,
};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = ".gaugerc.json";

/// Find and load config file with extends resolution. Searches current directory then parents.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() {
            p.to_path_buf()
        } else {
            work_dir.join(p)
        };
        if path.exists() {
            Some(path)
        } else {
            anyhow::bail!("Config file not found: {}", path.display());
        }
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config_with_extends(&path, &mut HashSet::new())
        }
        None => Ok(Config::default()),
    }
}

/// Load a config file and resolve extends chain
fn load_config_with_extends(config_path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Config> {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    if !visited.insert(canonical) {
        anyhow::bail!(
            "Circular extends detected in config: {}",
            config_path.display()
        );
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
    let mut config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in config: {}", config_path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base_config = resolve_extends(config_path, &extends, visited)?;
        config.merge_from(base_config);
    }

    Ok(config)
}

/// Resolve an extends reference (relative to the referencing file, or absolute)
fn resolve_extends(
    config_path: &Path,
    extends: &str,
    visited: &mut HashSet<PathBuf>,
) -> Result<Config> {
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let extends_path = Path::new(extends);
    let extends_path = if extends_path.is_absolute() {
        extends_path.to_path_buf()
    } else {
        config_dir.join(extends_path)
    };

    // Ensure it has .json extension
    let extends_path = if extends_path.extension().is_none() {
        extends_path.with_extension("json")
    } else {
        extends_path
    };

    if !extends_path.exists() {
        anyhow::bail!(
            "Extended config not found: {} (referenced from {})",
            extends_path.display(),
            config_path.display()
        );
    }

    load_config_with_extends(&extends_path, visited)
}

/// Search for .gaugerc.json in directory and its parents
fn find_config_in_parents(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir;
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Build a GlobSet from ignore patterns for path matching
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("Invalid ignore pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| anyhow::anyhow!("{}", e))
}

/// Check if a path should be ignored based on config glob patterns
pub fn is_ignored(path: &Path, ignore_set: &GlobSet) -> bool {
    ignore_set.is_match(path)
}

/// Contents written by `gauge init`
pub fn default_config_json(threshold: Option<u8>) -> Result<String> {
    let config = Config {
        threshold: Some(threshold.unwrap_or(60)),
        ignore: vec!["**/drafts/**".to_string()],
        ..Config::default()
    };
    let mut json = serde_json::to_string_pretty(&config)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeProvider;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn test_no_config_is_default() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(dir.path(), None).is_ok());
    }

    #[test]
    fn test_found_in_parent_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CONFIG_FILENAME, r#"{ "threshold": 75 }"#);
        let nested = dir.path().join("prompts").join("fr");
        fs::create_dir_all(&nested).unwrap();
        let config = load_config(&nested, None).unwrap();
        assert_eq!(config.threshold, Some(75));
    }

    #[test]
    fn test_custom_path_missing_is_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(dir.path(), Some(Path::new("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CONFIG_FILENAME, "{ threshold: }");
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_is_ignored_drafts() {
        let set = build_ignore_set(&["**/drafts/**".to_string()]).unwrap();
        assert!(is_ignored(Path::new("prompts/drafts/a.txt"), &set));
        assert!(!is_ignored(Path::new("prompts/a.txt"), &set));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        assert!(build_ignore_set(&["a[".to_string()]).is_err());
    }

    #[test]
    fn test_config_extends() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "base.json",
            r#"{
                "threshold": 70,
                "ignore": ["**/drafts/**"],
                "keywords": { "role": ["you are"] },
                "weights": { "judgeWeight": 0.5, "typePenalty": 1.0 },
                "judge": { "provider": "anthropic", "timeoutSecs": 5 },
                "remediations": { "Role": { "message": "Say who the model is" } }
            }"#,
        );
        write(
            dir.path(),
            CONFIG_FILENAME,
            r#"{
                "extends": "./base",
                "threshold": 80,
                "ignore": ["**/old/**"],
                "weights": { "judgeWeight": 0.6 },
                "judge": { "model": "claude-test" }
            }"#,
        );

        let config = load_config(dir.path(), None).unwrap();

        assert_eq!(config.threshold, Some(80));
        assert_eq!(config.ignore, vec!["**/drafts/**", "**/old/**"]);
        assert_eq!(config.keywords.role, Some(vec!["you are".to_string()]));
        let weights = config.weights();
        assert_eq!(weights.judge_weight, 0.6);
        assert_eq!(weights.type_penalty, 1.0);
        assert_eq!(weights.rule_weight, 0.3);
        assert_eq!(config.judge.provider, Some(JudgeProvider::Anthropic));
        assert_eq!(config.judge.model.as_deref(), Some("claude-test"));
        assert_eq!(config.judge.timeout_secs, Some(5));
        assert!(config.remediations.contains_key("Role"));
    }

    #[test]
    fn test_circular_extends() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{ "extends": "./b.json" }"#);
        write(dir.path(), "b.json", r#"{ "extends": "./a.json" }"#);
        let err = load_config(dir.path(), Some(Path::new("a.json"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Circular extends"));
    }

    #[test]
    fn test_missing_extends_target() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), CONFIG_FILENAME, r#"{ "extends": "./gone.json" }"#);
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("Extended config not found"));
    }

    #[test]
    fn test_tables_apply_overrides() {
        let config: Config = serde_json::from_str(
            r#"{
                "keywords": { "role": ["You Are"] },
                "remediations": {
                    "Role": { "message": "Say who the model is" },
                    "Tone": { "key": "tone", "message": "Pick a tone" }
                }
            }"#,
        )
        .unwrap();
        let tables = config.tables();
        assert_eq!(tables.keywords.role, vec!["you are"]);
        assert_eq!(tables.keywords.context, crate::analyzer::KeywordTables::default().context);
        let role = tables.remediations.get("Role").unwrap();
        assert_eq!(role.key, "Role");
        assert_eq!(role.message, "Say who the model is");
        assert_eq!(tables.remediations.get("Tone").unwrap().key, "tone");
    }

    #[test]
    fn test_csv_options_and_cli_merge() {
        let config: Config = serde_json::from_str(r#"{ "csvDelimiter": "," }"#).unwrap();
        assert_eq!(config.csv_options().unwrap().delimiter, b',');
        let config = config.merge_with_cli(Some(90), Some('\t'));
        assert_eq!(config.threshold, Some(90));
        assert_eq!(config.csv_options().unwrap().delimiter, b'\t');

        let config = Config::default().merge_with_cli(None, Some('é'));
        assert!(config.csv_options().is_err());
        assert_eq!(Config::default().csv_options().unwrap().delimiter, b';');
    }

    #[test]
    fn test_threshold_overrides() {
        let config: Config = serde_json::from_str(
            r#"{
                "threshold": 70,
                "overrides": [
                    { "files": ["**/legacy/**"], "threshold": 50 },
                    { "files": ["**/legacy/keep/**"], "threshold": 65 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.threshold_for(Path::new("prompts/a.txt")), Some(70));
        assert_eq!(config.threshold_for(Path::new("prompts/legacy/a.txt")), Some(50));
        assert_eq!(
            config.threshold_for(Path::new("prompts/legacy/keep/a.txt")),
            Some(65)
        );
    }

    #[test]
    fn test_prompt_extensions() {
        assert_eq!(Config::default().prompt_extensions(), vec!["txt", "md", "prompt"]);
        let config: Config =
            serde_json::from_str(r#"{ "promptExtensions": [".TXT", "j2"] }"#).unwrap();
        assert_eq!(config.prompt_extensions(), vec!["txt", "j2"]);
    }

    #[test]
    fn test_default_config_roundtrips() {
        let json = default_config_json(Some(75)).unwrap();
        let config: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.threshold, Some(75));
        assert_eq!(config.ignore, vec!["**/drafts/**"]);
    }
}
