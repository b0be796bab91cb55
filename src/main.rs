//! Gauge: Heuristic Quality Scorer CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use gauge::analyzer::rules::Challenge;
use gauge::analyzer::AggregateStats;
use gauge::anomaly::{AnomalyDetector, AnomalyMethod};
use gauge::config::{
    build_ignore_set, default_config_json, is_ignored, load_config, Config, CONFIG_FILENAME,
};
use gauge::dataset::DatasetFormat;
use gauge::judge::{is_ai_available, NoJudge, QualityJudge};
use gauge::logging::{init_logging, LoggingConfig};
use gauge::reporter::{ConsoleReporter, JsonReporter, SourcedReport};
use gauge::{
    ChallengeEvaluator, DatasetEvaluator, EvaluationReport, PromptEvaluator, TabularDataset,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use walkdir::WalkDir;

const STDIN_LABEL: &str = "<stdin>";

/// Gauge: Heuristic quality scorer for LLM prompts and tabular datasets
#[derive(Parser, Debug)]
#[command(name = "gauge")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Output format as JSON
    #[arg(long, short, global = true)]
    json: bool,

    /// Quiet mode (minimal output)
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Verbose output (rule descriptions, debug logs)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to config file (default: search .gaugerc.json in current dir and parents)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Blend in a score from the configured LLM judge (requires the `ai` feature)
    #[arg(long, global = true)]
    judge: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a prompt file, stdin (-), or every prompt file in a directory
    Prompt {
        path: PathBuf,

        /// Minimum score threshold (exit 1 if below)
        #[arg(long, short)]
        threshold: Option<u8>,

        /// Number of parallel threads for directories (default: number of CPU cores)
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Evaluate a CSV or JSON dataset
    Data {
        path: PathBuf,

        /// Minimum score threshold (exit 1 if below)
        #[arg(long, short)]
        threshold: Option<u8>,

        /// CSV field delimiter (default: ';')
        #[arg(long, short)]
        delimiter: Option<char>,

        /// Force the input format instead of using the file extension
        #[arg(long, value_parser = ["csv", "json"])]
        format: Option<String>,
    },

    /// Evaluate a prompt submitted against a challenge definition
    Challenge {
        /// Challenge JSON file ({id, title, description, requiredElements})
        challenge: PathBuf,

        /// Prompt file, or - for stdin
        prompt: PathBuf,

        /// Minimum score threshold (exit 1 if below)
        #[arg(long, short)]
        threshold: Option<u8>,
    },

    /// Flag outliers in one numeric column of a dataset
    Anomalies {
        path: PathBuf,

        /// Column to inspect
        #[arg(long, short)]
        column: String,

        /// zscore, iqr or percentile
        #[arg(long, short, default_value = "zscore")]
        method: AnomalyMethod,

        /// Method threshold (default: 3.0 zscore, 1.5 iqr, 5 percentile)
        #[arg(long, short)]
        threshold: Option<f64>,

        /// CSV field delimiter (default: ';')
        #[arg(long, short)]
        delimiter: Option<char>,
    },

    /// Create .gaugerc.json with sensible defaults
    Init {
        /// Minimum score threshold (e.g. 70)
        #[arg(long)]
        threshold: Option<u8>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let logging = if args.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    }
    .with_json_format(args.log_json);
    if let Err(e) = init_logging(&logging) {
        eprintln!("{}: Failed to initialize logging: {}", "Warning".yellow(), e);
    }

    match &args.command {
        Commands::Init { threshold, dir } => run_init(*threshold, dir.as_deref()),
        Commands::Prompt {
            path,
            threshold,
            jobs,
        } => run_prompt(&args, path, *threshold, *jobs),
        Commands::Data {
            path,
            threshold,
            delimiter,
            format,
        } => run_data(&args, path, *threshold, *delimiter, format.as_deref()),
        Commands::Challenge {
            challenge,
            prompt,
            threshold,
        } => run_challenge(&args, challenge, prompt, *threshold),
        Commands::Anomalies {
            path,
            column,
            method,
            threshold,
            delimiter,
        } => run_anomalies(&args, path, column, *method, *threshold, *delimiter),
    }
}

/// Directory used as the starting point of the config search
fn work_dir_for(path: &Path) -> PathBuf {
    if is_stdin(path) {
        PathBuf::from(".")
    } else if path.is_file() {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        path.to_path_buf()
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn source_label(path: &Path) -> String {
    if is_stdin(path) {
        STDIN_LABEL.to_string()
    } else {
        path.display().to_string()
    }
}

/// The configured judge, or a no-op judge when `--judge` is off or unusable
fn build_judge(args: &Args, config: &Config) -> Arc<dyn QualityJudge> {
    if !args.judge {
        return Arc::new(NoJudge);
    }
    if !is_ai_available() {
        eprintln!(
            "{}: --judge needs the ai feature. Rebuild with: cargo build --features ai",
            "Warning".yellow()
        );
        return Arc::new(NoJudge);
    }
    match config.judge.build() {
        Ok(judge) => {
            tracing::info!(provider = %judge.provider(), "judge enabled");
            Arc::new(judge)
        }
        Err(e) => {
            if !args.quiet {
                eprintln!(
                    "{}: Judge disabled ({}); using rule scores only",
                    "Warning".yellow(),
                    e
                );
            }
            Arc::new(NoJudge)
        }
    }
}

fn console_reporter(args: &Args) -> ConsoleReporter {
    let mut reporter = ConsoleReporter::new();
    if args.no_color {
        reporter = reporter.without_colors();
    }
    if args.verbose {
        reporter = reporter.verbose();
    }
    reporter
}

fn print_report(args: &Args, source: &str, report: &EvaluationReport) {
    if args.json {
        println!("{}", JsonReporter::new().pretty().report(report));
    } else if args.quiet {
        console_reporter(args).report_quiet(source, report);
    } else {
        console_reporter(args).report(source, report);
    }
}

/// Exit 1 when the score is below the threshold
fn check_threshold(args: &Args, source: &str, score: f64, threshold: Option<u8>) -> bool {
    match threshold {
        Some(threshold) if score < threshold as f64 => {
            if !args.quiet && !args.json {
                eprintln!(
                    "\n{}: {} scored {} (below threshold {})",
                    "Failed".red().bold(),
                    source,
                    score,
                    threshold
                );
            }
            false
        }
        _ => true,
    }
}

fn run_init(threshold: Option<u8>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let json = default_config_json(threshold)?;
    std::fs::write(&config_path, json)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!(
        "{}: Created {} with threshold={}",
        "Done".green().bold(),
        config_path.display(),
        threshold.unwrap_or(60)
    );
    Ok(ExitCode::SUCCESS)
}

fn run_prompt(
    args: &Args,
    path: &Path,
    threshold: Option<u8>,
    jobs: Option<usize>,
) -> Result<ExitCode> {
    let config = load_config(&work_dir_for(path), args.config.as_deref())?
        .merge_with_cli(threshold, None);
    let evaluator = PromptEvaluator::new()
        .with_tables(config.tables())
        .with_weights(config.weights())
        .with_judge(build_judge(args, &config));

    if is_stdin(path) || path.is_file() {
        let source = source_label(path);
        let prompt = read_input(path)?;
        let report = evaluator.evaluate(&prompt)?;
        print_report(args, &source, &report);
        let threshold = if is_stdin(path) {
            config.threshold
        } else {
            config.threshold_for(path)
        };
        let passed = check_threshold(args, &source, report.overall_score, threshold);
        return Ok(if passed {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let files = collect_prompt_files(path, &config)?;
    if files.is_empty() {
        eprintln!("{}: No prompt files found", "Warning".yellow());
        return Ok(ExitCode::from(2));
    }

    if let Some(jobs) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let (results, had_errors) = evaluate_files_parallel(&evaluator, &files, args.quiet);
    if results.is_empty() {
        eprintln!("{}: All files failed to evaluate", "Error".red());
        return Ok(ExitCode::from(2));
    }

    let stats = AggregateStats::from_reports(results.iter().map(|r| &r.report));
    if args.json {
        println!(
            "{}",
            JsonReporter::new().pretty().report_with_summary(&results, &stats)
        );
    } else if args.quiet {
        let reporter = console_reporter(args);
        for result in &results {
            reporter.report_quiet(&result.source, &result.report);
        }
    } else {
        console_reporter(args).report_many(&results, &stats);
    }

    let mut all_passed = true;
    for result in &results {
        let threshold = config.threshold_for(Path::new(&result.source));
        all_passed &= check_threshold(args, &result.source, result.report.overall_score, threshold);
    }

    if !all_passed {
        Ok(ExitCode::from(1))
    } else if had_errors {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn collect_prompt_files(path: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let ignore_set = if config.ignore.is_empty() {
        None
    } else {
        Some(build_ignore_set(&config.ignore)?)
    };
    let extensions = config.prompt_extensions();

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let file_path = entry.path();
        if !is_prompt_file(file_path, &extensions) {
            continue;
        }
        if let Some(ref set) = ignore_set {
            if is_ignored(file_path, set) {
                tracing::debug!(path = %file_path.display(), "ignored");
                continue;
            }
        }
        files.push(file_path.to_path_buf());
    }

    // Sort for consistent output
    files.sort();
    Ok(files)
}

fn is_prompt_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Evaluate files in parallel; output order follows the input order
fn evaluate_files_parallel(
    evaluator: &PromptEvaluator,
    files: &[PathBuf],
    quiet: bool,
) -> (Vec<SourcedReport>, bool) {
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    let had_errors = AtomicBool::new(false);

    let results: Vec<_> = files
        .par_iter()
        .filter_map(|file| {
            let evaluated = std::fs::read_to_string(file)
                .map_err(anyhow::Error::from)
                .and_then(|prompt| evaluator.evaluate(&prompt).map_err(anyhow::Error::from));
            match evaluated {
                Ok(report) => Some(SourcedReport::new(file.display().to_string(), report)),
                Err(e) => {
                    had_errors.store(true, Ordering::Relaxed);
                    if !quiet {
                        eprintln!(
                            "{}: Failed to evaluate {}: {}",
                            "Error".red(),
                            file.display(),
                            e
                        );
                    }
                    None
                }
            }
        })
        .collect();

    (results, had_errors.load(Ordering::Relaxed))
}

fn load_dataset(path: &Path, config: &Config, format: Option<&str>) -> Result<TabularDataset> {
    let options = config.csv_options()?;
    let dataset = match format {
        Some("json") => TabularDataset::load_as(path, DatasetFormat::Json, &options),
        Some(_) => TabularDataset::load_as(path, DatasetFormat::Csv, &options),
        None => TabularDataset::load(path, &options),
    };
    dataset.with_context(|| format!("Failed to load dataset {}", path.display()))
}

fn run_data(
    args: &Args,
    path: &Path,
    threshold: Option<u8>,
    delimiter: Option<char>,
    format: Option<&str>,
) -> Result<ExitCode> {
    let config = load_config(&work_dir_for(path), args.config.as_deref())?
        .merge_with_cli(threshold, delimiter);
    let dataset = load_dataset(path, &config, format)?;
    let evaluator = DatasetEvaluator::new()
        .with_tables(config.tables())
        .with_weights(config.weights())
        .with_judge(build_judge(args, &config));

    let source = source_label(path);
    let report = evaluator.evaluate(&dataset)?;
    print_report(args, &source, &report);

    if check_threshold(args, &source, report.overall_score, config.threshold) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn run_challenge(
    args: &Args,
    challenge_path: &Path,
    prompt_path: &Path,
    threshold: Option<u8>,
) -> Result<ExitCode> {
    let config = load_config(&work_dir_for(challenge_path), args.config.as_deref())?
        .merge_with_cli(threshold, None);

    let content = read_input(challenge_path)?;
    let challenge: Challenge = serde_json::from_str(&content)
        .with_context(|| format!("Invalid challenge file: {}", challenge_path.display()))?;
    let prompt = read_input(prompt_path)?;

    let evaluator = ChallengeEvaluator::new()
        .with_tables(config.tables())
        .with_weights(config.weights())
        .with_judge(build_judge(args, &config));

    let source = format!("{} ({})", source_label(prompt_path), challenge.title);
    let report = evaluator.evaluate(&challenge, &prompt)?;
    print_report(args, &source, &report);

    if check_threshold(args, &source, report.overall_score, config.threshold) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn run_anomalies(
    args: &Args,
    path: &Path,
    column: &str,
    method: AnomalyMethod,
    threshold: Option<f64>,
    delimiter: Option<char>,
) -> Result<ExitCode> {
    let config =
        load_config(&work_dir_for(path), args.config.as_deref())?.merge_with_cli(None, delimiter);
    let dataset = load_dataset(path, &config, None)?;

    let mut detector = AnomalyDetector::new(method);
    if let Some(threshold) = threshold {
        detector = detector.with_threshold(threshold);
    }
    let report = detector.detect(&dataset, column)?;

    if args.json {
        println!("{}", JsonReporter::new().pretty().report_anomalies(&report));
    } else if args.quiet {
        println!("{}: {} anomalies", report.column, report.anomalies.len());
    } else {
        console_reporter(args).report_anomalies(&report);
    }
    Ok(ExitCode::SUCCESS)
}
