//! Console reporter with colored output

use super::SourcedReport;
use crate::analyzer::{AggregateStats, ScoreCalculator};
use crate::anomaly::AnomalyReport;
use crate::{EvaluationReport, Grade, RuleResult};
use colored::Colorize;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output (rule descriptions)
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report a single evaluation
    pub fn report(&self, title: &str, report: &EvaluationReport) {
        println!();
        println!("{}", format!("Quality Evaluation: {}", title).bold());
        println!();
        self.print_score(report);
        self.print_rules(&report.rule_scores);
        self.print_recommendations(&report.recommendations);
        println!();
    }

    /// Report multiple results with summary
    pub fn report_many(&self, results: &[SourcedReport], stats: &AggregateStats) {
        for result in results {
            self.report(&result.source, &result.report);
            println!("{}", "─".repeat(60));
        }
        self.print_summary(stats);
    }

    /// Report in quiet mode (just score)
    pub fn report_quiet(&self, source: &str, report: &EvaluationReport) {
        println!(
            "{}: {} ({})",
            source,
            report.overall_score,
            self.colorize_grade(&report.grade())
        );
    }

    /// Report detected anomalies
    pub fn report_anomalies(&self, report: &AnomalyReport) {
        println!();
        println!(
            "{}",
            format!(
                "Anomalies in '{}' ({}, threshold {})",
                report.column, report.method, report.threshold
            )
            .bold()
        );
        println!(
            "   {} numeric values, {} flagged",
            report.sample_size,
            report.anomalies.len()
        );
        println!();
        for anomaly in &report.anomalies {
            println!(
                "   {} {} {} {}",
                "⚠".yellow(),
                format!("row {}", anomaly.row_index).dimmed(),
                anomaly.value,
                format!("(deviation {})", anomaly.score).dimmed()
            );
        }
        if report.anomalies.is_empty() {
            println!("   {} No anomalies found", "✓".green());
        }
        println!();
    }

    fn print_score(&self, report: &EvaluationReport) {
        let grade = report.grade();
        let score_bar = self.create_score_bar(report.overall_score);
        println!(
            "   Score: {} {}",
            score_bar,
            self.colorize_grade(&grade).bold()
        );
        println!("   {}", ScoreCalculator::grade_description(grade).dimmed());
        println!();
    }

    fn print_rules(&self, rules: &[RuleResult]) {
        println!("   {}", "Rule Scores:".bold());
        let width = rules.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
        for rule in rules {
            let bar = self.create_mini_bar(rule.score);
            let score_str = format!("{:>5.1}", rule.score);
            let colored_score = if rule.score >= 80.0 {
                score_str.green()
            } else if rule.score >= 60.0 {
                score_str.yellow()
            } else {
                score_str.red()
            };
            println!(
                "   {} {} {:<width$}",
                bar,
                colored_score,
                rule.name,
                width = width
            );
            if self.verbose {
                println!("       {} {}", "↳".dimmed(), rule.description.dimmed());
            }
        }
        println!();
    }

    fn print_recommendations(&self, recommendations: &[String]) {
        if recommendations.is_empty() {
            return;
        }
        println!("   {}", "Recommendations:".bold());
        for rec in recommendations {
            println!("   {} {}", "→".cyan(), rec);
        }
    }

    fn print_summary(&self, stats: &AggregateStats) {
        println!();
        println!("{}", "═".repeat(60));
        println!("{}", "Summary".bold());
        println!("{}", "═".repeat(60));
        println!("   Inputs evaluated: {}", stats.evaluated.to_string().bold());
        println!(
            "   Average score:    {} ({})",
            stats.average_score.to_string().bold(),
            self.colorize_grade(&Grade::from_score(stats.average_score))
        );
        println!("   Lowest score:     {}", stats.min_score);
        println!("   Recommendations:  {}", stats.total_recommendations);
        println!();
    }

    fn colorize_grade(&self, grade: &Grade) -> colored::ColoredString {
        let s = grade.to_string();
        if !self.use_colors {
            return s.normal();
        }
        match grade {
            Grade::A => s.green().bold(),
            Grade::B => s.green(),
            Grade::C => s.yellow(),
            Grade::D => s.red(),
            Grade::F => s.red().bold(),
        }
    }

    fn create_score_bar(&self, score: f64) -> String {
        let filled = filled_cells(score, 20);
        let bar = format!(
            "[{}{}] {:>5.1}",
            "█".repeat(filled),
            "░".repeat(20 - filled),
            score
        );

        if self.use_colors {
            if score >= 80.0 {
                bar.green().to_string()
            } else if score >= 60.0 {
                bar.yellow().to_string()
            } else {
                bar.red().to_string()
            }
        } else {
            bar
        }
    }

    fn create_mini_bar(&self, score: f64) -> String {
        let filled = filled_cells(score, 10);
        format!("[{}{}]", "▓".repeat(filled), "░".repeat(10 - filled))
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of filled cells for a 0-100 score on a bar of `width` cells
fn filled_cells(score: f64, width: usize) -> usize {
    let cells = (score.clamp(0.0, 100.0) * width as f64 / 100.0).floor() as usize;
    cells.min(width)
}
