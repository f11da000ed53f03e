//! CLI tool for auditing the usability of library APIs

use api_usability_audit::{
    collect_projects, AnalysisConfig, LexicalOracleFactory, MetricDetails, MetricKind,
    MetricReport, Orchestrator, ProjectAnalysis, WorkerPool,
};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "usability-audit")]
#[command(about = "Score the usability of library APIs from their parsed declarations", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file (TOML or JSON) listing the projects
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Metrics to skip for every project (can be specified multiple times)
    #[arg(long = "skip")]
    skip_metrics: Vec<MetricKind>,

    /// Override the number of pool workers
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute all configured metrics and display a summary
    Scan {
        /// Fail if any metric scores below this threshold (0-1)
        #[arg(long)]
        fail_threshold: Option<f64>,

        /// Display per-module scores and metric details
        #[arg(long)]
        detailed: bool,
    },

    /// Generate report files
    Report {
        /// Output format
        #[arg(short = 'f', long, default_value = "markdown")]
        format: ReportFormat,

        /// Output directory (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Check metric scores against a threshold (exit code based)
    Check {
        /// Minimum acceptable score for every metric (0-1)
        #[arg(long, default_value = "0.5")]
        min_score: f64,
    },
}

#[derive(Clone, Debug)]
enum ReportFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = match AnalysisConfig::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} Failed to load config: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    for project in &mut config.projects {
        project.skip_metrics.extend(cli.skip_metrics.iter().copied());
    }
    if let Some(workers) = cli.workers {
        config.metrics.workers = workers;
        config.metrics.max_queue = config.metrics.max_queue.max(workers);
    }
    if config.projects.is_empty() {
        eprintln!("{} No projects configured", "Error:".red().bold());
        process::exit(1);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Analyzing {} projects...", config.projects.len()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = run_analysis(&config).await;

    spinner.finish_and_clear();

    let analyses = match result {
        Ok(analyses) => analyses,
        Err(e) => {
            eprintln!("{} Analysis failed: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Scan {
            fail_threshold,
            detailed,
        } => {
            for analysis in &analyses {
                display_summary(analysis);
                if detailed {
                    println!();
                    display_detailed(analysis);
                }
            }

            if let Some(threshold) = fail_threshold {
                let failing = below_threshold(&analyses, threshold);
                if !failing.is_empty() {
                    eprintln!(
                        "\n{} {} metrics below threshold {}:",
                        "Failed:".red().bold(),
                        failing.len(),
                        threshold
                    );
                    for line in &failing {
                        eprintln!("{}", line);
                    }
                    process::exit(1);
                }
            }
        }

        Commands::Report { format, output } => {
            let written = match output {
                Some(dir) => write_reports(&analyses, &format, &dir),
                None => {
                    println!("{}", render(&analyses, &format));
                    Ok(())
                }
            };
            if let Err(e) = written {
                eprintln!("{} Failed to write report: {}", "Error:".red().bold(), e);
                process::exit(1);
            }
        }

        Commands::Check { min_score } => {
            let mut failures = below_threshold(&analyses, min_score);
            for analysis in &analyses {
                for failure in &analysis.failures {
                    failures.push(format!(
                        "  - {} {}: failed ({})",
                        analysis.project_name, failure.metric, failure.message
                    ));
                }
            }

            if !failures.is_empty() {
                eprintln!("{} {} check failures:", "Failed:".red().bold(), failures.len());
                for failure in failures {
                    eprintln!("{}", failure);
                }
                process::exit(1);
            } else {
                println!("{} All checks passed!", "Success:".green().bold());
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Analyze every configured project concurrently over one shared pool
async fn run_analysis(config: &AnalysisConfig) -> api_usability_audit::Result<Vec<ProjectAnalysis>> {
    let pool = WorkerPool::from_config(&config.metrics);
    let factory = Arc::new(LexicalOracleFactory);

    let orchestrators = config
        .projects
        .iter()
        .map(|project| {
            Orchestrator::from_project_config(
                project,
                config.metrics.clone(),
                pool.clone(),
                factory.clone(),
            )
        })
        .collect::<api_usability_audit::Result<Vec<_>>>()?;

    Ok(collect_projects(&orchestrators).await)
}

fn colored_score(score: f64) -> ColoredString {
    let text = format!("{:.3}", score);
    if score >= 0.75 {
        text.green()
    } else if score >= 0.5 {
        text.yellow()
    } else {
        text.red()
    }
}

fn below_threshold(analyses: &[ProjectAnalysis], threshold: f64) -> Vec<String> {
    analyses
        .iter()
        .flat_map(|analysis| {
            analysis
                .reports
                .iter()
                .filter(move |r| r.score < threshold)
                .map(move |r| {
                    format!(
                        "  - {} {}: score {:.3} < {}",
                        analysis.project_name, r.metric, r.score, threshold
                    )
                })
        })
        .collect()
}

fn display_summary(analysis: &ProjectAnalysis) {
    println!("\n{}", "=== Usability Summary ===".bold());
    println!("Project: {}", analysis.project_name.cyan());
    println!();

    for report in &analysis.reports {
        println!(
            "  {} {:<6} {}",
            colored_score(report.score),
            report.metric.to_string().bold(),
            report.metric.description()
        );
    }
    for failure in &analysis.failures {
        println!(
            "  {} {:<6} {}",
            "error".red().bold(),
            failure.metric.to_string().bold(),
            failure.message.red()
        );
    }
}

fn display_detailed(analysis: &ProjectAnalysis) {
    println!("{}", "=== Detailed Results ===".bold());

    for report in &analysis.reports {
        println!("\n{} [{}]", report.metric.to_string().bold(), colored_score(report.score));
        for (path, module) in &report.modules {
            println!("  {} {}", colored_score(module.score), path);
            for construct in module.constructs.values() {
                println!("    {} {}", colored_score(construct.score), construct.name);
            }
        }
        match &report.details {
            Some(MetricDetails::NameConfusion {
                confusing_names, ..
            }) if !confusing_names.is_empty() => {
                println!("  Confusing names:");
                for name in confusing_names {
                    println!("    - {}", name.yellow());
                }
            }
            Some(MetricDetails::KeywordGrouping { keywords }) => {
                for (keyword, run) in keywords {
                    println!(
                        "  {} {} ({} occurrences in {} modules)",
                        colored_score(run.score),
                        keyword,
                        run.occurrences,
                        run.modules
                    );
                }
            }
            Some(MetricDetails::ParameterOrder {
                inconsistent_pairs, ..
            }) if !inconsistent_pairs.is_empty() => {
                println!("  Inconsistent parameter pairs:");
                for (a, b) in inconsistent_pairs {
                    println!("    - {} / {}", a.yellow(), b.yellow());
                }
            }
            _ => {}
        }
    }
}

fn render(analyses: &[ProjectAnalysis], format: &ReportFormat) -> String {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(analyses).unwrap_or_else(|e| {
            eprintln!("Failed to serialize report: {}", e);
            process::exit(1);
        }),
        ReportFormat::Markdown => analyses
            .iter()
            .map(generate_markdown_report)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// JSON: one file per project and metric. Markdown: one file per project.
fn write_reports(
    analyses: &[ProjectAnalysis],
    format: &ReportFormat,
    dir: &Path,
) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for analysis in analyses {
        match format {
            ReportFormat::Json => {
                for report in &analysis.reports {
                    let path = dir.join(report_file_name(report));
                    let content = serde_json::to_string_pretty(report)?;
                    std::fs::write(&path, content)?;
                    println!("Report written to: {}", path.display());
                }
            }
            ReportFormat::Markdown => {
                let path = dir.join(format!("{}.md", analysis.project_name));
                std::fs::write(&path, generate_markdown_report(analysis))?;
                println!("Report written to: {}", path.display());
            }
        }
    }
    Ok(())
}

fn report_file_name(report: &MetricReport) -> String {
    format!("{} - {}.json", report.project_name, report.metric)
}

fn generate_markdown_report(analysis: &ProjectAnalysis) -> String {
    let mut md = String::new();

    md.push_str(&format!("# API Usability Report: {}\n\n", analysis.project_name));
    md.push_str(&format!("**Generated:** {}\n\n", analysis.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Description | Score |\n");
    md.push_str("|--------|-------------|-------|\n");
    for report in &analysis.reports {
        md.push_str(&format!(
            "| {} | {} | {:.3} |\n",
            report.metric,
            report.metric.description(),
            report.score
        ));
    }
    for failure in &analysis.failures {
        md.push_str(&format!(
            "| {} | {} | failed: {} |\n",
            failure.metric,
            failure.metric.description(),
            failure.message
        ));
    }

    for report in analysis.reports.iter().filter(|r| !r.modules.is_empty()) {
        md.push_str(&format!("\n## {} by module\n\n", report.metric));
        md.push_str("| Module | Score |\n");
        md.push_str("|--------|-------|\n");
        for (path, module) in &report.modules {
            md.push_str(&format!("| {} | {:.3} |\n", path, module.score));
        }
    }

    md
}
