use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use cobertura_report::config::{Config, ReportFormat};
use cobertura_report::coverage::{parse_cobertura_string, validate_threshold, CoverageTotals};
use cobertura_report::report;

#[derive(Parser)]
#[command(name = "cobertura-report")]
#[command(about = "Print Cobertura coverage as a console table grouped by namespace")]
#[command(version)]
struct Cli {
    /// Path to the coverage.cobertura.xml file
    #[arg(short = 'f', long)]
    coverage_file: PathBuf,

    /// Only report classes from this package (project)
    #[arg(short, long)]
    package: Option<String>,

    /// Disable colored rows
    #[arg(long)]
    no_color: bool,

    /// Highlight rows whose line or branch coverage is below this percentage
    #[arg(short, long, value_parser = parse_percentage)]
    warning_threshold: Option<f64>,

    /// Exit with an error when overall line coverage is below this percentage
    #[arg(long, value_parser = parse_percentage)]
    fail_under: Option<f64>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,

    /// Path to settings file (default: cobertura-report.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_percentage(value: &str) -> std::result::Result<f64, String> {
    let percentage: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !(0.0..=100.0).contains(&percentage) {
        return Err(format!("{} is not between 0 and 100", percentage));
    }
    Ok(percentage)
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref(), Path::new("."))
        .context("Could not load settings")?;
    let settings = &config.report;

    if !cli.coverage_file.exists() {
        anyhow::bail!("File not found: {}", cli.coverage_file.display());
    }

    let content = fs::read_to_string(&cli.coverage_file)
        .with_context(|| format!("Failed to read {}", cli.coverage_file.display()))?;

    let package = cli.package.as_deref().or(settings.package.as_deref());
    log::debug!(
        "parsing {} (package filter: {:?})",
        cli.coverage_file.display(),
        package
    );

    let items = parse_cobertura_string(&content, package)
        .with_context(|| format!("Could not parse {}", cli.coverage_file.display()))?;
    log::debug!("parsed {} classes", items.len());

    if items.is_empty() {
        anyhow::bail!("No coverage data found in {}", cli.coverage_file.display());
    }

    let mut formatter_config = config.formatter_config();
    if cli.no_color {
        formatter_config.colorize = false;
    }
    if let Some(threshold) = cli.warning_threshold {
        formatter_config.warning_threshold = Some(threshold);
    }
    log::debug!("formatter config: {:?}", formatter_config);

    match cli.format.or(settings.format).unwrap_or_default() {
        ReportFormat::Table => {
            print!("{}", report::format_coverage_items(&items, &formatter_config)?);
        }
        ReportFormat::Json => {
            println!("{}", report::format_json(&items)?);
        }
    }

    if let Some(gate) = cli.fail_under.or(settings.fail_under) {
        let result = validate_threshold(&CoverageTotals::from_items(&items), gate);
        println!();
        result.print_summary();

        if !result.passed {
            std::process::exit(1);
        }
    }

    Ok(())
}
