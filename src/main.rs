use access_review::{
    write_parsed_tables, write_report, AccessReview, ComplianceDetail, ReviewConfig, ReviewReport,
    TracingDiagnostics,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about = "Reconcile HR records against Okta, Slack and Google Workspace access")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Folder holding darwinbox/okta/slack/gws exports (.xlsx or .csv)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Folder the report directory is written to
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long, global = true, value_name = "DATE")]
    as_of: Option<NaiveDate>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Run every check and write the full report (default)
    Review,
    /// Only load and normalize the exports, writing the parsed tables
    Parse,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let review = AccessReview::new(config, Arc::new(TracingDiagnostics));

    match cli.command.unwrap_or(Command::Review) {
        Command::Review => run_review(&review)?,
        Command::Parse => run_parse(&review)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<ReviewConfig> {
    let mut config = match &cli.config {
        Some(path) => ReviewConfig::from_file(path)?,
        None => ReviewConfig::default(),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(as_of) = cli.as_of {
        config.as_of = as_of.and_hms_opt(0, 0, 0);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_review(review: &AccessReview) -> Result<()> {
    println!("🔍 Access Review");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("Starting access review process");

    let report = review.execute().context("Access review failed")?;
    let dir = write_report(&report, &review.config().output_dir)
        .context("Failed to write report")?;

    print_summary(&report);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {}", report.summary());
    println!("📁 Report saved at: {}", dir.display());
    Ok(())
}

fn run_parse(review: &AccessReview) -> Result<()> {
    println!("📂 Parsing exports from {}", review.config().data_dir.display());

    let tables = review.parse().context("Parsing exports failed")?;
    let written = write_parsed_tables(&tables, &review.config().output_dir)
        .context("Failed to write parsed tables")?;

    for path in written {
        println!("✓ {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &ReviewReport) {
    let summaries = &report.summaries;

    println!("\n👥 HR Summary ({})", report.fiscal_year);
    for row in &summaries.hr {
        println!(
            "   {:<20} new joiners {:>4}   active {:>5}   terminated {:>5}",
            row.employee_type, row.new_joiners, row.active_employees, row.terminated_users
        );
    }

    println!("\n🖥️  IT Systems Summary");
    for row in &summaries.systems {
        println!(
            "   {:<20} total {:>5}   active {:>5}   inactive {:>5}",
            row.system.name(),
            row.total_users,
            row.active_users,
            row.inactive_users
        );
    }

    println!("\n⚖️  Compliance Summary");
    for row in &summaries.compliance {
        let detail = match &row.detail {
            ComplianceDetail::Rate {
                non_compliant,
                compliance_rate,
            } => format!("non compliant {:>4}   rate {}", non_compliant, compliance_rate),
            ComplianceDetail::Idle { by_system, .. } | ComplianceDetail::SystemUsers { by_system, .. } => {
                format!(
                    "Okta {}   Slack {}   GWS {}",
                    by_system.okta, by_system.slack, by_system.gws
                )
            }
        };
        println!(
            "   {:<20} checked {:>5}   {}",
            row.check_type(),
            row.total_checked,
            detail
        );
    }

    let warnings = report
        .diagnostics
        .iter()
        .filter(|d| d.level >= access_review::Level::Warning)
        .count();
    if warnings > 0 {
        println!("\n⚠️  {} warnings (see report.json)", warnings);
    }
}
