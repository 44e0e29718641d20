use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use enrichment::{EnrichConfig, EnrichmentRuntime, EnrichmentTelemetry, RunOutcome};
use place_search::{Credentials, TencentPlaceClient};
use roster::{load_roster, ReportWriter, SupplementaryIndex};
use serde_json::json;
use shared_logging::{run_log_path, LogLevel};
use tokio::runtime::Runtime;

const QUOTA_EXIT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "campus-enrich",
    version,
    about = "Attaches searched campuses to a university roster"
)]
struct Cli {
    /// Configuration file; `campus.toml` in the working directory when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Roster CSV, overriding `[input].roster`.
    #[arg(long)]
    roster: Option<PathBuf>,
    /// Report directory, overriding `[output].dir`.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Environment file holding the API credentials.
    #[arg(long)]
    env_file: Option<PathBuf>,
    /// Only echo warnings and errors.
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) if outcome.is_quota_exhausted() => ExitCode::from(QUOTA_EXIT),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("campus-enrich: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunOutcome> {
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("loading env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let mut config = EnrichConfig::discover(cli.config.as_deref())?;
    if let Some(roster) = cli.roster {
        config = config.with_roster(roster);
    }
    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }

    let telemetry = EnrichmentTelemetry::builder("enrichment")
        .log_path(run_log_path(&config.output.dir, &config.output.log_prefix))
        .echo(if cli.quiet { LogLevel::Warn } else { LogLevel::Info })
        .build()
        .context("opening run log")?;

    let roster = load_roster(&config.input.roster, &config.input)?;
    telemetry.log(
        LogLevel::Info,
        "enrich.roster.loaded",
        json!({
            "path": config.input.roster.display().to_string(),
            "rows": roster.rows.len(),
            "skipped": roster.skipped,
            "header_line": roster.header_line,
        }),
    )?;

    let supplementary = match &config.input.supplementary {
        Some(path) => SupplementaryIndex::load(path).unwrap_or_else(|err| {
            let _ = telemetry.log(
                LogLevel::Warn,
                "enrich.supplementary.unavailable",
                json!({ "path": path.display().to_string(), "error": err.to_string() }),
            );
            SupplementaryIndex::default()
        }),
        None => SupplementaryIndex::default(),
    };

    let credentials = Credentials::from_env(&config.search)?;
    let client = TencentPlaceClient::new(config.search.clone(), credentials)?;
    let runtime = EnrichmentRuntime::builder()
        .config(&config)
        .client(Arc::new(client))
        .supplementary(supplementary)
        .telemetry(telemetry.clone())
        .build()?;

    let outcome = Runtime::new()
        .context("starting tokio runtime")?
        .block_on(runtime.run(&roster.rows))?;

    let summary = ReportWriter::new(config.output.clone()).write_all(
        &outcome.institutions,
        &outcome.rejected,
        &outcome.without_details,
    )?;
    telemetry.log(
        LogLevel::Info,
        "enrich.reports.written",
        json!({
            "universities": summary.universities.display().to_string(),
            "with_campuses": summary.with_campuses,
            "without_campuses": summary.without_campuses,
            "rejected": summary.rejected_count,
            "no_details": summary.no_details_count,
        }),
    )?;

    println!(
        "{} institutions with campuses, {} without, {} rejected places -> {}",
        summary.with_campuses,
        summary.without_campuses,
        summary.rejected_count,
        summary.universities.display()
    );
    if let Some(message) = &outcome.quota_exhausted {
        eprintln!("campus-enrich: search quota exhausted ({message}); partial results written");
    }
    Ok(outcome)
}
