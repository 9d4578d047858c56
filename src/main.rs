mod error;
mod fetch;
mod normalize;
mod report;
mod settings;
mod structs;

use crate::error::Result;
use crate::fetch::{CanvasApi, HttpTransport};
use crate::settings::{Overrides, Settings};

use chrono::Utc;
use clap::Parser;
use log::{error, info};
use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

/// Collect favorite Canvas courses, assignments and announcements into one JSON file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Settings file (TOML, JSON or YAML); defaults to ./canvas-context.* if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Canvas instance, e.g. https://school.instructure.com
    #[arg(long)]
    base_url: Option<String>,

    /// Where to write the report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page size requested from paginated endpoints
    #[arg(long)]
    per_page: Option<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            let mut source = err.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        base_url: cli.base_url,
        output: cli.output,
        per_page: cli.per_page,
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;

    let api = CanvasApi::new(
        HttpTransport::new(&settings)?,
        settings.base_url.as_str(),
        settings.per_page,
    );

    info!("Fetching data from {}", settings.base_url);
    let report = report::collect(&api, Utc::now()).await?;
    report::write_report(&report, &settings.output)?;

    info!("Report saved to {}", settings.output.display());
    info!(
        "Found {} courses, {} assignments and {} announcements",
        report.entities.courses.len(),
        report.entities.assignments.len(),
        report.entities.announcements.len()
    );
    Ok(())
}
