use crate::commands::{run_record, run_summarize, RecordArgs, SummarizeArgs};
use crate::infra::{parse_date, start_of_day};
use crate::server;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use personeltak::config::AppConfig;
use personeltak::error::AppError;
use personeltak::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "personeltak",
    about = "Score weekly personnel evaluations and record new ones",
    version
)]
struct Cli {
    /// Workbook directory (defaults to the configured workbook_path)
    workbook: Option<PathBuf>,
    /// YAML or JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Reference date (YYYY-MM-DD). Defaults to now.
    #[arg(long, global = true, value_parser = parse_date)]
    asof: Option<NaiveDate>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the weekly report (default command)
    Summarize(SummarizeArgs),
    /// Append one evaluation to the workbook
    Record(RecordArgs),
    /// Start the HTTP service
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    telemetry::init(&config.telemetry)?;

    let workbook = cli
        .workbook
        .unwrap_or_else(|| config.storage.workbook_path.clone());
    let asof = cli
        .asof
        .map(|date| start_of_day(date, config.scoring.timezone))
        .transpose()
        .map_err(AppError::Internal)?;
    let command = cli
        .command
        .unwrap_or_else(|| Command::Summarize(SummarizeArgs::default()));

    match command {
        Command::Summarize(args) => run_summarize(&config, &workbook, asof, args),
        Command::Record(args) => run_record(&config, &workbook, args),
        Command::Serve(args) => server::run(config, workbook, args).await,
    }
}
