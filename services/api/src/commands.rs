use crate::infra::{parse_date, parse_role, start_of_day};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use clap::Args;
use personeltak::config::AppConfig;
use personeltak::error::AppError;
use personeltak::report::export_report;
use personeltak::scoring::{RunResult, Role};
use personeltak::workbook::{record_evaluation, NewEvaluation};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Args, Debug, Default)]
pub(crate) struct SummarizeArgs {
    /// Directory for the report files (defaults to the configured report_path)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct RecordArgs {
    /// Employee registry number
    #[arg(long)]
    pub(crate) sicil: String,
    /// Evaluator role: Personel, Şef or Yönetici
    #[arg(long, value_parser = parse_role)]
    pub(crate) rol: Role,
    /// Criterion id
    #[arg(long)]
    pub(crate) po: u32,
    /// Raw score
    #[arg(long)]
    pub(crate) puan: f64,
    /// Free-text note
    #[arg(long = "not")]
    pub(crate) note: Option<String>,
    /// Evaluation date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_date)]
    pub(crate) tarih: Option<NaiveDate>,
}

pub(crate) fn run_summarize(
    config: &AppConfig,
    workbook: &Path,
    asof: Option<DateTime<Tz>>,
    args: SummarizeArgs,
) -> Result<(), AppError> {
    let output = args
        .output
        .unwrap_or_else(|| config.storage.report_path.clone());
    let exported = export_report(workbook, &output, config, asof)?;
    let result = &exported.result;

    info!(rows = result.scores.len(), "score table ready");
    if !result.missing.is_empty() {
        warn!(rows = result.missing.len(), "missing evaluations found");
    }
    for message in &result.warnings {
        warn!("{message}");
    }

    render_result(result);
    println!("\nReport files");
    for file in &exported.files {
        println!("- {}", file.display());
    }
    Ok(())
}

pub(crate) fn run_record(
    config: &AppConfig,
    workbook: &Path,
    args: RecordArgs,
) -> Result<(), AppError> {
    let tz = config.scoring.timezone;
    let timestamp = args
        .tarih
        .map(|date| start_of_day(date, tz))
        .transpose()
        .map_err(AppError::Internal)?;

    let evaluation = NewEvaluation {
        sicil: args.sicil,
        role: args.rol,
        po: args.po,
        score: args.puan,
        timestamp,
        note: args.note,
    };
    let row = record_evaluation(workbook, &evaluation, tz, config.storage.lock_timeout)?;

    println!(
        "Recorded {} for sicil {} on Po={} ({})",
        evaluation.score,
        evaluation.sicil,
        evaluation.po,
        row.timestamp.as_deref().unwrap_or_default()
    );
    Ok(())
}

pub(crate) fn render_result(result: &RunResult) {
    println!("Scores for {}", result.week);
    if result.scores.is_empty() {
        println!("- no employees");
    }
    for row in &result.scores {
        println!(
            "- {} {} ({}, {}): {:.2}",
            row.sicil,
            row.name.as_deref().unwrap_or("-"),
            row.department.as_deref().unwrap_or("-"),
            row.title.as_deref().unwrap_or("-"),
            row.total_score
        );
    }

    if result.missing.is_empty() {
        println!("\nMissing evaluations: none");
    } else {
        println!("\nMissing evaluations");
        for row in &result.missing {
            println!(
                "- {} {} Po={} {} [{}]: {}",
                row.sicil,
                row.name.as_deref().unwrap_or("-"),
                row.po,
                row.criterion.as_deref().unwrap_or("-"),
                row.period,
                row.missing_roles_label()
            );
        }
    }
}
