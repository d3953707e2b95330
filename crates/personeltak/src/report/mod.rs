pub mod views;
mod writer;

pub use writer::write_csv;

use crate::config::AppConfig;
use crate::scoring::{RunResult, ScoringEngine, ValidationError};
use crate::workbook::{load_snapshot, WorkbookError};
use chrono::DateTime;
use chrono_tz::Tz;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use views::{powerbi_rows, ReportDocument, MISSING_COLUMNS, POWERBI_COLUMNS, SCORE_COLUMNS};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unable to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("unable to write report: {0}")]
    Write(#[source] io::Error),
    #[error("unable to encode csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to encode json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn at(self, path: &Path) -> Self {
        match self {
            Self::Write(source) => Self::io(path, source),
            other => other,
        }
    }

    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::Workbook(err) if err.is_lock_timeout())
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Workbook(err) => err.validation(),
            _ => None,
        }
    }
}

/// Run output plus every file written for it.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub result: RunResult,
    pub files: Vec<PathBuf>,
}

/// Loads the workbook under its lock and scores it without writing anything.
pub fn build_report(
    workbook: &Path,
    config: &AppConfig,
    asof: Option<DateTime<Tz>>,
) -> Result<RunResult, ReportError> {
    let snapshot = load_snapshot(
        workbook,
        config.storage.employees_path.as_deref(),
        config.storage.lock_timeout,
    )?;
    info!(
        workbook = %workbook.display(),
        criteria = snapshot.criteria.len(),
        employees = snapshot.employees.len(),
        evaluations = snapshot.evaluations.len(),
        "workbook loaded for reporting"
    );

    let engine = ScoringEngine::new(config.scoring.clone());
    Ok(engine.summarize(&snapshot, asof)?)
}

/// Writes `rapor_<week>.json` plus the optional CSV and Power BI exports into `output_dir`.
pub fn export_report(
    workbook: &Path,
    output_dir: &Path,
    config: &AppConfig,
    asof: Option<DateTime<Tz>>,
) -> Result<ExportedReport, ReportError> {
    let result = build_report(workbook, config, asof)?;
    let week = result.week.as_str();
    let mut files = Vec::new();

    create_dir(output_dir)?;
    let report_file = output_dir.join(format!("rapor_{week}.json"));
    writer::write_json(&report_file, &ReportDocument::from(&result))?;
    info!(path = %report_file.display(), "report written");
    files.push(report_file);

    if config.export.csv_export {
        let scores_csv = output_dir.join(format!("rapor_{week}_Skorlar.csv"));
        let missing_csv = output_dir.join(format!("rapor_{week}_EksikPuanlamalar.csv"));
        writer::write_csv_file(&scores_csv, &SCORE_COLUMNS, &result.scores)?;
        writer::write_csv_file(&missing_csv, &MISSING_COLUMNS, &result.missing)?;
        info!(
            scores = %scores_csv.display(),
            missing = %missing_csv.display(),
            "csv reports written"
        );
        files.push(scores_csv);
        files.push(missing_csv);
    }

    if config.export.powerbi_export {
        let powerbi_dir = config.powerbi_dir();
        create_dir(powerbi_dir)?;
        let dataset = powerbi_dir.join(format!("personeltak_powerbi_{week}.csv"));
        writer::write_csv_file(&dataset, &POWERBI_COLUMNS, &powerbi_rows(&result))?;
        info!(path = %dataset.display(), "power bi dataset updated");
        files.push(dataset);
    }

    Ok(ExportedReport { result, files })
}

/// Score table as CSV bytes, BOM included.
pub fn scores_csv(result: &RunResult) -> Result<Vec<u8>, ReportError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, &SCORE_COLUMNS, &result.scores)?;
    Ok(buffer)
}

fn create_dir(path: &Path) -> Result<(), ReportError> {
    fs::create_dir_all(path).map_err(|source| ReportError::io(path, source))
}
