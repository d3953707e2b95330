use super::lock::WorkbookLock;
use super::parser::{clean_headers, require_columns, Table};
use super::{ensure_workbook, WorkbookError};
use crate::scoring::{iso_week_key, EvaluationRow, Role, ValidationError};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Evaluation submitted through the CLI or the HTTP service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvaluation {
    pub sicil: String,
    pub role: Role,
    pub po: u32,
    pub score: f64,
    /// Defaults to the current instant.
    pub timestamp: Option<DateTime<Tz>>,
    pub note: Option<String>,
}

/// Appends one row to `Degerlendirmeler.csv`, in the column order of its existing header.
pub fn record_evaluation(
    workbook: &Path,
    evaluation: &NewEvaluation,
    tz: Tz,
    timeout: Duration,
) -> Result<EvaluationRow, WorkbookError> {
    if !evaluation.score.is_finite() {
        return Err(ValidationError::InvalidScore(evaluation.score).into());
    }
    if evaluation.score < 0.0 {
        return Err(ValidationError::NegativeScore { count: 1 }.into());
    }
    ensure_workbook(workbook)?;

    let _lock = WorkbookLock::acquire(workbook, timeout)?;
    let path = workbook.join(Table::Evaluations.file_name());
    let existing = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ValidationError::MissingTable(Table::Evaluations.name().to_string()).into())
        }
        Err(source) => return Err(WorkbookError::Io { path, source }),
    };

    let headers = {
        let mut reader = csv::ReaderBuilder::new().from_reader(existing.as_slice());
        clean_headers(reader.headers().map_err(|err| WorkbookError::from(err).at(&path))?)
    };
    require_columns(&headers, Table::Evaluations)?;

    let row = build_row(evaluation, tz);
    let values: Vec<&str> = headers.iter().map(|column| cell(&row, column)).collect();

    let io_error = |source| WorkbookError::Io {
        path: path.clone(),
        source,
    };
    let mut file = OpenOptions::new()
        .append(true)
        .open(&path)
        .map_err(io_error)?;
    if !existing.is_empty() && !existing.ends_with(b"\n") {
        file.write_all(b"\n").map_err(io_error)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer
        .write_record(&values)
        .map_err(|err| WorkbookError::from(err).at(&path))?;
    writer.flush().map_err(io_error)?;

    info!(
        sicil = %evaluation.sicil,
        po = evaluation.po,
        role = evaluation.role.label(),
        workbook = %workbook.display(),
        "evaluation recorded"
    );

    Ok(row)
}

fn build_row(evaluation: &NewEvaluation, tz: Tz) -> EvaluationRow {
    let timestamp = evaluation
        .timestamp
        .map(|value| value.with_timezone(&tz))
        .unwrap_or_else(|| Utc::now().with_timezone(&tz));

    EvaluationRow {
        sicil: Some(evaluation.sicil.trim().to_string()),
        po: Some(evaluation.po.to_string()),
        role: Some(evaluation.role.label().to_string()),
        score: Some(evaluation.score.to_string()),
        timestamp: Some(timestamp.format(TIMESTAMP_FORMAT).to_string()),
        week_key: Some(iso_week_key(&timestamp)),
        note: evaluation
            .note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string),
    }
}

fn cell<'a>(row: &'a EvaluationRow, column: &str) -> &'a str {
    let value = match column {
        "Sicil" => &row.sicil,
        "Po" => &row.po,
        "Rol" => &row.role,
        "Puan" => &row.score,
        "Tarih" => &row.timestamp,
        "HaftaYili" => &row.week_key,
        "Not" => &row.note,
        _ => return "",
    };
    value.as_deref().unwrap_or_default()
}
