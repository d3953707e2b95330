//! Workbook store: a directory of `Kriterler.csv`, `Calisanlar.csv` and
//! `Degerlendirmeler.csv` guarded by a sibling `.lock` file.

mod lock;
mod parser;
mod record;

pub use lock::WorkbookLock;
pub use parser::Table;
pub use record::{record_evaluation, NewEvaluation};

use crate::scoring::{Snapshot, ValidationError};
use parser::read_table;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("workbook not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid csv in {}: {source}", display_location(.path))]
    Csv {
        path: Option<PathBuf>,
        source: csv::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(
        "unable to acquire lock for workbook {} within {} seconds",
        .path.display(),
        .timeout.as_secs_f64()
    )]
    LockTimeout { path: PathBuf, timeout: Duration },
}

impl WorkbookError {
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn at(self, path: &Path) -> Self {
        match self {
            Self::Csv { path: None, source } => Self::Csv {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

impl From<csv::Error> for WorkbookError {
    fn from(source: csv::Error) -> Self {
        Self::Csv { path: None, source }
    }
}

fn display_location(path: &Option<PathBuf>) -> String {
    path.as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "input".to_string())
}

pub(crate) fn ensure_workbook(workbook: &Path) -> Result<(), WorkbookError> {
    if workbook.is_dir() {
        Ok(())
    } else {
        Err(WorkbookError::NotFound {
            path: workbook.to_path_buf(),
        })
    }
}

/// Reads all three tables under the workbook lock.
pub fn load_snapshot(
    workbook: &Path,
    employees_path: Option<&Path>,
    timeout: Duration,
) -> Result<Snapshot, WorkbookError> {
    ensure_workbook(workbook)?;
    if let Some(path) = employees_path {
        if !path.is_file() {
            return Err(WorkbookError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let _lock = WorkbookLock::acquire(workbook, timeout)?;

    let criteria = read_table(&workbook.join(Table::Criteria.file_name()), Table::Criteria)?;
    let evaluations = read_table(
        &workbook.join(Table::Evaluations.file_name()),
        Table::Evaluations,
    )?;
    let employees = match employees_path {
        Some(path) => {
            debug!(path = %path.display(), "employees loaded from override path");
            read_table(path, Table::Employees)?
        }
        None => {
            debug!(workbook = %workbook.display(), "employees loaded from primary workbook");
            read_table(&workbook.join(Table::Employees.file_name()), Table::Employees)?
        }
    };

    Ok(Snapshot {
        criteria,
        employees,
        evaluations,
    })
}
