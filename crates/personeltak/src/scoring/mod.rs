//! Scoring engine: turns one workbook snapshot into per-employee scores, missing-coverage
//! rows and warnings.
//!
//! The engine performs no I/O. Structural defects in the snapshot abort the run with a
//! [`ValidationError`]; everything else degrades into warnings on the [`RunResult`].

mod aggregate;
mod config;
mod coverage;
mod criteria;
pub mod domain;
mod normalizer;
mod period;
pub mod tables;

pub use aggregate::{round2, Aggregator};
pub use config::ScoringConfig;
pub use coverage::{filter_missing, missing_counts};
pub use criteria::{eligible_roles, resolve_criteria};
pub use domain::{
    Criterion, Employee, Evaluation, MissingRow, PeriodPolicy, Role, RoleSet, RunResult,
    ScoreRow, ValidationError,
};
pub use normalizer::{iso_week_key, localize, normalize_evaluations, parse_timestamp};
pub use period::{normalized_score, EvaluationIndex, PeriodWindow};
pub use tables::{CriterionRow, EmployeeRow, EvaluationRow, Snapshot};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use domain::WarningLog;

/// Stateless engine applying a [`ScoringConfig`] to workbook snapshots.
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// `asof` defaults to the current instant in the configured time zone.
    pub fn summarize(
        &self,
        snapshot: &Snapshot,
        asof: Option<DateTime<Tz>>,
    ) -> Result<RunResult, ValidationError> {
        let tz = self.config.timezone;
        let asof = asof
            .map(|value| value.with_timezone(&tz))
            .unwrap_or_else(|| Utc::now().with_timezone(&tz));

        let criteria = resolve_criteria(&snapshot.criteria)?;
        let evaluations = normalize_evaluations(&snapshot.evaluations, tz)?;

        let mut warnings = WarningLog::default();
        let index = EvaluationIndex::build(evaluations, &criteria, &mut warnings);
        for criterion in &criteria {
            if let PeriodPolicy::Unknown(label) = &criterion.period {
                if !criterion.roles.is_empty() {
                    warnings.push(format!(
                        "Unknown period '{label}' for Po={}",
                        criterion.po
                    ));
                }
            }
        }

        let window = PeriodWindow::new(asof, self.config.tespit_days)?;
        let aggregator = Aggregator::new(&self.config, &window, &criteria, &index);

        let mut scores = Vec::new();
        let mut missing = Vec::new();
        for employee in snapshot.employees.iter().filter_map(Employee::from_row) {
            let (row, employee_missing) = aggregator.score_employee(&employee);
            scores.push(row);
            missing.extend(employee_missing);
        }

        Ok(RunResult {
            week: window.current_week().to_string(),
            scores,
            missing: filter_missing(missing, self.config.missing_threshold),
            warnings: warnings.into_messages(),
        })
    }
}

/// Convenience wrapper around [`ScoringEngine::summarize`].
pub fn summarize_scores(
    snapshot: &Snapshot,
    config: &ScoringConfig,
    asof: Option<DateTime<Tz>>,
) -> Result<RunResult, ValidationError> {
    ScoringEngine::new(config.clone()).summarize(snapshot, asof)
}

impl Employee {
    /// Employees without a `Sicil` are not scored.
    pub fn from_row(row: &EmployeeRow) -> Option<Self> {
        Some(Self {
            sicil: row.sicil.clone()?,
            name: row.name.clone(),
            department: row.department.clone(),
            title: row.title.clone(),
        })
    }
}
