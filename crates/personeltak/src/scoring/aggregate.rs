use super::config::ScoringConfig;
use super::domain::{Criterion, Employee, MissingRow, Role, ScoreRow};
use super::period::{normalized_score, EvaluationIndex, PeriodWindow};

/// Rolls role scores up into criterion values and criterion values into one employee total.
pub struct Aggregator<'a> {
    config: &'a ScoringConfig,
    window: &'a PeriodWindow,
    criteria: &'a [Criterion],
    index: &'a EvaluationIndex,
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    weighted_sum: f64,
    weight_sum: f64,
}

impl Accumulator {
    fn add(&mut self, value: f64, weight: f64) {
        self.weighted_sum += value;
        self.weight_sum += weight;
    }

    fn total(self) -> f64 {
        if self.weight_sum == 0.0 {
            0.0
        } else {
            round2(100.0 * self.weighted_sum / self.weight_sum)
        }
    }
}

enum CriterionOutcome {
    Skipped,
    Missed,
    Scored { value: f64, missing: Vec<Role> },
}

impl<'a> Aggregator<'a> {
    pub fn new(
        config: &'a ScoringConfig,
        window: &'a PeriodWindow,
        criteria: &'a [Criterion],
        index: &'a EvaluationIndex,
    ) -> Self {
        Self {
            config,
            window,
            criteria,
            index,
        }
    }

    pub fn score_employee(&self, employee: &Employee) -> (ScoreRow, Vec<MissingRow>) {
        let mut accumulator = Accumulator::default();
        let mut missing = Vec::new();

        for criterion in self.criteria {
            match self.score_criterion(employee, criterion) {
                CriterionOutcome::Skipped => {}
                CriterionOutcome::Missed => {
                    let all_roles = criterion.roles.iter().collect();
                    missing.push(missing_row(employee, criterion, all_roles));
                }
                CriterionOutcome::Scored {
                    value,
                    missing: roles,
                } => {
                    let weight = self.config.category_weight(&criterion.category);
                    accumulator.add(value * weight, weight);
                    if !roles.is_empty() {
                        missing.push(missing_row(employee, criterion, roles));
                    }
                }
            }
        }

        let row = ScoreRow {
            sicil: employee.sicil.clone(),
            name: employee.name.clone(),
            department: employee.department.clone(),
            title: employee.title.clone(),
            total_score: accumulator.total(),
            week: self.window.current_week().to_string(),
        };

        (row, missing)
    }

    fn score_criterion(&self, employee: &Employee, criterion: &Criterion) -> CriterionOutcome {
        if criterion.roles.is_empty() {
            return CriterionOutcome::Skipped;
        }

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut resolved = 0usize;
        let mut missing = Vec::new();

        for role in criterion.roles.iter() {
            let candidates = self.index.records(&employee.sicil, criterion.po, role);
            match self.window.select(&criterion.period, candidates) {
                Some(record) => {
                    let weight = self.config.role_weight(role);
                    numerator += weight * normalized_score(record, criterion.max_score);
                    denominator += weight;
                    resolved += 1;
                }
                None => missing.push(role),
            }
        }

        if resolved == 0 || denominator == 0.0 {
            return CriterionOutcome::Missed;
        }

        CriterionOutcome::Scored {
            value: numerator / denominator,
            missing,
        }
    }
}

fn missing_row(employee: &Employee, criterion: &Criterion, roles: Vec<Role>) -> MissingRow {
    MissingRow {
        sicil: employee.sicil.clone(),
        name: employee.name.clone(),
        po: criterion.po,
        criterion: criterion.label.clone(),
        period: criterion.period_label.clone(),
        missing_roles: roles,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
