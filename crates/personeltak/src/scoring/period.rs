use super::domain::{Criterion, Evaluation, PeriodPolicy, Role, ValidationError, WarningLog};
use super::normalizer::iso_week_key;
use chrono::offset::LocalResult;
use chrono::{DateTime, Days, Duration, TimeZone};
use chrono_tz::Tz;
use std::collections::{BTreeSet, HashMap};

/// Reference instant plus the derived week key and rolling-window start.
#[derive(Debug, Clone)]
pub struct PeriodWindow {
    asof: DateTime<Tz>,
    current_week: String,
    since: DateTime<Tz>,
}

impl PeriodWindow {
    /// The rolling window starts `tespit_days` calendar days before `asof` on the local
    /// clock, so a DST change inside the window does not move its start.
    pub fn new(asof: DateTime<Tz>, tespit_days: u32) -> Result<Self, ValidationError> {
        let since = window_start(asof, tespit_days)
            .ok_or(ValidationError::WindowOutOfRange { days: tespit_days })?;
        Ok(Self {
            current_week: iso_week_key(&asof),
            since,
            asof,
        })
    }

    pub fn current_week(&self) -> &str {
        &self.current_week
    }

    pub fn admits(&self, policy: &PeriodPolicy, evaluation: &Evaluation) -> bool {
        match policy {
            PeriodPolicy::Weekly => evaluation.week_key == self.current_week,
            PeriodPolicy::RollingWindow => {
                evaluation.timestamp >= self.since && evaluation.timestamp <= self.asof
            }
            PeriodPolicy::Unknown(_) => false,
        }
    }

    /// Latest admitted record; equal timestamps resolve to the later row.
    pub fn select<'a, I>(&self, policy: &PeriodPolicy, candidates: I) -> Option<&'a Evaluation>
    where
        I: IntoIterator<Item = &'a Evaluation>,
    {
        candidates
            .into_iter()
            .filter(|evaluation| self.admits(policy, evaluation))
            .max_by_key(|evaluation| evaluation.timestamp)
    }
}

fn window_start(asof: DateTime<Tz>, days: u32) -> Option<DateTime<Tz>> {
    let naive = asof
        .naive_local()
        .checked_sub_days(Days::new(u64::from(days)))?;
    let tz = asof.timezone();
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(start) => Some(start),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&naive.checked_add_signed(Duration::hours(1))?)
            .earliest(),
    }
}

/// Clamps the raw score into `[0, max_score]` and scales it to `[0, 1]`.
pub fn normalized_score(evaluation: &Evaluation, max_score: f64) -> f64 {
    evaluation.score.clamp(0.0, max_score) / max_score
}

/// Evaluations that survived the run-level filters, grouped by employee, criterion and role.
#[derive(Debug, Default)]
pub struct EvaluationIndex {
    by_employee: HashMap<String, HashMap<(u32, Role), Vec<Evaluation>>>,
}

impl EvaluationIndex {
    /// Drops rows for unknown criteria (one summary warning) and rows whose role may not
    /// score the criterion (one warning per distinct pair).
    pub(crate) fn build(
        evaluations: Vec<Evaluation>,
        criteria: &[Criterion],
        warnings: &mut WarningLog,
    ) -> Self {
        let roles_by_po: HashMap<u32, _> = criteria
            .iter()
            .map(|criterion| (criterion.po, criterion.roles))
            .collect();

        let mut unknown_po = BTreeSet::new();
        let mut disallowed = Vec::new();
        let mut index = Self::default();

        for evaluation in evaluations {
            let Some(allowed) = roles_by_po.get(&evaluation.po) else {
                unknown_po.insert(evaluation.po);
                continue;
            };

            match Role::from_label(&evaluation.role) {
                Some(role) if allowed.contains(role) => index.insert(role, evaluation),
                _ => disallowed.push(format!(
                    "Role {} not allowed for Po={}; record ignored",
                    evaluation.role, evaluation.po
                )),
            }
        }

        if !unknown_po.is_empty() {
            let ids = unknown_po.into_iter().collect::<Vec<_>>();
            warnings.push(format!("Evaluations with unknown Po ignored: {ids:?}"));
        }
        for message in disallowed {
            warnings.push(message);
        }

        index
    }

    fn insert(&mut self, role: Role, evaluation: Evaluation) {
        self.by_employee
            .entry(evaluation.sicil.clone())
            .or_default()
            .entry((evaluation.po, role))
            .or_default()
            .push(evaluation);
    }

    pub fn records(&self, sicil: &str, po: u32, role: Role) -> &[Evaluation] {
        self.by_employee
            .get(sicil)
            .and_then(|entries| entries.get(&(po, role)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
