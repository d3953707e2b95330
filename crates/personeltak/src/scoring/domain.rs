use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Fixed vocabulary of evaluator roles, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Role {
    Personnel,
    Supervisor,
    Manager,
}

impl Role {
    pub const fn ordered() -> [Self; 3] {
        [Self::Personnel, Self::Supervisor, Self::Manager]
    }

    /// Column header and `Rol` cell value used by the workbook.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Personnel => "Personel",
            Self::Supervisor => "Şef",
            Self::Manager => "Yönetici",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ordered()
            .into_iter()
            .find(|role| role.label() == trimmed)
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Personnel => 0b001,
            Self::Supervisor => 0b010,
            Self::Manager => 0b100,
        }
    }
}

/// Set of roles allowed to score a criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in vocabulary order.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ordered()
            .into_iter()
            .filter(move |role| self.contains(*role))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = Self::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

/// Eligibility window policy of a criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodPolicy {
    Weekly,
    RollingWindow,
    Unknown(String),
}

impl PeriodPolicy {
    pub const DEFAULT_LABEL: &'static str = "Haftalık";

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "haftalık" | "haftalik" | "weekly" => Self::Weekly,
            "tespit" => Self::RollingWindow,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub po: u32,
    pub label: Option<String>,
    pub category: String,
    pub period: PeriodPolicy,
    /// Period cell as written in the workbook; echoed back in missing rows.
    pub period_label: String,
    pub max_score: f64,
    pub roles: RoleSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub sicil: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
}

/// Canonical evaluation produced by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub sicil: String,
    pub po: u32,
    pub role: String,
    pub score: f64,
    pub timestamp: DateTime<Tz>,
    pub week_key: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    #[serde(rename = "Sicil")]
    pub sicil: String,
    #[serde(rename = "AdSoyad")]
    pub name: Option<String>,
    #[serde(rename = "Departman")]
    pub department: Option<String>,
    #[serde(rename = "Unvan")]
    pub title: Option<String>,
    #[serde(rename = "ToplamSkor")]
    pub total_score: f64,
    #[serde(rename = "Hafta")]
    pub week: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingRow {
    #[serde(rename = "Sicil")]
    pub sicil: String,
    #[serde(rename = "AdSoyad")]
    pub name: Option<String>,
    #[serde(rename = "Po")]
    pub po: u32,
    #[serde(rename = "Değerlendirme")]
    pub criterion: Option<String>,
    #[serde(rename = "Period")]
    pub period: String,
    #[serde(rename = "Eksik_Roller", serialize_with = "serialize_roles")]
    pub missing_roles: Vec<Role>,
}

impl MissingRow {
    pub fn missing_roles_label(&self) -> String {
        join_roles(&self.missing_roles)
    }
}

/// Labels sorted by code point, so `Yönetici` precedes `Şef`.
pub(crate) fn join_roles(roles: &[Role]) -> String {
    let mut labels = roles.iter().map(|role| role.label()).collect::<Vec<_>>();
    labels.sort_unstable();
    labels.join(", ")
}

fn serialize_roles<S>(roles: &[Role], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&join_roles(roles))
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub week: String,
    pub scores: Vec<ScoreRow>,
    pub missing: Vec<MissingRow>,
    pub warnings: Vec<String>,
}

/// Ordered warning messages with duplicates suppressed.
#[derive(Debug, Default)]
pub(crate) struct WarningLog {
    messages: Vec<String>,
    seen: HashSet<String>,
}

impl WarningLog {
    pub(crate) fn push(&mut self, message: String) {
        if self.seen.insert(message.clone()) {
            self.messages.push(message);
        }
    }

    pub(crate) fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("workbook must contain the {0} table")]
    MissingTable(String),
    #[error("{table} table must contain '{column}' column")]
    MissingColumn { table: String, column: String },
    #[error("duplicate Po values in Kriterler: {0:?}")]
    DuplicateCriterion(Vec<u32>),
    #[error("PuanMax must be > 0 for all criteria (Po={po})")]
    NonPositiveMaxScore { po: u32 },
    #[error("invalid criterion definition for Po={po}: {reason}")]
    InvalidCriterion { po: String, reason: String },
    #[error("negative scores are not allowed ({count} row(s))")]
    NegativeScore { count: usize },
    #[error("Puan must be a finite, non-negative number (got {0})")]
    InvalidScore(f64),
    #[error("tespit window of {days} days is out of range")]
    WindowOutOfRange { days: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_set_iterates_in_vocabulary_order() {
        let set: RoleSet = [Role::Manager, Role::Personnel].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Role::Personnel, Role::Manager]);
        assert!(!set.contains(Role::Supervisor));
        assert!(RoleSet::empty().is_empty());
    }

    #[test]
    fn missing_role_labels_sort_by_code_point() {
        let row = MissingRow {
            sicil: "1001".to_string(),
            name: None,
            po: 1,
            criterion: None,
            period: "Haftalık".to_string(),
            missing_roles: Role::ordered().to_vec(),
        };
        assert_eq!(row.missing_roles_label(), "Personel, Yönetici, Şef");
    }

    #[test]
    fn role_labels_round_trip() {
        for role in Role::ordered() {
            assert_eq!(Role::from_label(role.label()), Some(role));
        }
        assert_eq!(Role::from_label(" Şef "), Some(Role::Supervisor));
        assert_eq!(Role::from_label("Müdür"), None);
    }

    #[test]
    fn period_policy_parses_known_labels() {
        assert_eq!(PeriodPolicy::parse("Haftalık"), PeriodPolicy::Weekly);
        assert_eq!(PeriodPolicy::parse("HAFTALIK"), PeriodPolicy::Weekly);
        assert_eq!(PeriodPolicy::parse(" Tespit "), PeriodPolicy::RollingWindow);
        assert_eq!(
            PeriodPolicy::parse("Aylık"),
            PeriodPolicy::Unknown("Aylık".to_string())
        );
    }

    #[test]
    fn warning_log_suppresses_duplicates() {
        let mut log = WarningLog::default();
        log.push("a".to_string());
        log.push("b".to_string());
        log.push("a".to_string());
        assert_eq!(log.into_messages(), vec!["a".to_string(), "b".to_string()]);
    }
}
