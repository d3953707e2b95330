use super::domain::Role;
use serde::{Deserialize, Deserializer, Serialize};

/// Raw rows of the three input tables, exactly as the storage collaborator hands them over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub criteria: Vec<CriterionRow>,
    pub employees: Vec<EmployeeRow>,
    pub evaluations: Vec<EvaluationRow>,
}

/// One row of the `Kriterler` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionRow {
    #[serde(rename = "Po", default, deserialize_with = "empty_string_as_none")]
    pub po: Option<String>,
    #[serde(
        rename = "Değerlendirme",
        alias = "Degerlendirme",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub label: Option<String>,
    #[serde(rename = "Kategori", default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    #[serde(rename = "Period", default, deserialize_with = "empty_string_as_none")]
    pub period: Option<String>,
    #[serde(rename = "PuanMax", default, deserialize_with = "empty_string_as_none")]
    pub max_score: Option<String>,
    #[serde(rename = "Personel", default, deserialize_with = "empty_string_as_none")]
    pub personnel: Option<String>,
    #[serde(
        rename = "Şef",
        alias = "Sef",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub supervisor: Option<String>,
    #[serde(
        rename = "Yönetici",
        alias = "Yonetici",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub manager: Option<String>,
}

impl CriterionRow {
    /// Eligibility marker cell for the given role column.
    pub fn marker(&self, role: Role) -> Option<&str> {
        match role {
            Role::Personnel => self.personnel.as_deref(),
            Role::Supervisor => self.supervisor.as_deref(),
            Role::Manager => self.manager.as_deref(),
        }
    }
}

/// One row of the `Calisanlar` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRow {
    #[serde(rename = "Sicil", default, deserialize_with = "empty_string_as_none")]
    pub sicil: Option<String>,
    #[serde(rename = "AdSoyad", default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
    #[serde(rename = "Departman", default, deserialize_with = "empty_string_as_none")]
    pub department: Option<String>,
    #[serde(rename = "Unvan", default, deserialize_with = "empty_string_as_none")]
    pub title: Option<String>,
}

/// One row of the `Degerlendirmeler` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    #[serde(rename = "Sicil", default, deserialize_with = "empty_string_as_none")]
    pub sicil: Option<String>,
    #[serde(rename = "Po", default, deserialize_with = "empty_string_as_none")]
    pub po: Option<String>,
    #[serde(rename = "Rol", default, deserialize_with = "empty_string_as_none")]
    pub role: Option<String>,
    #[serde(rename = "Puan", default, deserialize_with = "empty_string_as_none")]
    pub score: Option<String>,
    #[serde(rename = "Tarih", default, deserialize_with = "empty_string_as_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "HaftaYili", default, deserialize_with = "empty_string_as_none")]
    pub week_key: Option<String>,
    #[serde(rename = "Not", default, deserialize_with = "empty_string_as_none")]
    pub note: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}
