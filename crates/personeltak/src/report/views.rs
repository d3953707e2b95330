use crate::scoring::{missing_counts, MissingRow, RunResult, ScoreRow};
use serde::Serialize;

pub const SCORE_COLUMNS: [&str; 6] = [
    "Sicil",
    "AdSoyad",
    "Departman",
    "Unvan",
    "ToplamSkor",
    "Hafta",
];

pub const MISSING_COLUMNS: [&str; 6] = [
    "Sicil",
    "AdSoyad",
    "Po",
    "Değerlendirme",
    "Period",
    "Eksik_Roller",
];

pub const POWERBI_COLUMNS: [&str; 7] = [
    "Sicil",
    "AdSoyad",
    "Departman",
    "Unvan",
    "ToplamSkor",
    "Hafta",
    "EksikSayisi",
];

/// Body of `rapor_<week>.json` and of the report endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument<'a> {
    pub week: &'a str,
    pub scores: &'a [ScoreRow],
    pub missing: &'a [MissingRow],
    pub warnings: &'a [String],
}

impl<'a> From<&'a RunResult> for ReportDocument<'a> {
    fn from(result: &'a RunResult) -> Self {
        Self {
            week: &result.week,
            scores: &result.scores,
            missing: &result.missing,
            warnings: &result.warnings,
        }
    }
}

/// Score row plus the employee's missing-row count, for the Power BI dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerBiRow<'a> {
    #[serde(rename = "Sicil")]
    pub sicil: &'a str,
    #[serde(rename = "AdSoyad")]
    pub name: Option<&'a str>,
    #[serde(rename = "Departman")]
    pub department: Option<&'a str>,
    #[serde(rename = "Unvan")]
    pub title: Option<&'a str>,
    #[serde(rename = "ToplamSkor")]
    pub total_score: f64,
    #[serde(rename = "Hafta")]
    pub week: &'a str,
    #[serde(rename = "EksikSayisi")]
    pub missing_count: usize,
}

pub fn powerbi_rows(result: &RunResult) -> Vec<PowerBiRow<'_>> {
    let counts = missing_counts(&result.missing);
    result
        .scores
        .iter()
        .map(|row| PowerBiRow {
            sicil: &row.sicil,
            name: row.name.as_deref(),
            department: row.department.as_deref(),
            title: row.title.as_deref(),
            total_score: row.total_score,
            week: &row.week,
            missing_count: counts.get(row.sicil.as_str()).copied().unwrap_or(0),
        })
        .collect()
}
