use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Keys accepted in a YAML or JSON config file. Anything left out keeps its default.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub(crate) role_weights: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub(crate) category_weights: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub(crate) tespit_days: Option<u32>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default, alias = "excel_path")]
    pub(crate) workbook_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) employees_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) report_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) log_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) log_level: Option<String>,
    #[serde(default)]
    pub(crate) missing_threshold: Option<u32>,
    #[serde(default)]
    pub(crate) csv_export: Option<bool>,
    #[serde(default)]
    pub(crate) powerbi_export: Option<bool>,
    #[serde(default)]
    pub(crate) powerbi_output: Option<PathBuf>,
    /// Seconds.
    #[serde(default)]
    pub(crate) lock_timeout: Option<f64>,
}

pub(crate) enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub(crate) fn from_path(path: &std::path::Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}
