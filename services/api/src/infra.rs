use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use metrics_exporter_prometheus::PrometheusHandle;
use personeltak::config::AppConfig;
use personeltak::error::AppError;
use personeltak::scoring::{localize, Role};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) config: Arc<AppConfig>,
    pub(crate) workbook: Arc<PathBuf>,
}

/// Runs workbook I/O on the blocking pool.
pub(crate) async fn run_blocking<F, T, E>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| AppError::Internal(format!("blocking task failed: {err}")))?
        .map_err(Into::into)
}

/// Midnight of `date` in `tz`.
pub(crate) fn start_of_day(date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>, String> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|naive| localize(naive, tz))
        .ok_or_else(|| format!("{date} has no unambiguous midnight in {tz}"))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_role(raw: &str) -> Result<Role, String> {
    Role::from_label(raw).ok_or_else(|| {
        let known = Role::ordered().map(Role::label).join(", ");
        format!("unknown role '{raw}' (expected one of: {known})")
    })
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_roles_and_dates() {
        assert_eq!(parse_role("Yönetici"), Ok(Role::Manager));
        assert!(parse_role("Müdür")
            .expect_err("unknown role")
            .contains("Personel, Şef, Yönetici"));
        assert!(parse_date("2024-03-10").is_ok());
        assert!(parse_date("10.03.2024").is_err());
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date");
        let midnight = start_of_day(date, chrono_tz::Europe::Istanbul).expect("midnight");
        assert_eq!(midnight.hour(), 0);
        assert_eq!(midnight.naive_utc().hour(), 21);
    }
}
