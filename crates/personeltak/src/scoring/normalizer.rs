use super::domain::{Evaluation, ValidationError};
use super::tables::EvaluationRow;
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Types the raw evaluation table. Rows that cannot be parsed are dropped without a warning;
/// a negative score anywhere in the table rejects the whole snapshot.
pub fn normalize_evaluations(
    rows: &[EvaluationRow],
    tz: Tz,
) -> Result<Vec<Evaluation>, ValidationError> {
    let negative = rows
        .iter()
        .filter_map(|row| row.score.as_deref().and_then(parse_score))
        .filter(|score| *score < 0.0)
        .count();
    if negative > 0 {
        return Err(ValidationError::NegativeScore { count: negative });
    }

    Ok(rows.iter().filter_map(|row| normalize_row(row, tz)).collect())
}

fn normalize_row(row: &EvaluationRow, tz: Tz) -> Option<Evaluation> {
    let sicil = row.sicil.clone()?;
    let po = row.po.as_deref().and_then(parse_po)?;
    let role = row.role.clone()?;
    let timestamp = row
        .timestamp
        .as_deref()
        .and_then(|value| parse_timestamp(value, tz))?;
    let score = row.score.as_deref().and_then(parse_score)?;
    let week_key = row
        .week_key
        .clone()
        .unwrap_or_else(|| iso_week_key(&timestamp));

    Some(Evaluation {
        sicil,
        po,
        role,
        score,
        timestamp,
        week_key,
        note: row.note.clone(),
    })
}

/// ISO year-week key such as `2024-W07`.
pub fn iso_week_key<T: Datelike>(value: &T) -> String {
    let week = value.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Parses RFC 3339 instants and naive date/time strings; naive values are read as local
/// time in `tz`.
pub fn parse_timestamp(value: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&tz));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return localize(naive, tz);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return localize(date.and_hms_opt(0, 0, 0)?, tz);
    }

    None
}

/// Local times inside a DST gap move forward one hour; ambiguous local times resolve to `None`.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(_, _) => None,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .single(),
    }
}

fn parse_score(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let parsed = trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())?;
    parsed.is_finite().then_some(parsed)
}

/// Accepts `3` as well as spreadsheet-style `3.0`.
pub(crate) fn parse_po(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if let Ok(po) = trimmed.parse::<u32>() {
        return Some(po);
    }

    let real = trimmed.parse::<f64>().ok()?;
    if real.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&real) {
        Some(real as u32)
    } else {
        None
    }
}
