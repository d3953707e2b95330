use super::domain::{Criterion, PeriodPolicy, Role, RoleSet, ValidationError};
use super::normalizer::parse_po;
use super::tables::CriterionRow;
use std::collections::HashSet;

const DEFAULT_CATEGORY: &str = "İş";
const DEFAULT_MAX_SCORE: f64 = 5.0;

/// Validates the criteria table and resolves each criterion's eligible roles, keeping table order.
pub fn resolve_criteria(rows: &[CriterionRow]) -> Result<Vec<Criterion>, ValidationError> {
    let ids = rows
        .iter()
        .map(criterion_id)
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for po in &ids {
        if !seen.insert(*po) && !duplicates.contains(po) {
            duplicates.push(*po);
        }
    }
    if !duplicates.is_empty() {
        return Err(ValidationError::DuplicateCriterion(duplicates));
    }

    rows.iter()
        .zip(ids)
        .map(|(row, po)| build_criterion(row, po))
        .collect()
}

/// Roles whose marker cell reads `x`, in vocabulary order.
pub fn eligible_roles(row: &CriterionRow) -> RoleSet {
    Role::ordered()
        .into_iter()
        .filter(|role| is_marked(row.marker(*role)))
        .collect()
}

fn is_marked(cell: Option<&str>) -> bool {
    cell.map(|value| value.trim().eq_ignore_ascii_case("x"))
        .unwrap_or(false)
}

fn criterion_id(row: &CriterionRow) -> Result<u32, ValidationError> {
    let raw = row.po.as_deref().unwrap_or_default();
    match parse_po(raw) {
        Some(po) if po > 0 => Ok(po),
        _ => Err(ValidationError::InvalidCriterion {
            po: raw.to_string(),
            reason: "Po must be a positive integer".to_string(),
        }),
    }
}

fn build_criterion(row: &CriterionRow, po: u32) -> Result<Criterion, ValidationError> {
    let max_score = match row.max_score.as_deref() {
        None => DEFAULT_MAX_SCORE,
        Some(raw) => parse_max_score(raw).ok_or_else(|| ValidationError::InvalidCriterion {
            po: po.to_string(),
            reason: format!("PuanMax '{raw}' is not a number"),
        })?,
    };
    if max_score <= 0.0 {
        return Err(ValidationError::NonPositiveMaxScore { po });
    }

    let period_label = row
        .period
        .clone()
        .unwrap_or_else(|| PeriodPolicy::DEFAULT_LABEL.to_string());

    Ok(Criterion {
        po,
        label: row.label.clone(),
        category: row
            .category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        period: PeriodPolicy::parse(&period_label),
        period_label,
        max_score,
        roles: eligible_roles(row),
    })
}

fn parse_max_score(raw: &str) -> Option<f64> {
    let value = raw.trim().replace(',', ".").parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(po: &str) -> CriterionRow {
        CriterionRow {
            po: Some(po.to_string()),
            label: Some(format!("Kriter {po}")),
            personnel: Some("x".to_string()),
            manager: Some(" X ".to_string()),
            ..CriterionRow::default()
        }
    }

    #[test]
    fn resolves_defaults_and_marked_roles() {
        let criteria = resolve_criteria(&[criterion("1")]).expect("resolves");
        let resolved = &criteria[0];

        assert_eq!(resolved.po, 1);
        assert_eq!(resolved.category, "İş");
        assert_eq!(resolved.period, PeriodPolicy::Weekly);
        assert_eq!(resolved.period_label, "Haftalık");
        assert_eq!(resolved.max_score, 5.0);
        assert_eq!(
            resolved.roles.iter().collect::<Vec<_>>(),
            vec![Role::Personnel, Role::Manager]
        );
    }

    #[test]
    fn only_x_markers_grant_eligibility() {
        let mut row = criterion("2");
        row.personnel = Some("evet".to_string());
        row.supervisor = Some("xx".to_string());
        row.manager = None;

        assert!(eligible_roles(&row).is_empty());
    }

    #[test]
    fn duplicate_po_is_structural() {
        let rows = vec![criterion("1"), criterion("2"), criterion("1"), criterion("1")];

        let error = resolve_criteria(&rows).expect_err("duplicate po");
        assert_eq!(error, ValidationError::DuplicateCriterion(vec![1]));
    }

    #[test]
    fn non_positive_max_score_is_structural() {
        for raw in ["0", "-3"] {
            let mut row = criterion("4");
            row.max_score = Some(raw.to_string());

            let error = resolve_criteria(&[row]).expect_err("max score");
            assert_eq!(error, ValidationError::NonPositiveMaxScore { po: 4 });
        }
    }

    #[test]
    fn unparseable_definitions_are_structural() {
        let mut row = criterion("5");
        row.max_score = Some("beş".to_string());
        assert!(matches!(
            resolve_criteria(&[row]),
            Err(ValidationError::InvalidCriterion { .. })
        ));

        let mut row = criterion("1");
        row.po = None;
        assert!(matches!(
            resolve_criteria(&[row]),
            Err(ValidationError::InvalidCriterion { .. })
        ));
    }
}
