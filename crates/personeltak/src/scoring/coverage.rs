use super::domain::MissingRow;
use std::collections::{BTreeMap, HashSet};

/// Missing rows per employee.
pub fn missing_counts(rows: &[MissingRow]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(row.sicil.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Keeps the rows of employees with at least `threshold` missing rows. No threshold, or `0`,
/// keeps everything.
pub fn filter_missing(rows: Vec<MissingRow>, threshold: Option<u32>) -> Vec<MissingRow> {
    let threshold = match threshold {
        Some(value) if value > 0 => value as usize,
        _ => return rows,
    };

    let retained: HashSet<String> = missing_counts(&rows)
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .map(|(sicil, _)| sicil.to_string())
        .collect();

    rows.into_iter()
        .filter(|row| retained.contains(&row.sicil))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::domain::Role;

    fn missing(sicil: &str, po: u32) -> MissingRow {
        MissingRow {
            sicil: sicil.to_string(),
            name: None,
            po,
            criterion: None,
            period: "Haftalık".to_string(),
            missing_roles: vec![Role::Manager],
        }
    }

    fn rows() -> Vec<MissingRow> {
        vec![
            missing("1001", 1),
            missing("2002", 1),
            missing("1001", 2),
            missing("3003", 1),
            missing("1001", 3),
            missing("2002", 2),
        ]
    }

    #[test]
    fn no_threshold_keeps_all_rows() {
        assert_eq!(filter_missing(rows(), None), rows());
        assert_eq!(filter_missing(rows(), Some(0)), rows());
    }

    #[test]
    fn threshold_keeps_employees_at_or_above_count_in_order() {
        let filtered = filter_missing(rows(), Some(2));
        let keys: Vec<(&str, u32)> = filtered
            .iter()
            .map(|row| (row.sicil.as_str(), row.po))
            .collect();

        assert_eq!(
            keys,
            vec![("1001", 1), ("2002", 1), ("1001", 2), ("1001", 3), ("2002", 2)]
        );
    }

    #[test]
    fn every_retained_employee_meets_the_threshold() {
        let source = rows();
        let raw_counts = missing_counts(&source);
        for threshold in 1..=4 {
            let filtered = filter_missing(source.clone(), Some(threshold));
            for row in &filtered {
                assert!(raw_counts[row.sicil.as_str()] >= threshold as usize);
            }
            for (sicil, count) in &raw_counts {
                let present = filtered.iter().any(|row| row.sicil == *sicil);
                assert_eq!(present, *count >= threshold as usize);
            }
        }
    }
}
