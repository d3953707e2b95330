use super::domain::Role;
use chrono_tz::Tz;
use std::collections::BTreeMap;

/// Weights and windows applied by the scoring engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub role_weights: BTreeMap<String, f64>,
    pub category_weights: BTreeMap<String, f64>,
    pub tespit_days: u32,
    pub timezone: Tz,
    pub missing_threshold: Option<u32>,
}

impl ScoringConfig {
    /// Unconfigured roles weigh nothing.
    pub fn role_weight(&self, role: Role) -> f64 {
        self.role_weights.get(role.label()).copied().unwrap_or(0.0)
    }

    pub fn category_weight(&self, category: &str) -> f64 {
        self.category_weights.get(category).copied().unwrap_or(1.0)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let role_weights = [
            (Role::Personnel, 0.20),
            (Role::Supervisor, 0.40),
            (Role::Manager, 0.40),
        ]
        .into_iter()
        .map(|(role, weight)| (role.label().to_string(), weight))
        .collect();

        let category_weights = [("İş", 1.0), ("Kanaat", 0.7)]
            .into_iter()
            .map(|(category, weight)| (category.to_string(), weight))
            .collect();

        Self {
            role_weights,
            category_weights,
            tespit_days: 30,
            timezone: chrono_tz::Europe::Istanbul,
            missing_threshold: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_fall_back_to_neutral_defaults() {
        let mut config = ScoringConfig::default();
        config.role_weights.remove("Şef");

        assert_eq!(config.role_weight(Role::Supervisor), 0.0);
        assert_eq!(config.role_weight(Role::Manager), 0.40);
        assert_eq!(config.category_weight("Kanaat"), 0.7);
        assert_eq!(config.category_weight("Bilinmeyen"), 1.0);
    }
}
