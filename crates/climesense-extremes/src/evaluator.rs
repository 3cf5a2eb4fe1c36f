//! Per-year compound match decisions.

use crate::conditions::{CombinationPolicy, ConditionDefinition};
use crate::variable::ClimateVariable;
use serde::Serialize;
use std::collections::BTreeMap;

/// One year's observed value for each of a condition's variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct YearObservation {
    values: BTreeMap<ClimateVariable, Option<f64>>,
}

impl YearObservation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variable: ClimateVariable, value: Option<f64>) -> Self {
        self.set(variable, value);
        self
    }

    pub fn set(&mut self, variable: ClimateVariable, value: Option<f64>) {
        self.values.insert(variable, value);
    }

    pub fn get(&self, variable: ClimateVariable) -> Option<f64> {
        self.values.get(&variable).copied().flatten()
    }
}

/// Observed value strictly above threshold. Missing value or threshold is `None`.
fn exceeds(
    condition: &ConditionDefinition,
    observation: &YearObservation,
    variable: ClimateVariable,
) -> Option<bool> {
    let value = observation.get(variable)?;
    let threshold = condition.threshold(variable)?;
    Some(value > threshold)
}

/// Decide whether `condition` occurred in the observed year.
pub fn evaluate(condition: &ConditionDefinition, observation: &YearObservation) -> bool {
    let checks = || {
        condition
            .variables
            .iter()
            .map(move |var| exceeds(condition, observation, *var))
    };

    match condition.policy {
        CombinationPolicy::All => checks().all(|c| c == Some(true)),
        CombinationPolicy::AtLeast(n) => checks().filter(|c| *c == Some(true)).count() >= n,
        CombinationPolicy::Any => checks().flatten().any(|c| c),
        CombinationPolicy::Composite { cutoff, .. } => {
            composite_score(condition, observation) > cutoff
        }
    }
}

/// Weighted discomfort score; each term is non-negative.
///
/// A variable contributes `weight * excess / threshold` only when it crosses
/// its threshold in the uncomfortable direction (below for wind, above otherwise).
pub fn composite_score(condition: &ConditionDefinition, observation: &YearObservation) -> f64 {
    condition
        .variables
        .iter()
        .filter_map(|var| {
            let weight = condition.policy.weight(*var)?;
            let value = observation.get(*var)?;
            let threshold = condition.threshold(*var)?;
            if threshold == 0.0 {
                return None;
            }
            let excess = if var.low_is_bad() {
                threshold - value
            } else {
                value - threshold
            };
            Some(weight * (excess / threshold).max(0.0))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::condition;
    use crate::variable::ClimateVariable::*;

    #[test]
    fn test_all_matches_when_every_variable_exceeds() {
        let hot = condition("very_hot").unwrap();
        let obs = YearObservation::new()
            .with(Temperature, Some(33.0))
            .with(RelativeHumidity, Some(75.0))
            .with(TemperatureMin, Some(23.0));
        assert!(evaluate(hot, &obs));
    }

    #[test]
    fn test_all_fails_on_one_missing_variable() {
        let hot = condition("very_hot").unwrap();
        let obs = YearObservation::new()
            .with(Temperature, Some(40.0))
            .with(RelativeHumidity, Some(90.0))
            .with(TemperatureMin, None);
        assert!(!evaluate(hot, &obs));
    }

    #[test]
    fn test_all_is_strict() {
        let hot = condition("very_hot").unwrap();
        let obs = YearObservation::new()
            .with(Temperature, Some(32.0))
            .with(RelativeHumidity, Some(75.0))
            .with(TemperatureMin, Some(23.0));
        assert!(!evaluate(hot, &obs));
    }

    #[test]
    fn test_at_least_two_of_three() {
        let cold = condition("very_cold").unwrap();
        let two = YearObservation::new()
            .with(TemperatureMin, Some(6.0))
            .with(WindSpeed, Some(5.5))
            .with(Temperature, Some(6.0));
        assert!(evaluate(cold, &two));

        let one = YearObservation::new()
            .with(TemperatureMin, Some(6.0))
            .with(WindSpeed, Some(4.0))
            .with(Temperature, Some(6.0));
        assert!(!evaluate(cold, &one));
    }

    #[test]
    fn test_at_least_counts_missing_as_false() {
        let cold = condition("very_cold").unwrap();
        let obs = YearObservation::new()
            .with(TemperatureMin, Some(6.0))
            .with(WindSpeed, None)
            .with(Temperature, None);
        assert!(!evaluate(cold, &obs));
    }

    #[test]
    fn test_any_skips_missing() {
        let wet = condition("very_wet").unwrap();
        assert!(evaluate(wet, &YearObservation::new().with(Precipitation, Some(25.0))));
        assert!(!evaluate(wet, &YearObservation::new().with(Precipitation, Some(20.0))));
        assert!(!evaluate(wet, &YearObservation::new().with(Precipitation, None)));
    }

    fn uncomfortable(t: f64, rh: f64, ws: f64, p: f64) -> YearObservation {
        YearObservation::new()
            .with(Temperature, Some(t))
            .with(RelativeHumidity, Some(rh))
            .with(WindSpeed, Some(ws))
            .with(Precipitation, Some(p))
    }

    #[test]
    fn test_composite_partial_crossings() {
        let cfg = condition("very_uncomfortable").unwrap();
        // Precipitation stays under its threshold and adds nothing.
        let obs = uncomfortable(35.0, 80.0, 1.0, 0.5);
        let expected = 0.3 * 5.0 / 30.0 + 0.3 * 15.0 / 65.0 + 0.2 * 2.0 / 3.0;
        let score = composite_score(cfg, &obs);
        assert!((score - expected).abs() < 1e-12, "score {}", score);
        assert!(score > 0.0);
        assert!(!evaluate(cfg, &obs));
    }

    #[test]
    fn test_composite_matches_above_cutoff() {
        let cfg = condition("very_uncomfortable").unwrap();
        let obs = uncomfortable(40.0, 95.0, 0.5, 2.5);
        assert!(composite_score(cfg, &obs) > 0.5);
        assert!(evaluate(cfg, &obs));
    }

    #[test]
    fn test_composite_never_negative() {
        let cfg = condition("very_uncomfortable").unwrap();
        // Cool, dry, breezy: every term is on the comfortable side.
        let obs = uncomfortable(15.0, 30.0, 8.0, 0.0);
        assert_eq!(composite_score(cfg, &obs), 0.0);
    }

    #[test]
    fn test_composite_ignores_missing_values() {
        let cfg = condition("very_uncomfortable").unwrap();
        let obs = YearObservation::new()
            .with(Precipitation, Some(4.0))
            .with(Temperature, None);
        let score = composite_score(cfg, &obs);
        assert!((score - 0.6).abs() < 1e-12);
        assert!(evaluate(cfg, &obs));
    }
}
