//! Canonical multi-variable daily series shared by every provider.

use crate::filter::matches_date;
use crate::variable::ClimateVariable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date key format used throughout the series (`YYYYMMDD`).
pub const DATE_KEY_FORMAT: &str = "%Y%m%d";

/// Observations for one variable, keyed by `YYYYMMDD`.
///
/// Missing observations are absent keys, never a sentinel value.
pub type DailySeries = BTreeMap<String, f64>;

/// Variable -> date -> value, as produced by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClimateSeries {
    variables: BTreeMap<ClimateVariable, DailySeries>,
}

impl ClimateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation, replacing any earlier value for that date.
    pub fn insert(&mut self, variable: ClimateVariable, date_key: impl Into<String>, value: f64) {
        self.variables
            .entry(variable)
            .or_default()
            .insert(date_key.into(), value);
    }

    /// Make sure `variable` is present even when it has no observations.
    pub fn ensure_variable(&mut self, variable: ClimateVariable) {
        self.variables.entry(variable).or_default();
    }

    pub fn get(&self, variable: ClimateVariable) -> Option<&DailySeries> {
        self.variables.get(&variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = ClimateVariable> + '_ {
        self.variables.keys().copied()
    }

    /// True when no variable carries a single observation.
    pub fn is_empty(&self) -> bool {
        self.variables.values().all(BTreeMap::is_empty)
    }

    pub fn observation_count(&self) -> usize {
        self.variables.values().map(BTreeMap::len).sum()
    }

    /// A copy holding only dates in `month` (and `day`, when given).
    ///
    /// Unparseable date keys are dropped. Every variable is kept, possibly empty.
    pub fn restricted_to(&self, month: u32, day: Option<u32>) -> Self {
        let variables = self
            .variables
            .iter()
            .map(|(variable, series)| {
                let kept = series
                    .iter()
                    .filter(|(key, _)| matches_date(key, month, day).is_some())
                    .map(|(key, value)| (key.clone(), *value))
                    .collect();
                (*variable, kept)
            })
            .collect();
        Self { variables }
    }
}

impl FromIterator<(ClimateVariable, DailySeries)> for ClimateSeries {
    fn from_iter<I: IntoIterator<Item = (ClimateVariable, DailySeries)>>(iter: I) -> Self {
        Self {
            variables: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_when_variables_have_no_observations() {
        let mut series = ClimateSeries::new();
        series.ensure_variable(ClimateVariable::Temperature);
        assert!(series.is_empty());

        series.insert(ClimateVariable::Temperature, "20200615", 31.2);
        assert!(!series.is_empty());
        assert_eq!(series.observation_count(), 1);
    }

    #[test]
    fn test_restricted_to_day() {
        let mut series = ClimateSeries::new();
        series.insert(ClimateVariable::Temperature, "20200615", 31.2);
        series.insert(ClimateVariable::Temperature, "20200616", 29.0);
        series.insert(ClimateVariable::Temperature, "20210615", 33.4);
        series.insert(ClimateVariable::WindSpeed, "20200701", 4.0);

        let june_15 = series.restricted_to(6, Some(15));
        let temps = june_15.get(ClimateVariable::Temperature).unwrap();
        assert_eq!(temps.len(), 2);
        assert!(temps.contains_key("20210615"));
        assert!(june_15.get(ClimateVariable::WindSpeed).unwrap().is_empty());

        let june = series.restricted_to(6, None);
        assert_eq!(june.observation_count(), 3);
    }

    #[test]
    fn test_restricted_to_drops_bad_keys() {
        let mut series = ClimateSeries::new();
        series.insert(ClimateVariable::Precipitation, "2020-06-15", 3.0);
        series.insert(ClimateVariable::Precipitation, "20200615", 4.0);
        let june = series.restricted_to(6, None);
        assert_eq!(june.observation_count(), 1);
    }

    #[test]
    fn test_serializes_as_nested_map() {
        let mut series = ClimateSeries::new();
        series.insert(ClimateVariable::RelativeHumidity, "20200615", 72.5);
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json, serde_json::json!({"RH2M": {"20200615": 72.5}}));
    }
}
