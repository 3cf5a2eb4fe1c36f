//! Turns per-year verdicts into a historical probability.

use crate::conditions::{self, ConditionMetadata};
use crate::error::ExtremesError;
use crate::evaluator::{evaluate, YearObservation};
use crate::filter::filter_by_date;
use crate::series::ClimateSeries;
use crate::variable::ClimateVariable;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Verdict for one sampled year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchVerdict {
    pub year: i32,
    pub values: YearObservation,
    pub matched: bool,
}

/// Probability of a condition on a calendar date, with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityResult {
    /// Percentage in `[0, 100]`, rounded to two decimals
    pub probability: f64,
    pub years_total: usize,
    pub years_matching: usize,
    pub years_sampled: Vec<i32>,
    pub matching_years: Vec<i32>,
    pub year_details: Vec<MatchVerdict>,
    pub condition: ConditionMetadata,
    pub event_type: Option<String>,
    pub event_sensitivity: Vec<String>,
}

impl ProbabilityResult {
    fn empty(condition: ConditionMetadata, event_type: Option<&str>) -> Self {
        Self {
            probability: 0.0,
            years_total: 0,
            years_matching: 0,
            years_sampled: Vec::new(),
            matching_years: Vec::new(),
            year_details: Vec::new(),
            condition,
            event_type: event_type.map(str::to_string),
            event_sensitivity: conditions::event_sensitivity(event_type),
        }
    }

    pub fn has_data(&self) -> bool {
        self.years_total > 0
    }
}

/// `round(100 * matched / total, 2)` with ties to even, or 0 when nothing
/// was sampled.
pub fn percentage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = 100.0 * matched as f64 / total as f64;
    (pct * 100.0).round_ties_even() / 100.0
}

/// Estimate how often `condition_key` occurred on the target date.
///
/// Years are the union of years seen in any required variable, ascending.
/// When `target_day` is absent and a variable has several days in one year,
/// the latest day of that year is the one evaluated.
///
/// # Errors
/// `ExtremesError::UnknownCondition` for keys not in the registry. Missing data
/// never errors: no sampled years gives a zero result.
pub fn calculate_probability(
    series: &ClimateSeries,
    target_month: u32,
    target_day: Option<u32>,
    condition_key: &str,
    event_type: Option<&str>,
) -> Result<ProbabilityResult, ExtremesError> {
    let cfg = conditions::condition(condition_key)?;

    let mut by_variable: BTreeMap<ClimateVariable, BTreeMap<i32, f64>> = BTreeMap::new();
    let mut years = BTreeSet::new();

    for var in cfg.variables {
        let filtered = series
            .get(*var)
            .map(|s| filter_by_date(s, target_month, target_day))
            .unwrap_or_default();
        years.extend(filtered.iter().map(|(year, _)| *year));
        by_variable.insert(*var, filtered.into_iter().collect());
    }

    if years.is_empty() {
        tracing::debug!(
            condition = condition_key,
            month = target_month,
            "No historical observations for target date"
        );
        return Ok(ProbabilityResult::empty(cfg.metadata(), event_type));
    }

    let year_details: Vec<MatchVerdict> = years
        .iter()
        .map(|&year| {
            let values = cfg.variables.iter().fold(YearObservation::new(), |obs, var| {
                let value = by_variable.get(var).and_then(|vals| vals.get(&year)).copied();
                obs.with(*var, value)
            });
            let matched = evaluate(cfg, &values);
            MatchVerdict {
                year,
                values,
                matched,
            }
        })
        .collect();

    let matching_years: Vec<i32> = year_details
        .iter()
        .filter(|v| v.matched)
        .map(|v| v.year)
        .collect();
    let years_total = year_details.len();
    let years_matching = matching_years.len();

    Ok(ProbabilityResult {
        probability: percentage(years_matching, years_total),
        years_total,
        years_matching,
        years_sampled: years.into_iter().collect(),
        matching_years,
        year_details,
        condition: cfg.metadata(),
        event_type: event_type.map(str::to_string),
        event_sensitivity: conditions::event_sensitivity(event_type),
    })
}
