//! Static catalog of compound-extreme conditions and event-type profiles.

use crate::error::ExtremesError;
use crate::variable::ClimateVariable::{self, *};
use serde::Serialize;
use std::collections::BTreeMap;

/// How the per-variable threshold checks combine into one verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombinationPolicy {
    /// Every variable must exceed its threshold; missing data fails the check.
    All,
    /// At least `n` variables must exceed their thresholds; missing data fails the check.
    AtLeast(usize),
    /// One exceeding variable is enough; missing data is not counted.
    Any,
    /// Weighted discomfort score over threshold crossings must exceed `cutoff`.
    Composite {
        weights: &'static [(ClimateVariable, f64)],
        cutoff: f64,
    },
}

impl CombinationPolicy {
    /// Wire name of the policy, as listed in the catalog.
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "and",
            Self::AtLeast(2) => "at_least_2",
            Self::AtLeast(_) => "at_least_n",
            Self::Any => "single",
            Self::Composite { .. } => "composite",
        }
    }

    pub fn weight(&self, variable: ClimateVariable) -> Option<f64> {
        match self {
            Self::Composite { weights, .. } => weights
                .iter()
                .find(|(v, _)| *v == variable)
                .map(|(_, w)| *w),
            _ => None,
        }
    }
}

/// A named compound extreme.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionDefinition {
    pub key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Variables in evaluation order
    pub variables: &'static [ClimateVariable],
    pub thresholds: &'static [(ClimateVariable, f64)],
    pub policy: CombinationPolicy,
}

impl ConditionDefinition {
    pub fn threshold(&self, variable: ClimateVariable) -> Option<f64> {
        self.thresholds
            .iter()
            .find(|(v, _)| *v == variable)
            .map(|(_, t)| *t)
    }

    /// Owned, serializable echo of this definition.
    pub fn metadata(&self) -> ConditionMetadata {
        ConditionMetadata {
            key: self.key.to_string(),
            display_name: self.display_name.to_string(),
            description: self.description.to_string(),
            variables: self.variables.to_vec(),
            thresholds: self.thresholds.iter().copied().collect(),
            logic: self.policy.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionMetadata {
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub variables: Vec<ClimateVariable>,
    pub thresholds: BTreeMap<ClimateVariable, f64>,
    pub logic: String,
}

/// Conditions an event type is sensitive to. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventTypeProfile {
    pub key: &'static str,
    pub sensitive_to: &'static [&'static str],
    pub description: &'static str,
}

const OUTDOOR_SENSITIVITY: &[&str] = &["very_hot", "very_cold", "very_wet", "very_windy"];

pub static CONDITIONS: &[ConditionDefinition] = &[
    ConditionDefinition {
        key: "very_hot",
        display_name: "Very Hot",
        description: "High temperature with humidity",
        variables: &[Temperature, RelativeHumidity, TemperatureMin],
        thresholds: &[
            (Temperature, 32.0),
            (RelativeHumidity, 70.0),
            (TemperatureMin, 22.0),
        ],
        policy: CombinationPolicy::All,
    },
    ConditionDefinition {
        key: "very_cold",
        display_name: "Very Cold",
        description: "Low temperature with wind chill effects",
        variables: &[TemperatureMin, WindSpeed, Temperature],
        thresholds: &[(TemperatureMin, 5.0), (WindSpeed, 5.0), (Temperature, 7.0)],
        policy: CombinationPolicy::AtLeast(2),
    },
    ConditionDefinition {
        key: "very_wet",
        display_name: "Very Wet",
        description: "Heavy precipitation",
        variables: &[Precipitation],
        thresholds: &[(Precipitation, 20.0)],
        policy: CombinationPolicy::Any,
    },
    ConditionDefinition {
        key: "very_windy",
        display_name: "Very Windy",
        description: "High wind speed",
        variables: &[WindSpeed],
        thresholds: &[(WindSpeed, 10.0)],
        policy: CombinationPolicy::Any,
    },
    ConditionDefinition {
        key: "very_uncomfortable",
        display_name: "Very Uncomfortable",
        description: "Heat + humidity + low breeze discomfort",
        variables: &[Temperature, RelativeHumidity, WindSpeed, Precipitation],
        thresholds: &[
            (Temperature, 30.0),
            (RelativeHumidity, 65.0),
            (WindSpeed, 3.0),
            (Precipitation, 1.0),
        ],
        policy: CombinationPolicy::Composite {
            weights: &[
                (Temperature, 0.3),
                (RelativeHumidity, 0.3),
                (WindSpeed, 0.2),
                (Precipitation, 0.2),
            ],
            cutoff: 0.5,
        },
    },
];

pub static EVENT_TYPES: &[EventTypeProfile] = &[
    EventTypeProfile {
        key: "funeral",
        sensitive_to: OUTDOOR_SENSITIVITY,
        description: "Outdoor ceremonies sensitive to extreme weather",
    },
    EventTypeProfile {
        key: "wedding",
        sensitive_to: OUTDOOR_SENSITIVITY,
        description: "Outdoor ceremonies and photos sensitive to weather",
    },
    EventTypeProfile {
        key: "hiking",
        sensitive_to: OUTDOOR_SENSITIVITY,
        description: "Outdoor activity highly dependent on weather conditions",
    },
    EventTypeProfile {
        key: "picnic",
        sensitive_to: OUTDOOR_SENSITIVITY,
        description: "Outdoor gathering sensitive to weather",
    },
    EventTypeProfile {
        key: "sports_event",
        sensitive_to: OUTDOOR_SENSITIVITY,
        description: "Outdoor sports events affected by weather",
    },
    EventTypeProfile {
        key: "festival",
        sensitive_to: OUTDOOR_SENSITIVITY,
        description: "Outdoor festivals sensitive to weather conditions",
    },
];

/// Look up a condition by key.
pub fn condition(key: &str) -> Result<&'static ConditionDefinition, ExtremesError> {
    CONDITIONS
        .iter()
        .find(|c| c.key == key)
        .ok_or_else(|| ExtremesError::UnknownCondition(key.to_string()))
}

pub fn event_type(key: &str) -> Option<&'static EventTypeProfile> {
    EVENT_TYPES.iter().find(|e| e.key == key)
}

/// Sensitivity list for an event type; empty for unknown or absent types.
pub fn event_sensitivity(key: Option<&str>) -> Vec<String> {
    key.and_then(event_type)
        .map(|profile| profile.sensitive_to.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

pub fn condition_keys() -> impl Iterator<Item = &'static str> {
    CONDITIONS.iter().map(|c| c.key)
}

/// Everything a client needs to offer the available choices.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub weather_conditions: BTreeMap<String, ConditionMetadata>,
    pub event_types: BTreeMap<String, EventTypeProfile>,
}

pub fn catalog() -> Catalog {
    Catalog {
        weather_conditions: CONDITIONS
            .iter()
            .map(|c| (c.key.to_string(), c.metadata()))
            .collect(),
        event_types: EVENT_TYPES
            .iter()
            .map(|e| (e.key.to_string(), e.clone()))
            .collect(),
    }
}
