//! Human-facing risk bands and downloadable analysis summaries.

use crate::query::{AnalysisMetadata, Coordinates, PointAnalysis};
use chrono::{DateTime, Utc};
use climesense_extremes::ClimateVariable;
use serde::Serialize;

/// Risk band for a probability percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "Very High")]
    VeryHigh,
    High,
    Moderate,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        match probability {
            p if p >= 80.0 => Self::VeryHigh,
            p if p >= 60.0 => Self::High,
            p if p >= 40.0 => Self::Moderate,
            p if p >= 20.0 => Self::Low,
            _ => Self::VeryLow,
        }
    }
}

/// Coarser band used when describing an event's exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventRisk {
    High,
    Moderate,
    LowModerate,
    Low,
}

impl EventRisk {
    pub fn from_probability(probability: f64) -> Self {
        match probability {
            p if p > 75.0 => Self::High,
            p if p > 50.0 => Self::Moderate,
            p if p > 25.0 => Self::LowModerate,
            _ => Self::Low,
        }
    }
}

/// How much history backs a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    High,
    Moderate,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl ConfidenceLevel {
    pub fn from_years(years_analyzed: usize) -> Self {
        match years_analyzed {
            y if y >= 25 => Self::High,
            y if y >= 15 => Self::Moderate,
            y if y >= 10 => Self::Low,
            _ => Self::VeryLow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLocation {
    pub name: String,
    pub coordinates: Coordinates,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCondition {
    pub key: String,
    pub description: String,
    pub probability_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub variable: ClimateVariable,
    pub threshold: Option<f64>,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResults {
    pub total_years_analyzed: usize,
    pub matching_years_count: usize,
    pub probability_percentage: f64,
    pub risk_level: RiskLevel,
    pub matching_years: Vec<i32>,
    pub confidence_level: ConfidenceLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDetails {
    pub event_type: String,
    pub target_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub analysis_id: String,
    pub date_generated: String,
    pub location: SummaryLocation,
    pub weather_condition: SummaryCondition,
    pub variables_analyzed: Vec<VariableSummary>,
    pub analysis_results: SummaryResults,
    pub event_details: EventDetails,
    pub metadata: AnalysisMetadata,
}

impl AnalysisSummary {
    pub fn from_analysis(analysis: &PointAnalysis, generated_at: DateTime<Utc>) -> Self {
        let result = &analysis.result;
        let condition = &result.condition;

        let location = match &analysis.location {
            Some(loc) => SummaryLocation {
                name: loc.name.clone(),
                coordinates: loc.coordinates,
                display_name: loc.display_name.clone().unwrap_or_else(|| loc.name.clone()),
            },
            None => SummaryLocation {
                name: "Unknown".to_string(),
                coordinates: Coordinates { lat: 0.0, lon: 0.0 },
                display_name: "Unknown".to_string(),
            },
        };

        Self {
            analysis_id: format!("analysis_{}", generated_at.format("%Y%m%d_%H%M%S")),
            date_generated: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            location,
            weather_condition: SummaryCondition {
                key: condition.key.clone(),
                description: condition.description.clone(),
                probability_percent: result.probability,
            },
            variables_analyzed: condition
                .variables
                .iter()
                .map(|var| VariableSummary {
                    variable: *var,
                    threshold: condition.thresholds.get(var).copied(),
                    unit: var.unit(),
                })
                .collect(),
            analysis_results: SummaryResults {
                total_years_analyzed: result.years_total,
                matching_years_count: result.years_matching,
                probability_percentage: result.probability,
                risk_level: RiskLevel::from_probability(result.probability),
                matching_years: result.matching_years.clone(),
                confidence_level: ConfidenceLevel::from_years(result.years_total),
            },
            event_details: EventDetails {
                event_type: result
                    .event_type
                    .clone()
                    .unwrap_or_else(|| "Not specified".to_string()),
                target_date: analysis.analysis_metadata.target_date.clone(),
            },
            metadata: analysis.analysis_metadata.clone(),
        }
    }
}
