//! Source availability and connectivity checks.

use crate::error::ProviderError;
use crate::fallback::FallbackFetcher;
use crate::provider::ClimateProvider;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceAvailability {
    pub available: bool,
    pub message: String,
}

/// Static view of which sources can be used, without touching the network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub sources: BTreeMap<&'static str, SourceAvailability>,
    pub primary: &'static str,
    pub fallback: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub status: ProbeStatus,
    pub message: String,
}

impl ProbeResult {
    fn is_success(&self) -> bool {
        self.status == ProbeStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

impl OverallHealth {
    /// Healthy follows the primary alone. Degraded means only the fallback works.
    pub fn from_probes(primary_ok: bool, secondary_ok: bool) -> Self {
        match (primary_ok, secondary_ok) {
            (true, _) => OverallHealth::Healthy,
            (false, true) => OverallHealth::Degraded,
            (false, false) => OverallHealth::Unhealthy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub overall_status: OverallHealth,
    pub test_results: BTreeMap<&'static str, ProbeResult>,
    pub recommendations: Vec<String>,
}

pub fn recommendations(
    primary_label: &str,
    secondary_label: &str,
    primary_ok: bool,
    secondary_ok: bool,
) -> Vec<String> {
    match (primary_ok, secondary_ok) {
        (true, true) => vec!["All weather data sources are working properly".to_string()],
        (true, false) => vec![
            format!("Primary {} API is working", primary_label),
            format!("Configure {} credentials for redundancy", secondary_label),
        ],
        (false, true) => vec![
            format!("{} API is down, using {} fallback", primary_label, secondary_label),
            format!("Check {} API status", primary_label),
        ],
        (false, false) => vec![
            "Both weather APIs are unavailable".to_string(),
            "Check internet connectivity and API credentials".to_string(),
            "Weather analysis may not work until APIs are restored".to_string(),
        ],
    }
}

fn probe_primary(label: &str, outcome: Result<(), ProviderError>) -> ProbeResult {
    match outcome {
        Ok(()) => ProbeResult {
            status: ProbeStatus::Success,
            message: format!("{} API is working", label),
        },
        Err(ProviderError::Empty) => ProbeResult {
            status: ProbeStatus::Warning,
            message: format!("{} returned empty data", label),
        },
        Err(e) => ProbeResult {
            status: ProbeStatus::Error,
            message: format!("{} failed: {}", label, e),
        },
    }
}

fn probe_secondary(label: &str, outcome: Result<(), ProviderError>) -> ProbeResult {
    match outcome {
        Ok(()) => ProbeResult {
            status: ProbeStatus::Success,
            message: format!("{} API connection successful", label),
        },
        Err(e) => ProbeResult {
            status: ProbeStatus::Error,
            message: format!("{} API connection failed: {}", label, e),
        },
    }
}

impl<P, S> FallbackFetcher<P, S>
where
    P: ClimateProvider,
    S: ClimateProvider,
{
    pub fn source_status(&self) -> SourceStatus {
        let primary = self.primary();
        let secondary = self.secondary();

        let mut sources = BTreeMap::new();
        sources.insert(
            primary.id(),
            SourceAvailability {
                available: primary.is_configured(),
                message: format!("{} API (Primary)", primary.label()),
            },
        );

        let fallback_ready = secondary.is_configured();
        sources.insert(
            secondary.id(),
            SourceAvailability {
                available: fallback_ready,
                message: if fallback_ready {
                    format!("{} API (Fallback)", secondary.label())
                } else {
                    "Credentials not configured".to_string()
                },
            },
        );

        SourceStatus {
            sources,
            primary: primary.id(),
            fallback: fallback_ready.then(|| secondary.id()),
        }
    }

    /// Probe both sources concurrently and summarize.
    pub async fn test_sources(&self) -> HealthReport {
        let primary = self.primary();
        let secondary = self.secondary();

        let secondary_probe = async {
            if !secondary.is_configured() {
                return ProbeResult {
                    status: ProbeStatus::Error,
                    message: format!("{} credentials not configured", secondary.label()),
                };
            }
            probe_secondary(secondary.label(), secondary.probe().await)
        };
        let (primary_result, secondary_result) = tokio::join!(
            async { probe_primary(primary.label(), primary.probe().await) },
            secondary_probe
        );

        let primary_ok = primary_result.is_success();
        let secondary_ok = secondary_result.is_success();
        tracing::info!(
            primary = primary_ok,
            fallback = secondary_ok,
            "Weather source connectivity test finished"
        );

        let mut test_results = BTreeMap::new();
        test_results.insert(primary.id(), primary_result);
        test_results.insert(secondary.id(), secondary_result);

        HealthReport {
            overall_status: OverallHealth::from_probes(primary_ok, secondary_ok),
            test_results,
            recommendations: recommendations(
                primary.label(),
                secondary.label(),
                primary_ok,
                secondary_ok,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_status() {
        assert_eq!(OverallHealth::from_probes(true, false), OverallHealth::Healthy);
        assert_eq!(OverallHealth::from_probes(true, true), OverallHealth::Healthy);
        assert_eq!(OverallHealth::from_probes(false, true), OverallHealth::Degraded);
        assert_eq!(OverallHealth::from_probes(false, false), OverallHealth::Unhealthy);
    }

    #[test]
    fn test_recommendations_per_combination() {
        assert_eq!(recommendations("NASA POWER", "Meteomatics", true, true).len(), 1);
        assert_eq!(
            recommendations("NASA POWER", "Meteomatics", true, false),
            vec![
                "Primary NASA POWER API is working",
                "Configure Meteomatics credentials for redundancy"
            ]
        );
        assert_eq!(
            recommendations("NASA POWER", "Meteomatics", false, true)[0],
            "NASA POWER API is down, using Meteomatics fallback"
        );
        assert_eq!(recommendations("NASA POWER", "Meteomatics", false, false).len(), 3);
    }

    #[test]
    fn test_empty_primary_probe_is_warning() {
        let result = probe_primary("NASA POWER", Err(ProviderError::Empty));
        assert_eq!(result.status, ProbeStatus::Warning);
        assert_eq!(result.message, "NASA POWER returned empty data");
        assert_eq!(
            serde_json::to_value(&result).unwrap()["status"],
            serde_json::json!("warning")
        );
    }
}
