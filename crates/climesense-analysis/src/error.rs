//! Errors raised by queries, event analysis and sweeps.

use climesense_core::{AppError, ClimateError, ConfigError, NetworkError};
use climesense_extremes::ExtremesError;
use climesense_sources::{FetchError, GeocodeError, ProviderError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    UnknownCondition(#[from] ExtremesError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Location \"{0}\" not found")]
    LocationNotFound(String),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No conditions specified and event has no weather sensitivity set")]
    NoConditions,

    /// Provider could not be constructed (TLS backend, bad settings)
    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

impl AnalysisError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

/// One sweep grid point that could not be analyzed.
///
/// Counted and logged by the sweep; never returned to its caller.
#[derive(Debug, Error)]
#[error("Failed to analyze point ({latitude}, {longitude}): {source}")]
pub struct PointEvaluationError {
    pub latitude: f64,
    pub longitude: f64,
    #[source]
    pub source: AnalysisError,
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::UnknownCondition(ExtremesError::UnknownCondition(key)) => {
                AppError::Climate(ClimateError::UnknownCondition(key))
            }
            AnalysisError::InvalidRequest(msg) => {
                AppError::Climate(ClimateError::InvalidRequest(msg))
            }
            e @ AnalysisError::NoConditions => {
                AppError::Climate(ClimateError::InvalidRequest(e.to_string()))
            }
            AnalysisError::LocationNotFound(place) => {
                AppError::Climate(ClimateError::LocationNotFound(place))
            }
            AnalysisError::Geocode(GeocodeError::Request(e)) => {
                AppError::Network(NetworkError::from(e))
            }
            AnalysisError::Geocode(e) => AppError::Climate(ClimateError::Geocoding(e.to_string())),
            AnalysisError::Fetch(e) => AppError::Climate(ClimateError::SourcesExhausted(e.to_string())),
            AnalysisError::Provider(e) => AppError::Config(ConfigError::Invalid(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_condition_maps_to_climate_error() {
        let err: AppError = AnalysisError::from(ExtremesError::UnknownCondition("very_dry".into())).into();
        assert!(matches!(err, AppError::Climate(ClimateError::UnknownCondition(_))));
        assert!(err.user_message().contains("Unknown weather condition"));
    }

    #[test]
    fn test_location_not_found_message() {
        let err = AnalysisError::LocationNotFound("Atlantis".into());
        assert_eq!(err.to_string(), "Location \"Atlantis\" not found");
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Climate(ClimateError::LocationNotFound(ref p)) if p == "Atlantis"));
    }

    #[test]
    fn test_point_error_display() {
        let err = PointEvaluationError {
            latitude: 5.5,
            longitude: -0.5,
            source: AnalysisError::invalid("latitude out of range"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to analyze point (5.5, -0.5): Invalid request: latitude out of range"
        );
    }
}
