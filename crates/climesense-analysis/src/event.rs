//! Multi-condition analysis for a planned outdoor event.

use crate::error::AnalysisError;
use crate::query::{month_name, validate_coordinates, validate_day, validate_month, Analyzer};
use crate::summary::EventRisk;
use climesense_extremes::{calculate_probability, condition, ProbabilityResult};
use climesense_sources::{ClimateProvider, Geocoder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub name: String,
    pub event_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub target_month: u32,
    #[serde(default)]
    pub target_day: Option<u32>,
    /// Condition keys this event cares about
    #[serde(default)]
    pub weather_sensitivity: Vec<String>,
}

impl EventSpec {
    /// "June 15", or "June" without a day.
    pub fn target_date_display(&self) -> String {
        let month = month_name(self.target_month);
        match self.target_day {
            Some(day) => format!("{} {}", month, day),
            None => month.to_string(),
        }
    }
}

/// One analyzed condition, condensed for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherContext {
    pub condition: String,
    pub description: String,
    pub probability: f64,
    pub risk_level: EventRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAnalysis {
    pub event: EventSpec,
    pub target_date: String,
    pub analysis_results: BTreeMap<String, ProbabilityResult>,
    pub weather_context: Vec<WeatherContext>,
    pub data_source: String,
    pub fallback_used: bool,
}

impl<P, S, G> Analyzer<P, S, G>
where
    P: ClimateProvider,
    S: ClimateProvider,
    G: Geocoder,
{
    /// Analyze every requested condition for the event from a single fetch.
    ///
    /// Falls back to the event's own sensitivity list when `conditions` is
    /// empty. Keys not in the registry are skipped.
    pub async fn analyze_event(
        &self,
        event: &EventSpec,
        conditions: &[String],
    ) -> Result<EventAnalysis, AnalysisError> {
        let requested = if conditions.is_empty() {
            &event.weather_sensitivity
        } else {
            conditions
        };
        if requested.is_empty() {
            return Err(AnalysisError::NoConditions);
        }

        validate_coordinates(event.latitude, event.longitude)?;
        validate_month(event.target_month)?;
        validate_day(event.target_day)?;

        let sourced = self
            .fetcher
            .fetch_with_fallback(
                event.latitude,
                event.longitude,
                event.target_month,
                event.target_day,
                self.years_back,
            )
            .await?;

        let mut analysis_results = BTreeMap::new();
        let mut weather_context = Vec::new();
        for key in requested {
            let Ok(cfg) = condition(key) else {
                tracing::debug!("Skipping unknown condition {} for event {}", key, event.name);
                continue;
            };
            let result = calculate_probability(
                &sourced.series,
                event.target_month,
                event.target_day,
                key,
                Some(&event.event_type),
            )?;
            weather_context.push(WeatherContext {
                condition: key.clone(),
                description: cfg.description.to_string(),
                probability: result.probability,
                risk_level: EventRisk::from_probability(result.probability),
            });
            analysis_results.insert(key.clone(), result);
        }

        tracing::info!(
            event = %event.name,
            conditions = analysis_results.len(),
            source = sourced.source,
            "Event analysis complete"
        );

        Ok(EventAnalysis {
            event: event.clone(),
            target_date: event.target_date_display(),
            analysis_results,
            weather_context,
            data_source: sourced.source.to_uppercase(),
            fallback_used: sourced.fallback_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SweepSettings;
    use climesense_extremes::{ClimateSeries, ClimateVariable};
    use climesense_sources::{
        FallbackFetcher, FetchRequest, GeocodeError, GeocodedPlace, ProviderError,
    };

    struct Down;

    impl ClimateProvider for Down {
        fn id(&self) -> &'static str {
            "nasa"
        }

        fn label(&self) -> &'static str {
            "NASA POWER"
        }

        async fn fetch(&self, _request: &FetchRequest) -> Result<ClimateSeries, ProviderError> {
            Err(ProviderError::Status {
                status: 503,
                body: "down".into(),
            })
        }

        async fn probe(&self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    /// Hot, humid, windy 4 July in every year.
    struct Summer;

    impl ClimateProvider for Summer {
        fn id(&self) -> &'static str {
            "meteomatics"
        }

        fn label(&self) -> &'static str {
            "Meteomatics"
        }

        async fn fetch(&self, request: &FetchRequest) -> Result<ClimateSeries, ProviderError> {
            let mut series = ClimateSeries::new();
            for year in request.start_year..=request.end_year {
                let key = format!("{}0704", year);
                series.insert(ClimateVariable::Temperature, key.clone(), 34.0);
                series.insert(ClimateVariable::RelativeHumidity, key.clone(), 75.0);
                series.insert(ClimateVariable::TemperatureMin, key.clone(), 24.0);
                series.insert(ClimateVariable::WindSpeed, key.clone(), 4.0);
                series.insert(ClimateVariable::Precipitation, key, 0.0);
            }
            Ok(series)
        }

        async fn probe(&self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    struct NoGeocoder;

    impl Geocoder for NoGeocoder {
        async fn geocode(&self, _place: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
            Ok(None)
        }

        async fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Option<String> {
            None
        }
    }

    fn picnic(sensitivity: &[&str]) -> EventSpec {
        EventSpec {
            name: "Family picnic".into(),
            event_type: "picnic".into(),
            description: None,
            location_name: "Central Park".into(),
            latitude: 40.78,
            longitude: -73.97,
            target_month: 7,
            target_day: Some(4),
            weather_sensitivity: sensitivity.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn analyzer() -> Analyzer<Down, Summer, NoGeocoder> {
        Analyzer::new(FallbackFetcher::new(Down, Summer), NoGeocoder, 10)
            .with_sweep_settings(SweepSettings::default())
    }

    #[test]
    fn test_target_date_display() {
        let mut event = picnic(&[]);
        assert_eq!(event.target_date_display(), "July 4");
        event.target_day = None;
        assert_eq!(event.target_date_display(), "July");
    }

    #[tokio::test]
    async fn test_event_uses_sensitivity_and_skips_unknown() {
        let event = picnic(&["very_hot", "very_windy", "very_dry"]);
        let analysis = analyzer().analyze_event(&event, &[]).await.unwrap();

        assert_eq!(analysis.analysis_results.len(), 2);
        assert_eq!(analysis.analysis_results["very_hot"].probability, 100.0);
        assert_eq!(analysis.analysis_results["very_windy"].probability, 0.0);
        assert_eq!(analysis.data_source, "METEOMATICS");
        assert!(analysis.fallback_used);
        assert_eq!(analysis.weather_context[0].risk_level, EventRisk::High);
        assert_eq!(analysis.target_date, "July 4");
    }

    #[tokio::test]
    async fn test_explicit_conditions_override_sensitivity() {
        let event = picnic(&["very_hot"]);
        let analysis = analyzer()
            .analyze_event(&event, &["very_wet".to_string()])
            .await
            .unwrap();
        assert_eq!(
            analysis.analysis_results.keys().collect::<Vec<_>>(),
            vec!["very_wet"]
        );
        assert_eq!(
            analysis.analysis_results["very_wet"].event_type.as_deref(),
            Some("picnic")
        );
    }

    #[tokio::test]
    async fn test_no_conditions_at_all() {
        let err = analyzer().analyze_event(&picnic(&[]), &[]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NoConditions));
    }
}
