//! Single-location probability queries.

use crate::error::AnalysisError;
use chrono::Utc;
use climesense_core::Config;
use climesense_extremes::{calculate_probability, condition, ProbabilityResult};
use climesense_sources::{
    ClimateProvider, FallbackFetcher, GeocodedPlace, Geocoder, MeteomaticsCredentials,
    MeteomaticsProvider, NasaPowerProvider, NominatimGeocoder, SourcedSeries,
};
use serde::Serialize;
use std::time::Duration;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// `1..=12` or a full English month name, case-insensitive.
pub fn parse_month(input: &str) -> Result<u32, AnalysisError> {
    let input = input.trim();
    let month = match input.parse::<u32>() {
        Ok(m) => m,
        Err(_) => MONTH_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(input))
            .map(|i| i as u32 + 1)
            .ok_or_else(|| {
                AnalysisError::invalid(
                    "Invalid month format. Use 1-12 or month name like \"January\"",
                )
            })?,
    };
    validate_month(month)?;
    Ok(month)
}

pub(crate) fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("Unknown")
}

pub fn validate_month(month: u32) -> Result<(), AnalysisError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(AnalysisError::invalid("Month must be between 1 and 12"))
    }
}

pub fn validate_day(day: Option<u32>) -> Result<(), AnalysisError> {
    match day {
        Some(d) if !(1..=31).contains(&d) => {
            Err(AnalysisError::invalid("day must be between 1 and 31"))
        }
        _ => Ok(()),
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), AnalysisError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AnalysisError::invalid(format!(
            "latitude {} outside [-90, 90]",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AnalysisError::invalid(format!(
            "longitude {} outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}

/// "MM/DD", or "MM" for month-level queries.
pub fn target_date_label(month: u32, day: Option<u32>) -> String {
    match day {
        Some(d) => format!("{:02}/{:02}", month, d),
        None => format!("{:02}", month),
    }
}

/// Provenance attached to every wrapped result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    /// Upper-case source tag (`NASA`, `METEOMATICS`)
    pub data_source: String,
    pub analysis_period: String,
    pub target_date: String,
    /// UTC, RFC 3339
    pub timestamp: String,
    pub fallback_used: bool,
}

impl AnalysisMetadata {
    pub(crate) fn new(
        sourced: &SourcedSeries,
        years_back: u32,
        month: u32,
        day: Option<u32>,
    ) -> Self {
        Self {
            data_source: sourced.source.to_uppercase(),
            analysis_period: format!("{} years", years_back),
            target_date: target_date_label(month, day),
            timestamp: Utc::now().to_rfc3339(),
            fallback_used: sourced.fallback_used,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationInfo {
    /// Place name as the caller typed it
    pub name: String,
    pub coordinates: Coordinates,
    pub display_name: Option<String>,
}

impl LocationInfo {
    fn from_place(name: &str, place: &GeocodedPlace) -> Self {
        Self {
            name: name.to_string(),
            coordinates: Coordinates {
                lat: place.lat,
                lon: place.lon,
            },
            display_name: place.display_name.clone(),
        }
    }
}

/// A probability result wrapped with location and provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointAnalysis {
    #[serde(flatten)]
    pub result: ProbabilityResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationInfo>,
    pub analysis_metadata: AnalysisMetadata,
}

/// Sweep behavior taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSettings {
    pub max_concurrency: usize,
    /// Reverse geocode each grid point for a readable label
    pub label_points: bool,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            label_points: true,
        }
    }
}

/// Runs queries against a primary/secondary provider pair and a geocoder.
pub struct Analyzer<P, S, G> {
    pub(crate) fetcher: FallbackFetcher<P, S>,
    pub(crate) geocoder: G,
    pub(crate) years_back: u32,
    pub(crate) sweep: SweepSettings,
}

pub type DefaultAnalyzer = Analyzer<NasaPowerProvider, MeteomaticsProvider, NominatimGeocoder>;

impl DefaultAnalyzer {
    /// NASA POWER primary, Meteomatics fallback, Nominatim geocoding.
    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        let sources = &config.sources;
        let timeout = Duration::from_secs(sources.request_timeout_secs);

        let primary = NasaPowerProvider::with_base_url(&sources.nasa_power_url, timeout)?;
        let credentials = sources
            .meteomatics_credentials()
            .map(|(user, pass)| MeteomaticsCredentials::new(user, pass));
        let secondary =
            MeteomaticsProvider::with_base_url(&sources.meteomatics_url, credentials, timeout)?;

        let geocoding = &config.geocoding;
        let geocoder = NominatimGeocoder::with_base_url(
            &geocoding.nominatim_url,
            &geocoding.user_agent,
            Duration::from_secs(geocoding.timeout_secs),
        )?;

        Ok(Analyzer::new(
            FallbackFetcher::new(primary, secondary),
            geocoder,
            config.analysis.years_back,
        )
        .with_sweep_settings(SweepSettings {
            max_concurrency: config.sweep.max_concurrency,
            label_points: config.sweep.label_points,
        }))
    }
}

impl<P, S, G> Analyzer<P, S, G>
where
    P: ClimateProvider,
    S: ClimateProvider,
    G: Geocoder,
{
    /// `years_back` below one is raised to one.
    pub fn new(fetcher: FallbackFetcher<P, S>, geocoder: G, years_back: u32) -> Self {
        Self {
            fetcher,
            geocoder,
            years_back: years_back.max(1),
            sweep: SweepSettings::default(),
        }
    }

    pub fn with_sweep_settings(mut self, settings: SweepSettings) -> Self {
        self.sweep = settings;
        self
    }

    pub fn fetcher(&self) -> &FallbackFetcher<P, S> {
        &self.fetcher
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn years_back(&self) -> u32 {
        self.years_back
    }

    /// Probability of `condition_key` on the target date at a coordinate.
    ///
    /// The condition is checked before any fetch; an unknown key never
    /// reaches the providers.
    pub async fn analyze_point(
        &self,
        latitude: f64,
        longitude: f64,
        month: u32,
        day: Option<u32>,
        condition_key: &str,
        event_type: Option<&str>,
    ) -> Result<PointAnalysis, AnalysisError> {
        condition(condition_key)?;
        validate_coordinates(latitude, longitude)?;
        validate_month(month)?;
        validate_day(day)?;

        let sourced = self
            .fetcher
            .fetch_with_fallback(latitude, longitude, month, day, self.years_back)
            .await?;
        let result = calculate_probability(&sourced.series, month, day, condition_key, event_type)?;

        tracing::info!(
            condition = condition_key,
            probability = result.probability,
            years = result.years_total,
            source = sourced.source,
            "Point analysis complete"
        );

        Ok(PointAnalysis {
            result,
            location: None,
            analysis_metadata: AnalysisMetadata::new(&sourced, self.years_back, month, day),
        })
    }

    /// Geocode `place` and analyze the first match.
    pub async fn analyze_place(
        &self,
        place: &str,
        month: u32,
        day: Option<u32>,
        condition_key: &str,
        event_type: Option<&str>,
    ) -> Result<PointAnalysis, AnalysisError> {
        condition(condition_key)?;
        let found = self.locate(place).await?;

        let mut analysis = self
            .analyze_point(found.lat, found.lon, month, day, condition_key, event_type)
            .await?;
        analysis.location = Some(LocationInfo::from_place(place, &found));
        Ok(analysis)
    }

    pub(crate) async fn locate(&self, place: &str) -> Result<GeocodedPlace, AnalysisError> {
        self.geocoder
            .geocode(place)
            .await?
            .ok_or_else(|| AnalysisError::LocationNotFound(place.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climesense_extremes::{ClimateSeries, ClimateVariable};
    use climesense_sources::{FetchRequest, GeocodeError, ProviderError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Heavy rain on 15 June every other year since 2000.
    struct RainyProvider {
        calls: AtomicUsize,
    }

    impl ClimateProvider for RainyProvider {
        fn id(&self) -> &'static str {
            "nasa"
        }

        fn label(&self) -> &'static str {
            "NASA POWER"
        }

        async fn fetch(&self, request: &FetchRequest) -> Result<ClimateSeries, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut series = ClimateSeries::new();
            for year in request.start_year..=request.end_year {
                let mm = if year % 2 == 0 { 30.0 } else { 2.0 };
                series.insert(ClimateVariable::Precipitation, format!("{}0615", year), mm);
            }
            Ok(series)
        }

        async fn probe(&self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    struct Unconfigured;

    impl ClimateProvider for Unconfigured {
        fn id(&self) -> &'static str {
            "meteomatics"
        }

        fn label(&self) -> &'static str {
            "Meteomatics"
        }

        fn is_configured(&self) -> bool {
            false
        }

        async fn fetch(&self, _request: &FetchRequest) -> Result<ClimateSeries, ProviderError> {
            Err(ProviderError::Empty)
        }

        async fn probe(&self) -> Result<(), ProviderError> {
            Err(ProviderError::Empty)
        }
    }

    struct Gazetteer;

    impl Geocoder for Gazetteer {
        async fn geocode(&self, place: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
            Ok((place == "Accra").then(|| GeocodedPlace {
                lat: 5.556,
                lon: -0.1969,
                display_name: Some("Accra, Greater Accra Region, Ghana".into()),
            }))
        }

        async fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Option<String> {
            None
        }
    }

    fn analyzer() -> Analyzer<RainyProvider, Unconfigured, Gazetteer> {
        Analyzer::new(
            FallbackFetcher::new(
                RainyProvider {
                    calls: AtomicUsize::new(0),
                },
                Unconfigured,
            ),
            Gazetteer,
            20,
        )
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("6").unwrap(), 6);
        assert_eq!(parse_month("June").unwrap(), 6);
        assert_eq!(parse_month("december").unwrap(), 12);
        assert!(parse_month("13").is_err());
        assert!(parse_month("0").is_err());
        assert!(parse_month("Juno").is_err());
    }

    #[test]
    fn test_validation_bounds() {
        assert!(validate_coordinates(90.0, -180.0).is_ok());
        assert!(validate_coordinates(90.5, 0.0).is_err());
        assert!(validate_coordinates(0.0, 181.0).is_err());
        assert!(validate_day(None).is_ok());
        assert!(validate_day(Some(31)).is_ok());
        assert!(validate_day(Some(32)).is_err());
    }

    #[test]
    fn test_target_date_label() {
        assert_eq!(target_date_label(6, Some(5)), "06/05");
        assert_eq!(target_date_label(11, None), "11");
    }

    #[tokio::test]
    async fn test_analyze_point_wraps_metadata() {
        let analyzer = analyzer();
        let analysis = analyzer
            .analyze_point(5.556, -0.1969, 6, Some(15), "very_wet", Some("wedding"))
            .await
            .unwrap();

        assert_eq!(analysis.result.years_total, 20);
        assert_eq!(analysis.result.years_matching, 10);
        assert_eq!(analysis.result.probability, 50.0);
        assert_eq!(analysis.analysis_metadata.data_source, "NASA");
        assert_eq!(analysis.analysis_metadata.analysis_period, "20 years");
        assert_eq!(analysis.analysis_metadata.target_date, "06/15");
        assert!(!analysis.analysis_metadata.fallback_used);

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["probability"], serde_json::json!(50.0));
        assert!(json.get("location").is_none());
    }

    #[tokio::test]
    async fn test_zero_years_back_fetches_one_year() {
        let analyzer = Analyzer::new(
            FallbackFetcher::new(
                RainyProvider {
                    calls: AtomicUsize::new(0),
                },
                Unconfigured,
            ),
            Gazetteer,
            0,
        );
        assert_eq!(analyzer.years_back(), 1);

        let analysis = analyzer
            .analyze_point(5.556, -0.1969, 6, Some(15), "very_wet", None)
            .await
            .unwrap();
        assert_eq!(analysis.result.years_total, 1);
        assert_eq!(analysis.analysis_metadata.analysis_period, "1 years");
    }

    #[tokio::test]
    async fn test_unknown_condition_skips_fetch() {
        let analyzer = analyzer();
        let err = analyzer
            .analyze_point(5.556, -0.1969, 6, Some(15), "very_dry", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownCondition(_)));
        assert_eq!(analyzer.fetcher().primary().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_place_attaches_location() {
        let analysis = analyzer()
            .analyze_place("Accra", 6, Some(15), "very_wet", None)
            .await
            .unwrap();
        let location = analysis.location.unwrap();
        assert_eq!(location.name, "Accra");
        assert_eq!(location.coordinates.lat, 5.556);
    }

    #[tokio::test]
    async fn test_analyze_place_not_found() {
        let err = analyzer()
            .analyze_place("Atlantis", 6, Some(15), "very_wet", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::LocationNotFound(ref p) if p == "Atlantis"));
    }

    #[tokio::test]
    async fn test_invalid_day_is_rejected() {
        let err = analyzer()
            .analyze_point(5.0, 0.0, 2, Some(40), "very_wet", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRequest(_)));
    }
}
