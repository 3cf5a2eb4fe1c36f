//! Meteomatics time-series API (fallback source).
//! Requires username/password credentials (HTTP basic auth).

use crate::error::ProviderError;
use crate::provider::{check_status, http_client, ClimateProvider, FetchRequest};
use chrono::DateTime;
use climesense_extremes::{ClimateSeries, ClimateVariable, DATE_KEY_FORMAT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

pub const METEOMATICS_BASE_URL: &str = "https://api.meteomatics.com";

/// Meteomatics marks invalid observations with this value.
const INVALID_VALUE: f64 = -999.0;

#[derive(Clone)]
pub struct MeteomaticsCredentials {
    pub username: String,
    pub password: String,
}

impl MeteomaticsCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for MeteomaticsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeteomaticsCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Meteomatics parameter for each canonical variable.
pub fn parameter_code(variable: ClimateVariable) -> &'static str {
    match variable {
        ClimateVariable::Temperature => "t_2m:C",
        ClimateVariable::TemperatureMin => "t_min_2m_24h:C",
        ClimateVariable::TemperatureMax => "t_max_2m_24h:C",
        ClimateVariable::RelativeHumidity => "relative_humidity_2m:p",
        ClimateVariable::Precipitation => "precip_24h:mm",
        ClimateVariable::WindSpeed => "wind_speed_10m:ms",
    }
}

fn variable_for(parameter: &str) -> Option<ClimateVariable> {
    ClimateVariable::ALL
        .into_iter()
        .find(|v| parameter_code(*v) == parameter)
}

#[derive(Debug, Deserialize)]
struct MeteomaticsResponse {
    #[serde(default)]
    data: Vec<Dataset>,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    parameter: String,
    #[serde(default)]
    coordinates: Vec<CoordinateSeries>,
}

#[derive(Debug, Deserialize)]
struct CoordinateSeries {
    #[serde(default)]
    dates: Vec<DatedValue>,
}

#[derive(Debug, Deserialize)]
struct DatedValue {
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct MeteomaticsProvider {
    client: Client,
    base_url: String,
    credentials: Option<MeteomaticsCredentials>,
}

impl MeteomaticsProvider {
    pub fn new(
        credentials: Option<MeteomaticsCredentials>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Self::with_base_url(METEOMATICS_BASE_URL, credentials, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        credentials: Option<MeteomaticsCredentials>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn credentials(&self) -> Result<&MeteomaticsCredentials, ProviderError> {
        self.credentials.as_ref().ok_or_else(|| {
            ProviderError::Config(
                "Meteomatics credentials not configured. Set METEOMATICS_USERNAME and \
                 METEOMATICS_PASSWORD or add them to the config file."
                    .to_string(),
            )
        })
    }

    /// `/{start}--{end}:P1D/{parameters}/{lat},{lon}/json`
    fn series_url(&self, request: &FetchRequest) -> Result<String, ProviderError> {
        let parameters = request
            .variables
            .iter()
            .map(|v| parameter_code(*v))
            .collect::<Vec<_>>();
        if parameters.is_empty() {
            return Err(ProviderError::Config(
                "No valid parameters mapped for Meteomatics API".to_string(),
            ));
        }

        Ok(format!(
            "{}/{}-01-01T00:00:00Z--{}-12-31T00:00:00Z:P1D/{}/{},{}/json",
            self.base_url,
            request.start_year,
            request.end_year,
            parameters.join(","),
            request.latitude,
            request.longitude
        ))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ProviderError> {
        let credentials = self.credentials()?;
        tracing::debug!("Meteomatics request {}", url);
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await?;
        check_status(response).await
    }
}

/// Meteomatics datasets re-keyed to `YYYYMMDD` per canonical variable.
fn normalize(response: MeteomaticsResponse, requested: &[ClimateVariable]) -> ClimateSeries {
    let mut series = ClimateSeries::new();
    for variable in requested {
        series.ensure_variable(*variable);
    }

    for dataset in response.data {
        let Some(variable) = variable_for(&dataset.parameter) else {
            tracing::debug!("Dropping unmapped Meteomatics parameter {}", dataset.parameter);
            continue;
        };

        for point in dataset.coordinates {
            for entry in point.dates {
                let Some(value) = entry.value.filter(|v| *v > INVALID_VALUE) else {
                    continue;
                };
                let Ok(timestamp) = DateTime::parse_from_rfc3339(&entry.date) else {
                    continue;
                };
                series.insert(variable, timestamp.format(DATE_KEY_FORMAT).to_string(), value);
            }
        }
    }

    series
}

impl ClimateProvider for MeteomaticsProvider {
    fn id(&self) -> &'static str {
        "meteomatics"
    }

    fn label(&self) -> &'static str {
        "Meteomatics"
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, request: &FetchRequest) -> Result<ClimateSeries, ProviderError> {
        let url = self.series_url(request)?;
        let response = self.get(&url).await?;
        let body: MeteomaticsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Payload(format!("Meteomatics JSON parse error: {}", e)))?;
        Ok(normalize(body, &request.variables))
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        let url = format!("{}/now/t_2m:C/40.7128,-74.0060/json", self.base_url);
        self.get(&url).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Option<MeteomaticsCredentials> {
        Some(MeteomaticsCredentials::new("user", "secret"))
    }

    #[test]
    fn test_parameter_mapping_is_reversible() {
        for var in ClimateVariable::ALL {
            assert_eq!(variable_for(parameter_code(var)), Some(var));
        }
        assert_eq!(variable_for("msl_pressure:hPa"), None);
    }

    #[test]
    fn test_normalize_rekeys_dates_and_drops_nulls() {
        let body: MeteomaticsResponse = serde_json::from_value(serde_json::json!({
            "version": "3.0",
            "status": "OK",
            "data": [
                {
                    "parameter": "t_2m:C",
                    "coordinates": [{"lat": 5.6, "lon": -0.2, "dates": [
                        {"date": "2020-06-15T00:00:00Z", "value": 27.9},
                        {"date": "2020-06-16T00:00:00Z", "value": null},
                        {"date": "2020-06-17T00:00:00Z", "value": -999}
                    ]}]
                },
                {
                    "parameter": "sunshine_duration_24h:h",
                    "coordinates": [{"dates": [{"date": "2020-06-15T00:00:00Z", "value": 6.0}]}]
                }
            ]
        }))
        .unwrap();

        let series = normalize(body, &ClimateVariable::ALL);
        let t2m = series.get(ClimateVariable::Temperature).unwrap();
        assert_eq!(t2m.len(), 1);
        assert_eq!(t2m.get("20200615"), Some(&27.9));
        assert_eq!(series.observation_count(), 1);
    }

    #[test]
    fn test_series_url_shape() {
        let provider =
            MeteomaticsProvider::with_base_url("https://example.test/", credentials(), Duration::from_secs(1))
                .unwrap();
        let request = FetchRequest {
            variables: vec![ClimateVariable::Temperature, ClimateVariable::WindSpeed],
            ..FetchRequest::new(5.6, -0.2, 2001, 2025)
        };
        assert_eq!(
            provider.series_url(&request).unwrap(),
            "https://example.test/2001-01-01T00:00:00Z--2025-12-31T00:00:00Z:P1D/t_2m:C,wind_speed_10m:ms/5.6,-0.2/json"
        );
    }

    #[tokio::test]
    async fn test_fetch_without_credentials_is_config_error() {
        let provider =
            MeteomaticsProvider::with_base_url("http://127.0.0.1:9", None, Duration::from_secs(1))
                .unwrap();
        assert!(!provider.is_configured());

        let err = provider
            .fetch(&FetchRequest::new(5.6, -0.2, 2001, 2025))
            .await
            .unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_fetch_uses_basic_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "parameter": "precip_24h:mm",
                    "coordinates": [{"dates": [
                        {"date": "2024-06-15T00:00:00Z", "value": 22.5}
                    ]}]
                }]
            })))
            .mount(&server)
            .await;

        let provider =
            MeteomaticsProvider::with_base_url(&server.uri(), credentials(), Duration::from_secs(5))
                .unwrap();
        let series = provider
            .fetch(&FetchRequest::new(5.6, -0.2, 2024, 2024))
            .await
            .unwrap();
        assert_eq!(
            series.get(ClimateVariable::Precipitation).unwrap().get("20240615"),
            Some(&22.5)
        );
    }

    #[tokio::test]
    async fn test_unauthorized_is_status_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/now/t_2m:C/40.7128,-74.0060/json"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let provider =
            MeteomaticsProvider::with_base_url(&server.uri(), credentials(), Duration::from_secs(5))
                .unwrap();
        let err = provider.probe().await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }
}
