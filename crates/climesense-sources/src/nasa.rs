//! NASA POWER daily point API (primary source).
//! Free, no API key required.

use crate::error::ProviderError;
use crate::provider::{check_status, http_client, ClimateProvider, FetchRequest};
use chrono::{Datelike, Utc};
use climesense_extremes::{ClimateSeries, ClimateVariable};
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::instrument;

pub const POWER_ENDPOINT: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";

/// POWER marks missing observations with this value.
const POWER_FILL_VALUE: f64 = -999.0;

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: Option<PowerProperties>,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    #[serde(default)]
    parameter: HashMap<String, BTreeMap<String, Option<f64>>>,
}

#[derive(Debug, Clone)]
pub struct NasaPowerProvider {
    client: Client,
    base_url: String,
}

impl NasaPowerProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(POWER_ENDPOINT, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn request(&self, request: &FetchRequest) -> Result<PowerResponse, ProviderError> {
        let parameters = request
            .variables
            .iter()
            .map(ClimateVariable::code)
            .collect::<Vec<_>>()
            .join(",");

        let query = [
            ("latitude", request.latitude.to_string()),
            ("longitude", request.longitude.to_string()),
            ("start", format!("{}0101", request.start_year)),
            ("end", format!("{}1231", request.end_year)),
            ("community", "RE".to_string()),
            ("parameters", parameters),
            ("format", "JSON".to_string()),
        ];

        tracing::debug!("NASA POWER request {} {:?}", self.base_url, query);

        let response = self.client.get(&self.base_url).query(&query).send().await?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ProviderError::Payload(format!("NASA POWER JSON parse error: {}", e)))
    }
}

/// `properties.parameter.{CODE}.{YYYYMMDD}` into the canonical series.
///
/// Unknown parameters are dropped; nulls and fill values become absent dates.
fn normalize(response: PowerResponse, requested: &[ClimateVariable]) -> ClimateSeries {
    let mut series = ClimateSeries::new();
    let Some(properties) = response.properties else {
        return series;
    };

    for (code, days) in properties.parameter {
        let Some(variable) = ClimateVariable::from_code(&code) else {
            tracing::debug!("Dropping unmapped NASA POWER parameter {}", code);
            continue;
        };
        if !requested.contains(&variable) {
            continue;
        }
        series.ensure_variable(variable);
        for (date_key, value) in days {
            if let Some(v) = value.filter(|v| *v > POWER_FILL_VALUE) {
                series.insert(variable, date_key, v);
            }
        }
    }

    series
}

impl ClimateProvider for NasaPowerProvider {
    fn id(&self) -> &'static str {
        "nasa"
    }

    fn label(&self) -> &'static str {
        "NASA POWER"
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, request: &FetchRequest) -> Result<ClimateSeries, ProviderError> {
        let body = self.request(request).await?;
        Ok(normalize(body, &request.variables))
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        // New York City, last complete year
        let request = FetchRequest {
            variables: vec![ClimateVariable::Temperature],
            ..FetchRequest::for_history(40.7128, -74.0060, 1, Utc::now().year())
        };
        let series = self.fetch(&request).await?;
        if series.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(())
    }
}
