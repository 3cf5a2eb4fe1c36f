use crate::error::ProviderError;
use climesense_extremes::{ClimateSeries, ClimateVariable};
use reqwest::{Client, Response};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const USER_AGENT: &str = "ClimeSense/0.1.0 (https://github.com/climesense)";

/// Location and year window to fetch daily history for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub start_year: i32,
    pub end_year: i32,
    pub variables: Vec<ClimateVariable>,
}

impl FetchRequest {
    /// All known variables over `start_year..=end_year`.
    pub fn new(latitude: f64, longitude: f64, start_year: i32, end_year: i32) -> Self {
        Self {
            latitude,
            longitude,
            start_year,
            end_year,
            variables: ClimateVariable::ALL.to_vec(),
        }
    }

    /// The `years_back` complete years before `current_year`, at least one.
    pub fn for_history(latitude: f64, longitude: f64, years_back: u32, current_year: i32) -> Self {
        let span = i32::try_from(years_back.max(1)).unwrap_or(i32::MAX);
        Self::new(
            latitude,
            longitude,
            current_year.saturating_sub(span),
            current_year - 1,
        )
    }
}

/// A historical daily climate data source.
///
/// Implementations own their authentication and translate their native
/// payload into the canonical [`ClimateSeries`] shape.
pub trait ClimateProvider: Send + Sync {
    /// Short tag reported as provenance (e.g. `nasa`)
    fn id(&self) -> &'static str;

    /// Human-readable name used in logs and error messages
    fn label(&self) -> &'static str;

    /// Whether the provider has what it needs (credentials) to be called.
    fn is_configured(&self) -> bool {
        true
    }

    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<ClimateSeries, ProviderError>> + Send;

    /// Cheap connectivity check.
    fn probe(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Non-success statuses become `ProviderError::Status` with the response body.
pub(crate) async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}
