//! Primary/secondary orchestration.
//!
//! The primary provider is always tried first. The secondary is tried only
//! when the primary fails or yields nothing for the target date, and only if
//! it is configured; otherwise its configuration error stands in for an
//! attempt. Both failing yields [`FetchError::AllSourcesExhausted`].

use crate::error::{FetchError, ProviderError};
use crate::provider::{ClimateProvider, FetchRequest};
use chrono::{Datelike, Utc};
use climesense_extremes::ClimateSeries;
use serde::Serialize;
use tracing::{error, info, warn};

/// A series narrowed to the target date, tagged with the provider that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct SourcedSeries {
    pub series: ClimateSeries,
    /// Provider tag (`nasa`, `meteomatics`)
    pub source: &'static str,
    pub source_label: &'static str,
    pub fallback_used: bool,
}

pub struct FallbackFetcher<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackFetcher<P, S>
where
    P: ClimateProvider,
    S: ClimateProvider,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    /// Fetch the `years_back` complete years before the current UTC year.
    pub async fn fetch_with_fallback(
        &self,
        latitude: f64,
        longitude: f64,
        target_month: u32,
        target_day: Option<u32>,
        years_back: u32,
    ) -> Result<SourcedSeries, FetchError> {
        let request = FetchRequest::for_history(latitude, longitude, years_back, Utc::now().year());
        self.fetch_for_years(&request, target_month, target_day).await
    }

    pub async fn fetch_for_years(
        &self,
        request: &FetchRequest,
        target_month: u32,
        target_day: Option<u32>,
    ) -> Result<SourcedSeries, FetchError> {
        info!(
            "Attempting to fetch weather data from {} for lat={}, lon={}",
            self.primary.label(),
            request.latitude,
            request.longitude
        );

        let primary_error = match attempt(&self.primary, request, target_month, target_day).await {
            Ok(series) => {
                info!("Successfully fetched data from {}", self.primary.label());
                log_usage(self.primary.id(), request, None);
                return Ok(SourcedSeries {
                    series,
                    source: self.primary.id(),
                    source_label: self.primary.label(),
                    fallback_used: false,
                });
            }
            Err(e) => {
                warn!("{} failed: {}", self.primary.label(), e);
                e
            }
        };

        match attempt(&self.secondary, request, target_month, target_day).await {
            Ok(series) => {
                info!("Successfully fetched data from {} fallback", self.secondary.label());
                log_usage(self.secondary.id(), request, None);
                Ok(SourcedSeries {
                    series,
                    source: self.secondary.id(),
                    source_label: self.secondary.label(),
                    fallback_used: true,
                })
            }
            Err(secondary_error) => {
                error!(
                    "{} fallback also failed: {}",
                    self.secondary.label(),
                    secondary_error
                );
                let err = FetchError::AllSourcesExhausted {
                    primary_source: self.primary.label(),
                    primary: primary_error,
                    secondary_source: self.secondary.label(),
                    secondary: secondary_error,
                };
                log_usage(self.secondary.id(), request, Some(&err));
                Err(err)
            }
        }
    }
}

/// One provider attempt: configured, fetched, and non-empty for the target date.
async fn attempt<C: ClimateProvider>(
    provider: &C,
    request: &FetchRequest,
    target_month: u32,
    target_day: Option<u32>,
) -> Result<ClimateSeries, ProviderError> {
    if !provider.is_configured() {
        return Err(ProviderError::Config(format!(
            "{} credentials not configured",
            provider.label()
        )));
    }

    let series = provider
        .fetch(request)
        .await?
        .restricted_to(target_month, target_day);

    if series.is_empty() {
        return Err(ProviderError::Empty);
    }
    Ok(series)
}

fn log_usage(source: &str, request: &FetchRequest, failure: Option<&FetchError>) {
    let line = format!(
        "Weather data fetch from {} for location ({}, {})",
        source.to_uppercase(),
        request.latitude,
        request.longitude
    );
    match failure {
        None => info!("{} - SUCCESS", line),
        Some(e) => error!("{} - FAILED: {}", line, e),
    }
}
