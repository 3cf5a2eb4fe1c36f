//! Place-name geocoding and reverse geocoding.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedPlace {
    pub lat: f64,
    pub lon: f64,
    pub display_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Geocoding service returned status {0}")]
    Status(u16),

    #[error("Invalid coordinates in geocoding response: {0}")]
    InvalidCoordinates(String),
}

pub trait Geocoder: Send + Sync {
    /// First match for a free-text place name, or `None` when nothing matches.
    fn geocode(
        &self,
        place: &str,
    ) -> impl Future<Output = Result<Option<GeocodedPlace>, GeocodeError>> + Send;

    /// Short place name for coordinates. `None` on any failure; callers fall back to coordinates.
    fn reverse_geocode(&self, lat: f64, lon: f64) -> impl Future<Output = Option<String>> + Send;
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// "Place, State" (or "Place, Country"), e.g. "Accra, Greater Accra Region".
    fn short_name(self) -> Option<String> {
        // Capture state/country before the place chain consumes them
        let state = self.state.clone();
        let country = self.country.clone();

        let place = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.state_district)
            .or(self.county)
            .or(self.state)
            .or(self.country)?;

        let suffix = [state, country]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty() && *s != place);

        Some(match suffix {
            Some(s) => format!("{}, {}", place, s),
            None => place,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(user_agent: &str) -> Result<Self, GeocodeError> {
        Self::with_base_url(NOMINATIM_URL, user_agent, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        let Some(hit) = hits.into_iter().next() else {
            tracing::debug!("No geocoding match for {:?}", place);
            return Ok(None);
        };

        let parse = |raw: &str| {
            raw.parse::<f64>()
                .map_err(|_| GeocodeError::InvalidCoordinates(raw.to_string()))
        };
        let found = GeocodedPlace {
            lat: parse(&hit.lat)?,
            lon: parse(&hit.lon)?,
            display_name: hit.display_name,
        };
        tracing::info!("Geocoded {:?} to ({}, {})", place, found.lat, found.lon);
        Ok(Some(found))
    }

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Option<String> {
        let response = match self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: ReverseResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let name = body
            .address
            .and_then(NominatimAddress::short_name)
            .or(body.display_name)?;
        tracing::debug!("Reverse geocoded ({}, {}) to {}", lat, lon, name);
        Some(name)
    }
}
