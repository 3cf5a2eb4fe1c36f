//! Historical climate data providers for ClimeSense.
//!
//! NASA POWER is the primary source and Meteomatics the credentialed
//! fallback. Both normalize into [`climesense_extremes::ClimateSeries`].

pub mod error;
pub mod fallback;
pub mod geocode;
pub mod health;
pub mod meteomatics;
pub mod nasa;
pub mod provider;

pub use error::{FetchError, ProviderError};
pub use fallback::{FallbackFetcher, SourcedSeries};
pub use geocode::{GeocodeError, GeocodedPlace, Geocoder, NominatimGeocoder};
pub use health::{
    HealthReport, OverallHealth, ProbeResult, ProbeStatus, SourceAvailability, SourceStatus,
};
pub use meteomatics::{MeteomaticsCredentials, MeteomaticsProvider};
pub use nasa::NasaPowerProvider;
pub use provider::{ClimateProvider, FetchRequest, DEFAULT_TIMEOUT_SECS};
