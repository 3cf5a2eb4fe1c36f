//! Provider and orchestration error types.

use thiserror::Error;

/// Failure of a single provider attempt.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("{0}")]
    Config(String),

    #[error("returned empty data")]
    Empty,
}

impl ProviderError {
    /// Network, timeout, non-success status or undecodable payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. } | Self::Payload(_))
    }

    /// Provider selected but credentials/settings absent.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Failure of an orchestrated fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(
        "Both weather data sources failed. {primary_source} error: {primary}. \
         {secondary_source} fallback error: {secondary}"
    )]
    AllSourcesExhausted {
        primary_source: &'static str,
        primary: ProviderError,
        secondary_source: &'static str,
        secondary: ProviderError,
    },
}
