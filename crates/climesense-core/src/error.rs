//! Centralized error types for the ClimeSense application.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling at the application edge
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// Errors from the analysis crates convert into this type.
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Climate analysis error: {0}")]
    Climate(#[from] ClimateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Climate(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to reach the weather service. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having problems. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "The weather service sent an unreadable response."
            }
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout
        } else if let Some(status) = e.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_decode() {
            NetworkError::InvalidResponse(e.to_string())
        } else {
            NetworkError::ConnectionFailed(e.to_string())
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check config.toml.",
        }
    }
}

/// Climate analysis errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum ClimateError {
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Weather data unavailable: {0}")]
    SourcesExhausted(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),
}

impl ClimateError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ClimateError::UnknownCondition(_) => {
                "Unknown weather condition. Pick one from the available conditions."
            }
            ClimateError::LocationNotFound(_) => "Location not found. Try a different place name.",
            ClimateError::InvalidRequest(_) => "The request is invalid. Check the date and parameters.",
            ClimateError::SourcesExhausted(_) => {
                "Historical weather data is unavailable right now. Please try again later."
            }
            ClimateError::Geocoding(_) => "Location lookup failed. Please try again.",
        }
    }
}
