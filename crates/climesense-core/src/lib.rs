//! Shared configuration, error types and logging setup for ClimeSense.

pub mod config;
pub mod error;

pub use config::{
    AnalysisConfig, Config, GeocodingConfig, SourcesConfig, SweepConfig, ValidationResult,
};
pub use error::{AppError, ClimateError, ConfigError, NetworkError};

use anyhow::Result;

/// Initialize logging for the process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("ClimeSense core initialized");
    Ok(())
}
