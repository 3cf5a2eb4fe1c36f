use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const METEOMATICS_USERNAME_ENV: &str = "METEOMATICS_USERNAME";
pub const METEOMATICS_PASSWORD_ENV: &str = "METEOMATICS_PASSWORD";

/// NASA POWER daily coverage starts in 1981.
const POWER_HISTORY_YEARS: u32 = 45;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Historical climate data providers
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Place name lookup
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Probability analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Geospatial sweep settings
    #[serde(default)]
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// NASA POWER daily point endpoint (primary source)
    #[serde(default = "default_nasa_power_url")]
    pub nasa_power_url: String,

    /// Meteomatics API base URL (fallback source)
    #[serde(default = "default_meteomatics_url")]
    pub meteomatics_url: String,

    /// Per-request timeout for provider calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Meteomatics credentials; the fallback is disabled without them.
    ///
    /// `METEOMATICS_USERNAME` / `METEOMATICS_PASSWORD` override these.
    #[serde(default)]
    pub meteomatics_username: Option<String>,
    #[serde(default)]
    pub meteomatics_password: Option<String>,
}

fn default_nasa_power_url() -> String {
    "https://power.larc.nasa.gov/api/temporal/daily/point".to_string()
}

fn default_meteomatics_url() -> String {
    "https://api.meteomatics.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl SourcesConfig {
    /// Username and password, when both are present and non-empty.
    pub fn meteomatics_credentials(&self) -> Option<(&str, &str)> {
        let username = self.meteomatics_username.as_deref().filter(|s| !s.is_empty())?;
        let password = self.meteomatics_password.as_deref().filter(|s| !s.is_empty())?;
        Some((username, password))
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            nasa_power_url: default_nasa_power_url(),
            meteomatics_url: default_meteomatics_url(),
            request_timeout_secs: default_request_timeout_secs(),
            meteomatics_username: None,
            meteomatics_password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Nominatim base URL (without `/search` or `/reverse`)
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    /// Nominatim requires an identifying user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "ClimeSense/0.1.0 (https://github.com/climesense)".to_string()
}

fn default_geocoding_timeout_secs() -> u64 {
    10
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            nominatim_url: default_nominatim_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoding_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// How many past years of history to sample
    #[serde(default = "default_years_back")]
    pub years_back: u32,
}

fn default_years_back() -> u32 {
    25
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            years_back: default_years_back(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Grid step in degrees, used when a request omits it
    #[serde(default = "default_sweep_step")]
    pub default_step: f64,

    /// Search radius in degrees, used when a request omits it
    #[serde(default = "default_sweep_range")]
    pub default_range: f64,

    /// Grid points evaluated at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Reverse geocode each grid point for a readable label
    #[serde(default = "default_label_points")]
    pub label_points: bool,
}

fn default_sweep_step() -> f64 {
    0.5
}

fn default_sweep_range() -> f64 {
    1.0
}

fn default_max_concurrency() -> usize {
    4
}

fn default_label_points() -> bool {
    true
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            default_step: default_sweep_step(),
            default_range: default_sweep_range(),
            max_concurrency: default_max_concurrency(),
            label_points: default_label_points(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("climesense");

        Self {
            config_dir,
            sources: SourcesConfig::default(),
            geocoding: GeocodingConfig::default(),
            analysis: AnalysisConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist.
    ///
    /// Environment credentials are applied on top of the file.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config.with_env_overrides());
        }

        Ok(Self::load_from(&config_path)?.with_env_overrides())
    }

    /// Load configuration from an explicit path without env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Replace Meteomatics credentials with values from the environment, when set.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_env_overrides(|key| std::env::var(key).ok());
        self
    }

    /// Apply overrides from an arbitrary key lookup (the process env in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup(METEOMATICS_USERNAME_ENV).filter(|v| !v.is_empty()) {
            self.sources.meteomatics_username = Some(username);
        }
        if let Some(password) = lookup(METEOMATICS_PASSWORD_ENV).filter(|v| !v.is_empty()) {
            self.sources.meteomatics_password = Some(password);
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.sources.nasa_power_url, "sources.nasa_power_url", &mut result);
        self.validate_url(&self.sources.meteomatics_url, "sources.meteomatics_url", &mut result);
        self.validate_url(&self.geocoding.nominatim_url, "geocoding.nominatim_url", &mut result);

        if self.sources.request_timeout_secs == 0 {
            result.add_error("sources.request_timeout_secs", "Timeout must be greater than 0");
        } else if self.sources.request_timeout_secs > 120 {
            result.add_warning(
                "sources.request_timeout_secs",
                "Provider timeout is unusually long (>120s)",
            );
        }

        if self.geocoding.timeout_secs == 0 {
            result.add_error("geocoding.timeout_secs", "Timeout must be greater than 0");
        }

        if self.geocoding.user_agent.trim().is_empty() {
            result.add_error("geocoding.user_agent", "Nominatim requires a user agent");
        }

        if self.analysis.years_back == 0 {
            result.add_error("analysis.years_back", "At least one year of history is required");
        } else if self.analysis.years_back > POWER_HISTORY_YEARS {
            result.add_warning(
                "analysis.years_back",
                format!(
                    "NASA POWER has no daily data older than ~{} years; earlier years will be empty",
                    POWER_HISTORY_YEARS
                ),
            );
        }

        if !(self.sweep.default_step > 0.0 && self.sweep.default_step <= 5.0) {
            result.add_error("sweep.default_step", "Step must be between 0 and 5 degrees");
        }
        if !(self.sweep.default_range > 0.0 && self.sweep.default_range <= 10.0) {
            result.add_error("sweep.default_range", "Range must be between 0 and 10 degrees");
        }
        if self.sweep.max_concurrency == 0 {
            result.add_error("sweep.max_concurrency", "Concurrency must be at least 1");
        }

        if self.sources.meteomatics_credentials().is_none() {
            result.add_warning(
                "sources.meteomatics",
                "Meteomatics credentials not configured - fallback source unavailable",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("climesense");

        Ok(config_dir.join("config.toml"))
    }
}
