use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PowerLoadError;
use crate::logging::LogConfig;
use crate::metrics::{
    ACUTE_TRAINING_LOAD_TIME_CONSTANT, CHRONIC_TRAINING_LOAD_TIME_CONSTANT,
    NORMALIZED_POWER_WINDOW,
};

/// How the checked calculators treat degenerate input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Pass NaN / infinity through exactly as the raw formulas produce them
    #[default]
    Compatible,
    /// Reject empty series, zero FTP and invalid parameters with an error
    Strict,
}

impl std::str::FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compatible" => Ok(ValidationMode::Compatible),
            "strict" => Ok(ValidationMode::Strict),
            _ => Err(format!("Invalid validation mode: {}", s)),
        }
    }
}

/// Calculation parameters with the conventional defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Rolling window for normalized power, in samples (default: 30)
    pub window_size: usize,

    /// CTL time constant in days (default: 42)
    pub ctl_time_constant: f64,

    /// ATL time constant in days (default: 7)
    pub atl_time_constant: f64,

    /// Treatment of degenerate input
    pub validation: ValidationMode,

    /// Ramp rate calculation period in days
    pub ramp_rate_days: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            window_size: NORMALIZED_POWER_WINDOW,
            ctl_time_constant: CHRONIC_TRAINING_LOAD_TIME_CONSTANT,
            atl_time_constant: ACUTE_TRAINING_LOAD_TIME_CONSTANT,
            validation: ValidationMode::Compatible,
            ramp_rate_days: 7,
        }
    }
}

impl MetricsConfig {
    /// Default parameters with strict validation
    pub fn strict() -> Self {
        MetricsConfig {
            validation: ValidationMode::Strict,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), PowerLoadError> {
        if self.window_size == 0 {
            return Err(PowerLoadError::Configuration(
                "window_size must be > 0 samples".to_string(),
            ));
        }
        for (name, value) in [
            ("ctl_time_constant", self.ctl_time_constant),
            ("atl_time_constant", self.atl_time_constant),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PowerLoadError::Configuration(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.ramp_rate_days == 0 {
            return Err(PowerLoadError::Configuration(
                "ramp_rate_days must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_strict(&self) -> bool {
        self.validation == ValidationMode::Strict
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Calculation parameters
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();
        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            metrics: MetricsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config
            .metrics
            .validate()
            .with_context(|| format!("Invalid metrics section in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".powerload")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Config file not loaded, using defaults"
                );
                Self::default()
            }
        }
    }
}
