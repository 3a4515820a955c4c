//! Unified error hierarchy for powerload
//!
//! The core formulas in [`crate::metrics`] never fail; these errors come from
//! the checked calculators, configuration handling and the CLI.

use thiserror::Error;

/// Top-level error type for all powerload operations
#[derive(Debug, Error)]
pub enum PowerLoadError {
    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Calculation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    /// No samples to calculate from
    #[error("Empty input for {calculation}")]
    EmptyInput { calculation: String },

    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// Division by zero
    #[error("Division by zero in {calculation}")]
    DivisionByZero { calculation: String },

    /// Result is NaN or infinite
    #[error("Non-finite result in {calculation}")]
    NonFinite { calculation: String },

    /// Not enough days for series analysis
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },

    /// Start date after end date
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: String, end: String },
}

impl CalculationError {
    pub(crate) fn empty_input(calculation: &str) -> Self {
        CalculationError::EmptyInput {
            calculation: calculation.to_string(),
        }
    }

    pub(crate) fn invalid_parameter(
        calculation: &str,
        parameter: &str,
        value: impl ToString,
    ) -> Self {
        CalculationError::InvalidParameter {
            calculation: calculation.to_string(),
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn division_by_zero(calculation: &str) -> Self {
        CalculationError::DivisionByZero {
            calculation: calculation.to_string(),
        }
    }

    pub(crate) fn non_finite(calculation: &str) -> Self {
        CalculationError::NonFinite {
            calculation: calculation.to_string(),
        }
    }
}

impl PowerLoadError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PowerLoadError::Calculation(CalculationError::EmptyInput { .. }) => {
                ErrorSeverity::Warning
            }
            PowerLoadError::Calculation(CalculationError::InsufficientData { .. }) => {
                ErrorSeverity::Warning
            }
            PowerLoadError::Calculation(_) => ErrorSeverity::Error,
            PowerLoadError::Configuration(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PowerLoadError::Calculation(CalculationError::EmptyInput { calculation }) => {
                format!(
                    "No power samples given for {}. Provide at least one reading.",
                    calculation
                )
            }
            PowerLoadError::Calculation(CalculationError::DivisionByZero { .. }) => {
                "FTP must be greater than zero.".to_string()
            }
            PowerLoadError::Configuration(reason) => {
                format!("Invalid configuration: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
