// Library interface for powerload modules
// This allows integration tests and benches to access the core functionality

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pmc;
pub mod tss;

// Re-export commonly used types for convenience
pub use config::{AppConfig, MetricsConfig, ValidationMode};
pub use error::{CalculationError, ErrorSeverity, PowerLoadError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{
    acute_training_load, chronic_training_load, intensity_factor, normalized_power,
    training_stress_balance, training_stress_score, ACUTE_TRAINING_LOAD_TIME_CONSTANT,
    CHRONIC_TRAINING_LOAD_TIME_CONSTANT, NORMALIZED_POWER_WINDOW,
};
pub use pmc::{PmcCalculator, PmcMetrics, TrainingLoad, TsbInterpretation};
pub use tss::{SessionMetrics, TssCalculator};
