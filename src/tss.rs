use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{debug, warn};

use crate::config::MetricsConfig;
use crate::error::CalculationError;
use crate::metrics;

/// Power metrics for a single session of 1 Hz power samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Session length in seconds (one sample per second)
    pub duration_seconds: f64,
    pub average_power: f64,
    pub normalized_power: f64,
    /// Variability Index (VI = NP / average power)
    pub variability_index: f64,
    pub intensity_factor: f64,
    pub tss: f64,
}

/// Checked calculation engine over the raw formulas in [`metrics`].
///
/// In [`crate::config::ValidationMode::Compatible`] every method returns
/// exactly what the raw formula returns, NaN and infinity included. In
/// strict mode degenerate input is rejected up front and any result that is
/// still NaN or infinite becomes [`CalculationError::NonFinite`].
#[derive(Debug, Clone, Default)]
pub struct TssCalculator {
    config: MetricsConfig,
}

impl TssCalculator {
    /// Create new calculator with default configuration
    pub fn new() -> Self {
        TssCalculator {
            config: MetricsConfig::default(),
        }
    }

    /// Create new calculator with custom configuration
    pub fn with_config(config: MetricsConfig) -> Self {
        TssCalculator { config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Normalized Power over the configured rolling window
    pub fn normalized_power(&self, power_data: &[f64]) -> Result<f64, CalculationError> {
        const CALCULATION: &str = "normalized power";

        if self.config.is_strict() {
            if power_data.is_empty() {
                return Err(CalculationError::empty_input(CALCULATION));
            }
            if self.config.window_size == 0 {
                return Err(CalculationError::invalid_parameter(
                    CALCULATION,
                    "window_size",
                    0,
                ));
            }
            if let Some(sample) = power_data.iter().find(|p| !p.is_finite() || **p < 0.0) {
                return Err(CalculationError::invalid_parameter(CALCULATION, "power", sample));
            }
        }

        let np = metrics::normalized_power(power_data, self.config.window_size);
        debug!(
            samples = power_data.len(),
            window = self.config.window_size,
            normalized_power = np,
            "Calculated normalized power"
        );

        self.check_finite(CALCULATION, np)
    }

    /// Intensity Factor (IF = NP / FTP)
    pub fn intensity_factor(
        &self,
        normalized_power: f64,
        ftp: f64,
    ) -> Result<f64, CalculationError> {
        const CALCULATION: &str = "intensity factor";

        if self.config.is_strict() {
            Self::check_ftp(CALCULATION, ftp)?;
        }

        self.check_finite(CALCULATION, metrics::intensity_factor(normalized_power, ftp))
    }

    /// Training Stress Score for a session of `duration_seconds`
    pub fn training_stress_score(
        &self,
        duration_seconds: f64,
        normalized_power: f64,
        ftp: f64,
    ) -> Result<f64, CalculationError> {
        const CALCULATION: &str = "training stress score";

        if self.config.is_strict() {
            Self::check_ftp(CALCULATION, ftp)?;
            if !duration_seconds.is_finite() || duration_seconds < 0.0 {
                return Err(CalculationError::invalid_parameter(
                    CALCULATION,
                    "duration_seconds",
                    duration_seconds,
                ));
            }
        }

        let tss = metrics::training_stress_score(duration_seconds, normalized_power, ftp);
        debug!(duration_seconds, normalized_power, ftp, tss, "Calculated TSS");

        self.check_finite(CALCULATION, tss)
    }

    /// All session metrics for a 1 Hz power series
    pub fn session_metrics(
        &self,
        power_data: &[f64],
        ftp: f64,
    ) -> Result<SessionMetrics, CalculationError> {
        let duration_seconds = power_data.len() as f64;
        let normalized_power = self.normalized_power(power_data)?;
        let intensity_factor = self.intensity_factor(normalized_power, ftp)?;
        let tss = self.training_stress_score(duration_seconds, normalized_power, ftp)?;

        // statrs returns NaN for an empty slice, matching the raw formulas
        let average_power = power_data.iter().mean();
        let variability_index =
            self.check_finite("variability index", normalized_power / average_power)?;

        Ok(SessionMetrics {
            duration_seconds,
            average_power,
            normalized_power,
            variability_index,
            intensity_factor,
            tss,
        })
    }

    /// Validate TSS result for sanity check
    ///
    /// Anything negative or above 300 TSS per hour is rejected.
    pub fn validate_tss(tss: f64, duration_seconds: f64) -> Result<f64, CalculationError> {
        const CALCULATION: &str = "training stress score";

        if !tss.is_finite() {
            return Err(CalculationError::non_finite(CALCULATION));
        }
        if tss < 0.0 {
            return Err(CalculationError::invalid_parameter(CALCULATION, "tss", tss));
        }

        let max_reasonable_tss = duration_seconds / metrics::SECONDS_PER_HOUR * 300.0;
        if tss > max_reasonable_tss {
            return Err(CalculationError::invalid_parameter(
                CALCULATION,
                "tss",
                format!("{:.1} (above 300 per hour)", tss),
            ));
        }

        Ok(tss)
    }

    fn check_ftp(calculation: &str, ftp: f64) -> Result<(), CalculationError> {
        if ftp == 0.0 {
            return Err(CalculationError::division_by_zero(calculation));
        }
        if !ftp.is_finite() || ftp < 0.0 {
            return Err(CalculationError::invalid_parameter(calculation, "ftp", ftp));
        }
        Ok(())
    }

    fn check_finite(&self, calculation: &str, value: f64) -> Result<f64, CalculationError> {
        if value.is_finite() {
            return Ok(value);
        }
        if self.config.is_strict() {
            return Err(CalculationError::non_finite(calculation));
        }

        warn!(calculation, value, "Non-finite result passed through in compatible mode");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::MIXED_RIDE;
    use proptest::prelude::*;

    #[test]
    fn test_compatible_mode_matches_raw_formulas() {
        let calculator = TssCalculator::new();

        let np = calculator.normalized_power(&MIXED_RIDE).unwrap();
        assert_eq!(np, metrics::normalized_power(&MIXED_RIDE, 30));
        assert_eq!(calculator.intensity_factor(157.0, 241.0).unwrap(), 157.0 / 241.0);
        assert_eq!(
            calculator.training_stress_score(4500.0, 157.0, 241.0).unwrap(),
            metrics::training_stress_score(4500.0, 157.0, 241.0)
        );
    }

    #[test]
    fn test_compatible_mode_passes_degenerate_values_through() {
        let calculator = TssCalculator::new();

        assert!(calculator.normalized_power(&[]).unwrap().is_nan());
        assert!(calculator.intensity_factor(200.0, 0.0).unwrap().is_infinite());
        assert!(calculator.training_stress_score(3600.0, 0.0, 0.0).unwrap().is_nan());
    }

    #[test]
    fn test_strict_mode_rejects_empty_input() {
        let calculator = TssCalculator::with_config(MetricsConfig::strict());

        assert_eq!(
            calculator.normalized_power(&[]),
            Err(CalculationError::EmptyInput {
                calculation: "normalized power".to_string()
            })
        );
    }

    #[test]
    fn test_strict_mode_rejects_zero_ftp() {
        let calculator = TssCalculator::with_config(MetricsConfig::strict());

        assert!(matches!(
            calculator.intensity_factor(200.0, 0.0),
            Err(CalculationError::DivisionByZero { .. })
        ));
        assert!(matches!(
            calculator.training_stress_score(3600.0, 200.0, 0.0),
            Err(CalculationError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_strict_mode_rejects_invalid_samples() {
        let calculator = TssCalculator::with_config(MetricsConfig::strict());

        assert!(matches!(
            calculator.normalized_power(&[200.0, -5.0, 210.0]),
            Err(CalculationError::InvalidParameter { .. })
        ));
        assert!(matches!(
            calculator.normalized_power(&[200.0, f64::NAN]),
            Err(CalculationError::InvalidParameter { .. })
        ));
        assert!(matches!(
            calculator.training_stress_score(-60.0, 200.0, 250.0),
            Err(CalculationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_strict_mode_rejects_zero_window() {
        let calculator = TssCalculator::with_config(MetricsConfig {
            window_size: 0,
            ..MetricsConfig::strict()
        });

        assert!(matches!(
            calculator.normalized_power(&[200.0; 60]),
            Err(CalculationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_session_metrics_steady_hour_at_ftp() {
        let calculator = TssCalculator::new();
        let power = vec![250.0; 3600];

        let session = calculator.session_metrics(&power, 250.0).unwrap();

        assert_eq!(session.duration_seconds, 3600.0);
        assert_eq!(session.normalized_power, 250.0);
        assert_eq!(session.average_power, 250.0);
        assert_eq!(session.variability_index, 1.0);
        assert_eq!(session.intensity_factor, 1.0);
        assert_eq!(session.tss.round(), 100.0);
    }

    #[test]
    fn test_session_metrics_variable_ride() {
        let calculator = TssCalculator::new();

        let session = calculator.session_metrics(&MIXED_RIDE, 300.0).unwrap();

        assert_eq!(session.normalized_power.round(), 323.0);
        assert!(session.variability_index > 1.0);
        assert!(session.intensity_factor > 1.0);
    }

    #[test]
    fn test_session_metrics_zero_average_power() {
        let strict = TssCalculator::with_config(MetricsConfig::strict());
        assert_eq!(
            strict.session_metrics(&[0.0; 60], 250.0),
            Err(CalculationError::NonFinite {
                calculation: "variability index".to_string()
            })
        );

        let compatible = TssCalculator::new();
        let session = compatible.session_metrics(&[0.0; 60], 250.0).unwrap();
        assert_eq!(session.normalized_power, 0.0);
        assert_eq!(session.tss, 0.0);
        assert!(session.variability_index.is_nan());
    }

    #[test]
    fn test_strict_mode_rejects_non_finite_result() {
        let strict = TssCalculator::with_config(MetricsConfig::strict());

        assert!(matches!(
            strict.intensity_factor(f64::INFINITY, 250.0),
            Err(CalculationError::NonFinite { .. })
        ));
        assert!(matches!(
            strict.training_stress_score(3600.0, f64::NAN, 250.0),
            Err(CalculationError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_tss_validation() {
        assert!(TssCalculator::validate_tss(100.0, 3600.0).is_ok());
        assert!(TssCalculator::validate_tss(-1.0, 3600.0).is_err());
        assert!(TssCalculator::validate_tss(400.0, 3600.0).is_err());
        assert!(TssCalculator::validate_tss(f64::NAN, 3600.0).is_err());
    }

    proptest! {
        #[test]
        fn test_tss_scales_with_duration(
            np in 100.0f64..400.0,
            ftp in 150.0f64..350.0,
            duration in 600.0f64..7200.0,
        ) {
            let calculator = TssCalculator::with_config(MetricsConfig::strict());

            let tss1 = calculator.training_stress_score(duration, np, ftp).unwrap();
            let tss2 = calculator.training_stress_score(duration * 2.0, np, ftp).unwrap();

            prop_assert!(tss1 > 0.0);
            prop_assert!((tss2 / tss1 - 2.0).abs() < 1e-9);
        }

        #[test]
        fn test_tss_matches_if_squared_form(
            np in 100.0f64..400.0,
            ftp in 150.0f64..350.0,
            duration in 600.0f64..7200.0,
        ) {
            let calculator = TssCalculator::new();

            let tss = calculator.training_stress_score(duration, np, ftp).unwrap();
            let intensity = np / ftp;
            let expected = duration / 3600.0 * intensity * intensity * 100.0;

            prop_assert!((tss - expected).abs() < 1e-9 * expected.max(1.0));
        }
    }
}
