use chrono::NaiveDate;
use powerload::{metrics, pmc, tss};
use std::collections::BTreeMap;

/// Integration tests that exercise the public surface end to end

#[cfg(test)]
mod integration_tests {
    use super::*;
    use powerload::config::{MetricsConfig, ValidationMode};
    use powerload::error::{CalculationError, PowerLoadError};
    use powerload::pmc::{TrainingLoad, TsbInterpretation};

    /// Warm-up, threshold intervals and cool-down at 1 Hz
    fn create_interval_session(ftp: f64) -> Vec<f64> {
        let mut power = vec![0.6 * ftp; 600];
        for _ in 0..4 {
            power.extend(vec![1.05 * ftp; 480]);
            power.extend(vec![0.5 * ftp; 240]);
        }
        power.extend(vec![0.55 * ftp; 600]);
        power
    }

    /// Session metrics through daily loads and form
    #[test]
    fn test_session_to_training_load_workflow() {
        let ftp = 250.0;
        let calculator = tss::TssCalculator::new();

        let session = calculator
            .session_metrics(&create_interval_session(ftp), ftp)
            .unwrap();

        assert_eq!(session.duration_seconds, 600.0 + 4.0 * 720.0 + 600.0);
        assert!(session.normalized_power > session.average_power);
        assert!(session.intensity_factor > 0.7 && session.intensity_factor < 1.0);
        assert!(tss::TssCalculator::validate_tss(session.tss, session.duration_seconds).is_ok());

        let yesterday = TrainingLoad::new(54.0, 61.0);
        let config = MetricsConfig::default();
        let today = yesterday.advance(session.tss, &config);

        assert_eq!(
            today.ctl,
            metrics::chronic_training_load(54.0, session.tss, 42.0)
        );
        assert_eq!(today.atl, metrics::acute_training_load(61.0, session.tss, 7.0));
        assert_eq!(
            today.balance(),
            metrics::training_stress_balance(today.ctl, today.atl)
        );
    }

    /// A training block followed by a taper freshens the athlete
    #[test]
    fn test_taper_improves_form() {
        let calculator = pmc::PmcCalculator::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let mut daily_tss = BTreeMap::new();
        for (offset, date) in start.iter_days().take(42).enumerate() {
            let tss = if offset % 7 == 6 { 0.0 } else { 90.0 };
            daily_tss.insert(date, tss);
        }
        for date in start.iter_days().skip(42).take(10) {
            daily_tss.insert(date, 30.0);
        }

        let end = NaiveDate::from_ymd_opt(2024, 2, 21).unwrap();
        let series = calculator
            .calculate_series(&daily_tss, start, end, TrainingLoad::ZERO)
            .unwrap();

        assert_eq!(series.len(), 52);
        let block_end = &series[41];
        let race_day = series.last().unwrap();

        assert!(block_end.tsb < 0.0);
        assert!(race_day.tsb > block_end.tsb);
        assert!(race_day.ctl > 30.0);
        assert_ne!(
            TsbInterpretation::from_tsb(race_day.tsb),
            TsbInterpretation::VeryFatigued
        );
    }

    /// Compatible and strict modes agree on valid input
    #[test]
    fn test_validation_modes_agree_on_valid_input() {
        let power = create_interval_session(280.0);
        let compatible = tss::TssCalculator::new();
        let strict = tss::TssCalculator::with_config(MetricsConfig {
            validation: ValidationMode::Strict,
            ..MetricsConfig::default()
        });

        assert_eq!(
            compatible.session_metrics(&power, 280.0).unwrap(),
            strict.session_metrics(&power, 280.0).unwrap()
        );
    }

    /// Strict mode errors convert into the top-level error
    #[test]
    fn test_strict_errors_surface_to_users() {
        let strict = tss::TssCalculator::with_config(MetricsConfig::strict());

        let err: PowerLoadError = strict.session_metrics(&[], 250.0).unwrap_err().into();
        assert!(matches!(
            err,
            PowerLoadError::Calculation(CalculationError::EmptyInput { .. })
        ));
        assert!(err.user_message().contains("power samples"));

        let err: PowerLoadError = strict
            .session_metrics(&[200.0; 60], 0.0)
            .unwrap_err()
            .into();
        assert!(err.user_message().contains("FTP"));
    }

    /// A custom window changes NP on variable efforts only
    #[test]
    fn test_custom_window() {
        let short_window = tss::TssCalculator::with_config(MetricsConfig {
            window_size: 5,
            ..MetricsConfig::default()
        });
        let default_window = tss::TssCalculator::new();

        let steady = vec![220.0; 300];
        assert_eq!(
            short_window.normalized_power(&steady).unwrap(),
            default_window.normalized_power(&steady).unwrap()
        );

        let mut surges = Vec::new();
        for _ in 0..10 {
            surges.extend(vec![500.0; 10]);
            surges.extend(vec![100.0; 20]);
        }
        assert!(
            short_window.normalized_power(&surges).unwrap()
                > default_window.normalized_power(&surges).unwrap()
        );
    }
}
