//! Core power metrics
//!
//! Pure functions for the standard power-based training metrics:
//! - **Normalized Power (NP)**: 4th-power mean of the 30-second rolling average
//! - **Intensity Factor (IF)**: NP / FTP
//! - **Training Stress Score (TSS)**: one hour at FTP = 100
//! - **Chronic / Acute Training Load (CTL / ATL)**: one exponential smoothing step
//! - **Training Stress Balance (TSB)**: CTL - ATL
//!
//! Nothing here validates its input. Degenerate input (an empty series, an FTP
//! of zero) surfaces as NaN or infinity in the returned value. Use
//! [`crate::tss::TssCalculator`] for checked calculations.

/// Default rolling window for normalized power, in samples (1 Hz data)
pub const NORMALIZED_POWER_WINDOW: usize = 30;

/// Default time constant for chronic training load, in days
pub const CHRONIC_TRAINING_LOAD_TIME_CONSTANT: f64 = 42.0;

/// Default time constant for acute training load, in days
pub const ACUTE_TRAINING_LOAD_TIME_CONSTANT: f64 = 7.0;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Rolling averages of `power_data` over `window_size` samples.
///
/// The window is clamped to the series length, so a window larger than the
/// series produces a single value: the mean of the whole series. A zero window
/// or an empty series yields no values.
pub fn rolling_averages(power_data: &[f64], window_size: usize) -> Vec<f64> {
    let window = window_size.min(power_data.len());
    if window == 0 {
        return Vec::new();
    }

    power_data
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Calculate rolling Normalized Power.
///
/// NP = (mean(rolling_avg⁴))^¼ where `rolling_avg` is [`rolling_averages`].
/// Returns NaN for an empty series or a zero window.
pub fn normalized_power(power_data: &[f64], window_size: usize) -> f64 {
    let rolling = rolling_averages(power_data, window_size);

    let sum_fourth_powers: f64 = rolling.iter().map(|avg| avg.powi(4)).sum();
    let mean_fourth_power = sum_fourth_powers / rolling.len() as f64;

    // Fourth root as sqrt of sqrt, exact for perfect fourth powers
    mean_fourth_power.sqrt().sqrt()
}

/// Intensity Factor: IF = NP / FTP
pub fn intensity_factor(normalized_power: f64, ftp: f64) -> f64 {
    normalized_power / ftp
}

/// Training Stress Score.
///
/// TSS = (duration × NP × IF) / (FTP × 3600) × 100
pub fn training_stress_score(duration_seconds: f64, normalized_power: f64, ftp: f64) -> f64 {
    let intensity_factor = intensity_factor(normalized_power, ftp);
    (duration_seconds * normalized_power * intensity_factor) / (ftp * SECONDS_PER_HOUR) * 100.0
}

/// One exponential smoothing step: (1 - 1/τ) × previous + (1/τ) × score
fn exponential_load(previous: f64, score: f64, time_constant: f64) -> f64 {
    (1.0 - 1.0 / time_constant) * previous + (1.0 / time_constant) * score
}

/// Today's Chronic Training Load from yesterday's value and today's TSS.
///
/// The usual time constant is [`CHRONIC_TRAINING_LOAD_TIME_CONSTANT`].
pub fn chronic_training_load(
    yesterday_chronic_training_load: f64,
    training_stress_score: f64,
    time_constant: f64,
) -> f64 {
    exponential_load(yesterday_chronic_training_load, training_stress_score, time_constant)
}

/// Today's Acute Training Load from yesterday's value and today's TSS.
///
/// The usual time constant is [`ACUTE_TRAINING_LOAD_TIME_CONSTANT`].
pub fn acute_training_load(
    yesterday_acute_training_load: f64,
    training_stress_score: f64,
    time_constant: f64,
) -> f64 {
    exponential_load(yesterday_acute_training_load, training_stress_score, time_constant)
}

/// Training Stress Balance: TSB = CTL - ATL
pub fn training_stress_balance(chronic_training_load: f64, acute_training_load: f64) -> f64 {
    chronic_training_load - acute_training_load
}
