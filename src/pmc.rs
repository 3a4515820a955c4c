use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::MetricsConfig;
use crate::error::CalculationError;
use crate::metrics;

/// Chronic and acute training load carried from one day to the next.
///
/// The caller owns this value between calculations; nothing is stored here.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingLoad {
    /// Chronic Training Load (fitness)
    pub ctl: f64,
    /// Acute Training Load (fatigue)
    pub atl: f64,
}

impl TrainingLoad {
    pub const ZERO: TrainingLoad = TrainingLoad { ctl: 0.0, atl: 0.0 };

    pub fn new(ctl: f64, atl: f64) -> Self {
        TrainingLoad { ctl, atl }
    }

    /// Loads after one more day with the given TSS
    pub fn advance(self, training_stress_score: f64, config: &MetricsConfig) -> Self {
        TrainingLoad {
            ctl: metrics::chronic_training_load(
                self.ctl,
                training_stress_score,
                config.ctl_time_constant,
            ),
            atl: metrics::acute_training_load(
                self.atl,
                training_stress_score,
                config.atl_time_constant,
            ),
        }
    }

    /// Training Stress Balance (CTL - ATL)
    pub fn balance(&self) -> f64 {
        metrics::training_stress_balance(self.ctl, self.atl)
    }
}

/// Performance Management Chart (PMC) metrics for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmcMetrics {
    /// Date these metrics are calculated for
    pub date: Option<NaiveDate>,

    /// Day index from the start of the series
    pub day: usize,

    /// TSS applied on this day
    pub daily_tss: f64,

    /// Chronic Training Load at the end of the day
    pub ctl: f64,

    /// Acute Training Load at the end of the day
    pub atl: f64,

    /// Training Stress Balance going into the day (yesterday's CTL - ATL)
    pub tsb: f64,

    /// CTL change per week, once enough days are available
    pub ctl_ramp_rate: Option<f64>,
}

/// Training Stress Balance interpretation ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TsbInterpretation {
    VeryFresh,    // +25 and above
    Fresh,        // +5 to +25
    Neutral,      // -10 to +5
    Fatigued,     // -30 to -10
    VeryFatigued, // Below -30
}

impl TsbInterpretation {
    /// Get TSB interpretation from numeric value
    pub fn from_tsb(tsb: f64) -> Self {
        if tsb >= 25.0 {
            TsbInterpretation::VeryFresh
        } else if tsb >= 5.0 {
            TsbInterpretation::Fresh
        } else if tsb >= -10.0 {
            TsbInterpretation::Neutral
        } else if tsb >= -30.0 {
            TsbInterpretation::Fatigued
        } else {
            TsbInterpretation::VeryFatigued
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TsbInterpretation::VeryFresh => "Very fresh (may be losing fitness)",
            TsbInterpretation::Fresh => "Fresh and ready for hard training/racing",
            TsbInterpretation::Neutral => "Neutral (normal training)",
            TsbInterpretation::Fatigued => "Fatigued (monitor closely)",
            TsbInterpretation::VeryFatigued => "Very fatigued (rest needed)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Stable,
    Decreasing,
}

/// PMC trend analysis results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmcTrends {
    pub ctl_trend: TrendDirection,
    pub atl_trend: TrendDirection,
    pub tsb_trend: TrendDirection,

    /// Average CTL ramp rate (TSS/week)
    pub avg_ctl_ramp_rate: f64,
}

/// PMC calculation engine
#[derive(Debug, Clone, Default)]
pub struct PmcCalculator {
    config: MetricsConfig,
}

impl PmcCalculator {
    pub fn new() -> Self {
        PmcCalculator {
            config: MetricsConfig::default(),
        }
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        PmcCalculator { config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Today's CTL from yesterday's value, using the configured time constant
    pub fn chronic_training_load(
        &self,
        previous: f64,
        training_stress_score: f64,
    ) -> Result<f64, CalculationError> {
        const CALCULATION: &str = "chronic training load";

        let time_constant = self.config.ctl_time_constant;
        self.check_time_constant(CALCULATION, time_constant)?;
        let ctl = metrics::chronic_training_load(previous, training_stress_score, time_constant);
        self.check_finite(CALCULATION, ctl)
    }

    /// Today's ATL from yesterday's value, using the configured time constant
    pub fn acute_training_load(
        &self,
        previous: f64,
        training_stress_score: f64,
    ) -> Result<f64, CalculationError> {
        const CALCULATION: &str = "acute training load";

        let time_constant = self.config.atl_time_constant;
        self.check_time_constant(CALCULATION, time_constant)?;
        let atl = metrics::acute_training_load(previous, training_stress_score, time_constant);
        self.check_finite(CALCULATION, atl)
    }

    fn check_time_constant(
        &self,
        calculation: &str,
        time_constant: f64,
    ) -> Result<(), CalculationError> {
        if self.config.is_strict() && (!time_constant.is_finite() || time_constant <= 0.0) {
            return Err(CalculationError::invalid_parameter(
                calculation,
                "time_constant",
                time_constant,
            ));
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

    /// Fold an ordered sequence of daily TSS values into a PMC series
    pub fn project(
        &self,
        initial: TrainingLoad,
        daily_scores: &[f64],
    ) -> Result<Vec<PmcMetrics>, CalculationError> {
        self.fold_days(initial, daily_scores.iter().map(|&tss| (None, tss)))
    }

    /// PMC series for every calendar day from `start_date` to `end_date`.
    ///
    /// Days missing from `daily_tss` count as rest days (TSS 0).
    pub fn calculate_series(
        &self,
        daily_tss: &BTreeMap<NaiveDate, f64>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial: TrainingLoad,
    ) -> Result<Vec<PmcMetrics>, CalculationError> {
        if start_date > end_date {
            return Err(CalculationError::InvalidDateRange {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }

        let days = start_date
            .iter_days()
            .take_while(|date| *date <= end_date)
            .map(|date| (Some(date), daily_tss.get(&date).copied().unwrap_or(0.0)));

        self.fold_days(initial, days)
    }

    /// In strict mode every input and every load must be finite
    fn fold_days(
        &self,
        initial: TrainingLoad,
        days: impl Iterator<Item = (Option<NaiveDate>, f64)>,
    ) -> Result<Vec<PmcMetrics>, CalculationError> {
        const CALCULATION: &str = "PMC series";
        let strict = self.config.is_strict();

        if strict {
            self.check_time_constant(CALCULATION, self.config.ctl_time_constant)?;
            self.check_time_constant(CALCULATION, self.config.atl_time_constant)?;
            for (parameter, value) in [("initial_ctl", initial.ctl), ("initial_atl", initial.atl)] {
                if !value.is_finite() {
                    return Err(CalculationError::invalid_parameter(CALCULATION, parameter, value));
                }
            }
        }

        let mut series: Vec<PmcMetrics> = Vec::new();
        let mut ctl_history = vec![initial.ctl];
        let mut load = initial;

        for (day, (date, daily_tss)) in days.enumerate() {
            if strict && !daily_tss.is_finite() {
                return Err(CalculationError::invalid_parameter(
                    CALCULATION,
                    "daily_tss",
                    daily_tss,
                ));
            }

            let tsb = load.balance();
            load = load.advance(daily_tss, &self.config);
            if strict && !(load.ctl.is_finite() && load.atl.is_finite()) {
                return Err(CalculationError::non_finite(CALCULATION));
            }
            ctl_history.push(load.ctl);

            series.push(PmcMetrics {
                date,
                day,
                daily_tss,
                ctl: load.ctl,
                atl: load.atl,
                tsb,
                ctl_ramp_rate: self.ctl_ramp_rate(&ctl_history),
            });
        }

        debug!(
            days = series.len(),
            ctl = load.ctl,
            atl = load.atl,
            "Calculated PMC series"
        );

        Ok(series)
    }

    /// CTL change per week over the configured ramp period
    fn ctl_ramp_rate(&self, ctl_history: &[f64]) -> Option<f64> {
        let days = self.config.ramp_rate_days as usize;
        if days == 0 || ctl_history.len() <= days {
            return None;
        }

        let recent_ctl = ctl_history[ctl_history.len() - 1];
        let past_ctl = ctl_history[ctl_history.len() - 1 - days];
        let weeks = days as f64 / 7.0;

        Some((recent_ctl - past_ctl) / weeks)
    }

    /// Analyze PMC trends over a period
    pub fn analyze_trends(
        &self,
        pmc_series: &[PmcMetrics],
    ) -> Result<PmcTrends, CalculationError> {
        let (first, last) = match pmc_series {
            [first, .., last] => (first, last),
            _ => {
                return Err(CalculationError::InsufficientData {
                    calculation: "PMC trends".to_string(),
                    reason: "need at least 2 days".to_string(),
                })
            }
        };

        let ramp_rates: Vec<f64> = pmc_series.iter().filter_map(|m| m.ctl_ramp_rate).collect();
        let avg_ctl_ramp_rate = if ramp_rates.is_empty() {
            0.0
        } else {
            ramp_rates.iter().sum::<f64>() / ramp_rates.len() as f64
        };

        Ok(PmcTrends {
            ctl_trend: Self::determine_trend(first.ctl, last.ctl),
            atl_trend: Self::determine_trend(first.atl, last.atl),
            tsb_trend: Self::determine_trend(first.tsb, last.tsb),
            avg_ctl_ramp_rate,
        })
    }

    /// Trend direction with a 5% change threshold
    fn determine_trend(start: f64, end: f64) -> TrendDirection {
        let percent_change = (end - start) / start.abs().max(1.0);

        if percent_change > 0.05 {
            TrendDirection::Increasing
        } else if percent_change < -0.05 {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }
}
