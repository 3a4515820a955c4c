use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

use powerload::config::{AppConfig, MetricsConfig, ValidationMode};
use powerload::error::PowerLoadError;
use powerload::logging::init_logging;
use powerload::metrics;
use powerload::pmc::{PmcCalculator, PmcMetrics, TrainingLoad, TsbInterpretation};
use powerload::tss::TssCalculator;

/// powerload - Power-based training metrics
///
/// Calculates normalized power, intensity factor, training stress score and
/// the chronic/acute training loads from numbers given on the command line.
#[derive(Parser)]
#[command(name = "powerload")]
#[command(version)]
#[command(about = "Power-based training metrics", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Reject empty input, zero FTP and invalid parameters instead of printing NaN
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalized power of a 1 Hz power series
    Np {
        /// Power samples in watts, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        power: Vec<f64>,

        /// Rolling window in samples (default from config: 30)
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Intensity factor (NP / FTP)
    #[command(name = "if")]
    Intensity {
        #[arg(long)]
        np: f64,

        #[arg(long)]
        ftp: f64,
    },

    /// Training stress score for a session
    Tss {
        /// Session duration in seconds
        #[arg(short, long)]
        duration: f64,

        #[arg(long)]
        np: f64,

        #[arg(long)]
        ftp: f64,
    },

    /// Today's chronic training load from yesterday's
    Ctl {
        #[arg(short, long, allow_negative_numbers = true)]
        previous: f64,

        /// Today's TSS
        #[arg(short, long)]
        score: f64,

        /// Time constant in days (default from config: 42)
        #[arg(short, long)]
        time_constant: Option<f64>,
    },

    /// Today's acute training load from yesterday's
    Atl {
        #[arg(short, long, allow_negative_numbers = true)]
        previous: f64,

        /// Today's TSS
        #[arg(short, long)]
        score: f64,

        /// Time constant in days (default from config: 7)
        #[arg(short, long)]
        time_constant: Option<f64>,
    },

    /// Training stress balance (CTL - ATL)
    Tsb {
        #[arg(long, allow_negative_numbers = true)]
        ctl: f64,

        #[arg(long, allow_negative_numbers = true)]
        atl: f64,
    },

    /// All session metrics for a 1 Hz power series
    Session {
        /// Power samples in watts, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        power: Vec<f64>,

        #[arg(long)]
        ftp: f64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Performance management chart over a sequence of daily TSS values
    Pmc {
        /// Daily TSS values, comma separated, oldest first
        #[arg(short, long, value_delimiter = ',', required = true)]
        scores: Vec<f64>,

        /// Starting chronic training load
        #[arg(long, default_value_t = 0.0)]
        ctl: f64,

        /// Starting acute training load
        #[arg(long, default_value_t = 0.0)]
        atl: f64,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show or initialise the configuration file
    Config {
        /// Print the active configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Tabled)]
struct PmcRow {
    #[tabled(rename = "Day")]
    day: usize,
    #[tabled(rename = "TSS")]
    tss: String,
    #[tabled(rename = "CTL")]
    ctl: String,
    #[tabled(rename = "ATL")]
    atl: String,
    #[tabled(rename = "TSB")]
    tsb: String,
    #[tabled(rename = "Ramp")]
    ramp: String,
}

impl From<&PmcMetrics> for PmcRow {
    fn from(m: &PmcMetrics) -> Self {
        PmcRow {
            day: m.day + 1,
            tss: format!("{:.0}", m.daily_tss),
            ctl: format!("{:.1}", m.ctl),
            atl: format!("{:.1}", m.atl),
            tsb: format!("{:.1}", m.tsb),
            ramp: m
                .ctl_ramp_rate
                .map(|r| format!("{:+.1}", r))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        let message = match err.downcast_ref::<PowerLoadError>() {
            Some(e) => {
                if e.severity().to_tracing_level() == tracing::Level::WARN {
                    tracing::warn!(error = %err, "Command rejected its input");
                } else {
                    tracing::error!(error = %err, "Command failed");
                }
                e.user_message()
            }
            None => {
                tracing::error!(error = %err, "Command failed");
                format!("{:#}", err)
            }
        };
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(1);
    }
}

/// Load the configuration named by `--config`, or the default one.
///
/// `config --init` is allowed to name a file that does not exist yet.
fn load_app_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => {
            let initializing = matches!(cli.command, Commands::Config { init: true, .. });
            if initializing && !path.exists() {
                Ok(AppConfig::default())
            } else {
                AppConfig::load_from_file(path)
            }
        }
        None => Ok(AppConfig::load_or_default()),
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut app_config = load_app_config(&cli)?;

    init_logging(&app_config.logging.clone().with_verbosity(cli.verbose))?;

    if cli.strict {
        app_config.metrics.validation = ValidationMode::Strict;
    }
    let metrics_config = app_config.metrics.clone();

    match cli.command {
        Commands::Np { power, window } => {
            let config = MetricsConfig {
                window_size: window.unwrap_or(metrics_config.window_size),
                ..metrics_config
            };
            let np = TssCalculator::with_config(config)
                .normalized_power(&power)
                .map_err(PowerLoadError::from)?;
            println!("{} {:.1} W", "Normalized power:".bold(), np);
        }

        Commands::Intensity { np, ftp } => {
            let intensity = TssCalculator::with_config(metrics_config)
                .intensity_factor(np, ftp)
                .map_err(PowerLoadError::from)?;
            println!("{} {:.3}", "Intensity factor:".bold(), intensity);
        }

        Commands::Tss { duration, np, ftp } => {
            let tss = TssCalculator::with_config(metrics_config)
                .training_stress_score(duration, np, ftp)
                .map_err(PowerLoadError::from)?;
            println!("{} {:.1}", "Training stress score:".bold(), tss);
        }

        Commands::Ctl {
            previous,
            score,
            time_constant,
        } => {
            let config = MetricsConfig {
                ctl_time_constant: time_constant.unwrap_or(metrics_config.ctl_time_constant),
                ..metrics_config
            };
            let ctl = PmcCalculator::with_config(config)
                .chronic_training_load(previous, score)
                .map_err(PowerLoadError::from)?;
            println!("{} {:.1}", "Chronic training load:".bold(), ctl);
        }

        Commands::Atl {
            previous,
            score,
            time_constant,
        } => {
            let config = MetricsConfig {
                atl_time_constant: time_constant.unwrap_or(metrics_config.atl_time_constant),
                ..metrics_config
            };
            let atl = PmcCalculator::with_config(config)
                .acute_training_load(previous, score)
                .map_err(PowerLoadError::from)?;
            println!("{} {:.1}", "Acute training load:".bold(), atl);
        }

        Commands::Tsb { ctl, atl } => {
            let tsb = metrics::training_stress_balance(ctl, atl);
            let interpretation = TsbInterpretation::from_tsb(tsb);
            println!("{} {:.1}", "Training stress balance:".bold(), tsb);
            println!("  {}", interpretation.description().dimmed());
        }

        Commands::Session { power, ftp, json } => {
            let session = TssCalculator::with_config(metrics_config)
                .session_metrics(&power, ftp)
                .map_err(PowerLoadError::from)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!("{}", "Session metrics".green().bold());
                println!("  Duration:          {:.0} s", session.duration_seconds);
                println!("  Average power:     {:.1} W", session.average_power);
                println!("  Normalized power:  {:.1} W", session.normalized_power);
                println!("  Variability index: {:.2}", session.variability_index);
                println!("  Intensity factor:  {:.3}", session.intensity_factor);
                println!("  TSS:               {:.1}", session.tss);
            }
        }

        Commands::Pmc {
            scores,
            ctl,
            atl,
            format,
        } => {
            let calculator = PmcCalculator::with_config(metrics_config);
            let series = calculator
                .project(TrainingLoad::new(ctl, atl), &scores)
                .map_err(PowerLoadError::from)?;
            print_pmc(&series, format)?;

            if let Some(last) = series.last() {
                let form = TrainingLoad::new(last.ctl, last.atl).balance();
                tracing::info!(ctl = last.ctl, atl = last.atl, tsb = form, "Final training load");
            }
        }

        Commands::Config { show, init } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(AppConfig::default_config_path);

            if init {
                let mut config = AppConfig::default();
                config.save_to_file(&path)?;
                println!("{} {}", "✓ Wrote".green(), path.display());
            }
            if show || !init {
                let content = toml::to_string_pretty(&app_config)
                    .context("Failed to serialize configuration")?;
                println!("{}", format!("# {}", path.display()).dimmed());
                println!("{}", content);
            }
        }
    }

    Ok(())
}

fn print_pmc(series: &[PmcMetrics], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<PmcRow> = series.iter().map(PmcRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));

            if let Some(last) = series.last() {
                let tsb = TrainingLoad::new(last.ctl, last.atl).balance();
                println!(
                    "{} {}",
                    "Current form:".bold(),
                    TsbInterpretation::from_tsb(tsb).description()
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(series)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for metrics in series {
                writer.serialize(metrics)?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}
