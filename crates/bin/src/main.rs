//! Accrete CLI binary.
//!
//! Provides the command-line interface for growth accounting reports.

mod integration;

use accrete::Analysis;
use accrete::data::FieldBinding;
use accrete::engine::{CohortConfig, FrequencyConfig, Granularity, GrowthConfig, RollingConfig};
use accrete::output::{
    CohortExport, FrequencyExport, GrowthAccountingExport, GrowthSummary, RollingWindowExport,
    to_export,
};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use integration::progress::window_progress;
use integration::render::{OutputFormat, OutputTarget, emit, write_rows};
use integration::settings::{BindingOverrides, RunConfig};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "accrete")]
#[command(about = "Accrete: growth accounting for active users and revenue", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file with report parameters and column bindings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(flatten)]
    binding: BindingArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Args)]
struct BindingArgs {
    /// Column holding the user identifier
    #[arg(long, global = true)]
    user_col: Option<String>,

    /// Column holding the activity date
    #[arg(long, global = true)]
    date_col: Option<String>,

    /// Column holding the activity amount
    #[arg(long, global = true)]
    amount_col: Option<String>,

    /// Column holding a segment label
    #[arg(long, global = true)]
    segment_col: Option<String>,

    /// chrono format string for the date column
    #[arg(long, global = true)]
    date_format: Option<String>,
}

#[derive(Args)]
struct OutputArgs {
    /// Write to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Wrap JSON output in a timestamped report with its parameters
    #[arg(long)]
    envelope: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Weekly or monthly growth accounting
    Growth {
        /// Activity CSV file
        input: PathBuf,

        /// Period granularity (week or month)
        #[arg(long)]
        granularity: Option<Granularity>,

        /// Drop the final, possibly incomplete, period
        #[arg(long)]
        drop_trailing: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rolling quick ratio over trailing windows
    Rolling {
        /// Activity CSV file
        input: PathBuf,

        /// Window lengths in days
        #[arg(long, value_delimiter = ',')]
        window_days: Option<Vec<u32>>,

        /// Split every window by segment
        #[arg(long)]
        segment: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Cohort retention by acquisition period
    Cohort {
        /// Activity CSV file
        input: PathBuf,

        /// Period granularity (week or month)
        #[arg(long)]
        granularity: Option<Granularity>,

        /// Drop this many most recent completed periods
        #[arg(long)]
        lookback: Option<u32>,

        /// Keep the period containing the as-of date
        #[arg(long)]
        include_current: bool,

        /// Date that defines the current period (default: today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// DAU/XAU usage frequency
    Frequency {
        /// Activity CSV file
        input: PathBuf,

        /// Window length in days
        #[arg(long)]
        window_days: Option<u32>,

        /// Active-day thresholds for the breakout columns
        #[arg(long, value_delimiter = ',')]
        thresholds: Option<Vec<u32>>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

impl From<OutputArgs> for OutputTarget {
    fn from(args: OutputArgs) -> Self {
        Self {
            path: args.output,
            format: args.format,
            envelope: args.envelope,
        }
    }
}

impl From<BindingArgs> for BindingOverrides {
    fn from(args: BindingArgs) -> Self {
        Self {
            user_id: args.user_col,
            activity_date: args.date_col,
            amount: args.amount_col,
            segment: args.segment_col,
            date_format: args.date_format,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    let mut settings = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    settings.apply_binding(cli.binding.into());

    match cli.command {
        Commands::Growth {
            input,
            granularity,
            drop_trailing,
            output,
        } => {
            let mut config = settings.analysis.growth;
            if let Some(granularity) = granularity {
                config.granularity = granularity;
            }
            config.drop_trailing_period |= drop_trailing;
            growth_report(&input, &settings.binding, &config, output.into())?;
        }
        Commands::Rolling {
            input,
            window_days,
            segment,
            output,
        } => {
            let mut config = settings.analysis.rolling;
            if let Some(window_days) = window_days {
                config.window_days = window_days;
            }
            config.use_segment |= segment;
            rolling_report(&input, &settings.binding, &config, output.into())?;
        }
        Commands::Cohort {
            input,
            granularity,
            lookback,
            include_current,
            as_of,
            output,
        } => {
            let mut config = settings.analysis.cohort;
            if let Some(granularity) = granularity {
                config.granularity = granularity;
            }
            if let Some(lookback) = lookback {
                config.lookback_periods = lookback;
            }
            config.include_current_period |= include_current;
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            cohort_report(&input, &settings.binding, &config, as_of, output.into())?;
        }
        Commands::Frequency {
            input,
            window_days,
            thresholds,
            output,
        } => {
            let mut config = settings.analysis.frequency;
            if let Some(window_days) = window_days {
                config.window_days = window_days;
            }
            if let Some(thresholds) = thresholds {
                config.thresholds = thresholds;
            }
            frequency_report(&input, &settings.binding, &config, output.into())?;
        }
    }

    Ok(())
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn load(
    input: &Path,
    binding: &FieldBinding,
) -> Result<Analysis, Box<dyn std::error::Error>> {
    let analysis = Analysis::from_csv(input, binding)?;
    let activity = analysis.activity();
    info!(
        input = %input.display(),
        users = activity.user_count(),
        first_date = %activity.first_date(),
        last_date = %activity.last_date(),
        "activity loaded"
    );
    Ok(analysis)
}

fn growth_report(
    input: &Path,
    binding: &FieldBinding,
    config: &GrowthConfig,
    target: OutputTarget,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let analysis = load(input, binding)?;
    let rows = analysis.growth_accounting(config)?;

    let title = input
        .file_stem()
        .map_or_else(|| "activity".to_string(), |s| s.to_string_lossy().into_owned());
    match target.format {
        OutputFormat::Table => {
            let summary = GrowthSummary::new(title, &rows);
            emit(&summary.to_ascii_table(), target.path.as_deref())
        }
        OutputFormat::Markdown => {
            let summary = GrowthSummary::new(title, &rows);
            emit(&summary.to_markdown(), target.path.as_deref())
        }
        _ => {
            let export: Vec<GrowthAccountingExport> = to_export(&rows);
            write_rows("growth", &export, config, &target)
        }
    }
}

fn rolling_report(
    input: &Path,
    binding: &FieldBinding,
    config: &RollingConfig,
    target: OutputTarget,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let analysis = load(input, binding)?;

    let pb = window_progress(analysis.rolling_window_count(config), "rolling windows")?;
    let rows = analysis.rolling_quick_ratio_with_progress(config, |_| pb.inc(1))?;
    pb.finish_and_clear();

    if rows.is_empty() {
        warn!("activity spans fewer days than twice the shortest window; no rows produced");
    }
    let export: Vec<RollingWindowExport> = to_export(&rows);
    write_rows("rolling", &export, config, &target)
}

fn cohort_report(
    input: &Path,
    binding: &FieldBinding,
    config: &CohortConfig,
    as_of: NaiveDate,
    target: OutputTarget,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let analysis = load(input, binding)?;
    let rows = analysis.cohort_retention(config, as_of)?;

    let export: Vec<CohortExport> = to_export(&rows);
    let parameters = serde_json::json!({
        "granularity": config.granularity,
        "lookback_periods": config.lookback_periods,
        "include_current_period": config.include_current_period,
        "as_of": as_of,
    });
    write_rows("cohort", &export, &parameters, &target)
}

fn frequency_report(
    input: &Path,
    binding: &FieldBinding,
    config: &FrequencyConfig,
    target: OutputTarget,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let analysis = load(input, binding)?;

    let pb = window_progress(analysis.frequency_window_count(config), "frequency windows")?;
    let rows = analysis.frequency_with_progress(config, |_| pb.inc(1))?;
    pb.finish_and_clear();

    let export: Vec<FrequencyExport> = to_export(&rows);
    write_rows("frequency", &export, config, &target)
}
