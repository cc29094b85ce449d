//! Heatmap CLI - Command-line interface for the Strava heatmap engine
//!
//! Commands:
//! - insights: Load a data directory and print the insights snapshot
//! - validate: Check a GeoJSON activity file
//! - preview: Project an encoded polyline to SVG path data
//! - streak: Current and longest streaks for an activity file
//! - doctor: Diagnose data directory and configuration

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use strava_heatmap::loader::{load_into, LoadStatus, ResourcePaths};
use strava_heatmap::preview::{svg_path, Canvas};
use strava_heatmap::schema::FeatureAdapter;
use strava_heatmap::time::{parse_day_key, today};
use strava_heatmap::{
    Dashboard, DashboardConfig, InsightsError, RangeSelector, ResourceKind, Selection, VERSION,
};

/// Heatmap - analytics for a personal activity dashboard
#[derive(Parser)]
#[command(name = "heatmap")]
#[command(version = VERSION)]
#[command(about = "Derive dashboard views from Strava activity exports", long_about = None)]
struct Cli {
    /// Configuration file (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a data directory and print the insights snapshot
    Insights {
        /// Directory holding runs.geojson, stats.json, personal_bests.json, runs_index.json
        #[arg(short, long)]
        data_dir: PathBuf,

        /// User-supplied activity file that replaces runs.geojson
        #[arg(long = "override")]
        override_file: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD); defaults to today in the configured zone
        #[arg(long)]
        today: Option<String>,

        /// Range for the monthly and weekday views
        #[arg(long, default_value = "all")]
        range: String,

        /// Year filter
        #[arg(long, default_value = "All")]
        year: String,

        /// Activity type filter
        #[arg(long = "type", default_value = "All")]
        activity_type: String,

        /// Shoe filter
        #[arg(long, default_value = "All")]
        shoe: String,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Check a GeoJSON activity file
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project an encoded polyline to SVG path data
    Preview {
        /// Encoded polyline
        polyline: String,

        /// Coordinate precision (5 or 6); defaults to the configured precision
        #[arg(long)]
        precision: Option<u32>,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,

        #[arg(long)]
        padding: Option<f64>,
    },

    /// Current and longest streaks for an activity file
    Streak {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Qualifying activity type ("All" counts every type); defaults to the configured type
        #[arg(long = "type")]
        activity_type: Option<String>,

        /// Reference date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Diagnose data directory and configuration
    Doctor {
        /// Data directory to check
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), HeatmapCliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Insights {
            data_dir,
            override_file,
            today,
            range,
            year,
            activity_type,
            shoe,
            output_format,
        } => {
            let filters = InsightsFilters {
                range: range.parse()?,
                year: Selection::from_label(&year),
                activity_type: Selection::from_label(&activity_type),
                shoe: Selection::from_label(&shoe),
            };
            cmd_insights(
                config,
                &data_dir,
                override_file.as_deref(),
                today.as_deref(),
                filters,
                output_format,
            )
        }

        Commands::Validate { input, json } => cmd_validate(&config, &input, json),

        Commands::Preview {
            polyline,
            precision,
            width,
            height,
            padding,
        } => {
            let defaults = config.preview;
            let canvas = Canvas {
                width: width.unwrap_or(defaults.width),
                height: height.unwrap_or(defaults.height),
                padding: padding.unwrap_or(defaults.padding),
            };
            let precision = precision.unwrap_or(config.polyline_precision);
            println!("{}", svg_path(&polyline, precision, &canvas)?);
            Ok(())
        }

        Commands::Streak {
            input,
            activity_type,
            today,
        } => cmd_streak(config, &input, activity_type, today.as_deref()),

        Commands::Doctor { data_dir, json } => cmd_doctor(&config, data_dir.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig, HeatmapCliError> {
    match path {
        Some(path) => {
            let config = DashboardConfig::from_json(&fs::read_to_string(path)?)?;
            info!("loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(DashboardConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, HeatmapCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn reference_date(today_arg: Option<&str>, config: &DashboardConfig) -> Result<NaiveDate, HeatmapCliError> {
    match today_arg {
        Some(day) => Ok(parse_day_key(day)?),
        None => Ok(today(&config.timezone)),
    }
}

struct InsightsFilters {
    range: RangeSelector,
    year: Selection,
    activity_type: Selection,
    shoe: Selection,
}

fn cmd_insights(
    config: DashboardConfig,
    data_dir: &Path,
    override_file: Option<&Path>,
    today_arg: Option<&str>,
    filters: InsightsFilters,
    output_format: OutputFormat,
) -> Result<(), HeatmapCliError> {
    let today = reference_date(today_arg, &config)?;
    let mut dashboard = Dashboard::with_config(config);

    if let Some(path) = override_file {
        dashboard.load_override(&read_input(path)?)?;
    }

    let report = load_into(&mut dashboard, &ResourcePaths::in_dir(data_dir));
    info!(
        "loaded {} of {} resources",
        report.loaded_count(),
        report.outcomes.len()
    );

    dashboard.set_year(filters.year);
    dashboard.set_activity_type(filters.activity_type);
    dashboard.set_shoe(filters.shoe);
    dashboard.set_range(filters.range);

    let snapshot = dashboard.snapshot(today);
    let output = match output_format {
        OutputFormat::Json => snapshot.to_json()?,
        OutputFormat::JsonPretty => snapshot.to_json_pretty()?,
    };
    println!("{output}");
    Ok(())
}

fn cmd_validate(config: &DashboardConfig, input: &Path, json: bool) -> Result<(), HeatmapCliError> {
    let input_data = read_input(input)?;
    let reports = FeatureAdapter::validate(&input_data, &config.timezone)?;

    let errors: Vec<ValidationErrorDetail> = reports
        .iter()
        .filter(|r| !r.is_clean())
        .map(|r| ValidationErrorDetail {
            index: r.index,
            activity_id: r.activity_id.clone(),
            issues: r.issues.iter().map(|i| i.to_string()).collect(),
        })
        .collect();
    let report = ValidationReport {
        total_features: reports.len(),
        clean_features: reports.len() - errors.len(),
        flagged_features: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total features:   {}", report.total_features);
        println!("Clean features:   {}", report.clean_features);
        println!("Flagged features: {}", report.flagged_features);

        if !report.errors.is_empty() {
            println!("\nIssues:");
            for err in &report.errors {
                println!(
                    "  - Activity {} (index {}): {}",
                    err.activity_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.issues.join("; ")
                );
            }
        }
    }

    // Flagged features are still usable by the views that do not need them
    if report.total_features == 0 {
        Err(HeatmapCliError::NoFeatures)
    } else {
        Ok(())
    }
}

fn cmd_streak(
    config: DashboardConfig,
    input: &Path,
    activity_type: Option<String>,
    today_arg: Option<&str>,
) -> Result<(), HeatmapCliError> {
    let today = reference_date(today_arg, &config)?;
    let activities = FeatureAdapter::parse_collection(&read_input(input)?, &config.timezone)?;

    let detector = match activity_type {
        Some(label) => config
            .streak_detector()
            .with_activity_type(match Selection::from_label(&label) {
                Selection::All => None,
                Selection::Only(t) => Some(t),
            }),
        None => config.streak_detector(),
    };

    let summary = detector.summarize(&activities, today);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_doctor(
    config: &DashboardConfig,
    data_dir: Option<&Path>,
    json: bool,
) -> Result<(), HeatmapCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Heatmap engine version {VERSION}"),
        },
        DoctorCheck {
            name: "timezone".to_string(),
            status: CheckStatus::Ok,
            message: format!("Buckets computed in {}", config.timezone.name()),
        },
    ];

    match data_dir {
        Some(dir) if dir.is_dir() => {
            let mut dashboard = Dashboard::with_config(config.clone());
            let report = load_into(&mut dashboard, &ResourcePaths::in_dir(dir));
            for outcome in &report.outcomes {
                let (status, message) = match &outcome.status {
                    LoadStatus::Loaded => (CheckStatus::Ok, format!("{} loaded", outcome.path)),
                    LoadStatus::Ignored => (
                        CheckStatus::Ok,
                        format!("{} skipped for a user override", outcome.path),
                    ),
                    LoadStatus::Missing => {
                        (CheckStatus::Warning, format!("{} not found", outcome.path))
                    }
                    LoadStatus::Failed { reason } => {
                        (CheckStatus::Error, format!("{}: {reason}", outcome.path))
                    }
                };
                checks.push(DoctorCheck {
                    name: outcome.resource.as_str().to_string(),
                    status,
                    message,
                });
            }

            if dashboard.is_loaded(ResourceKind::Activities) {
                let issues = dashboard
                    .activities()
                    .iter()
                    .filter(|a| a.start.is_none())
                    .count();
                checks.push(DoctorCheck {
                    name: "activity_dates".to_string(),
                    status: if issues == 0 {
                        CheckStatus::Ok
                    } else {
                        CheckStatus::Warning
                    },
                    message: format!(
                        "{} activities, {} without a start date",
                        dashboard.activities().len(),
                        issues
                    ),
                });
            }
        }
        Some(dir) => checks.push(DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Error,
            message: format!("{} is not a directory", dir.display()),
        }),
        None => checks.push(DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Warning,
            message: "No data directory given".to_string(),
        }),
    }

    let report = DoctorReport {
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Heatmap Doctor Report");
        println!("=====================");
        println!("Version: {}\n", report.version);
        for check in &report.checks {
            let marker = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERROR]",
            };
            println!("{:8} {}: {}", marker, check.name, check.message);
        }
    }

    if report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error))
    {
        Err(HeatmapCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum HeatmapCliError {
    Io(io::Error),
    Insights(InsightsError),
    Json(serde_json::Error),
    NoFeatures,
    DoctorFailed,
}

impl From<io::Error> for HeatmapCliError {
    fn from(e: io::Error) -> Self {
        HeatmapCliError::Io(e)
    }
}

impl From<InsightsError> for HeatmapCliError {
    fn from(e: InsightsError) -> Self {
        match e {
            InsightsError::Io(e) => HeatmapCliError::Io(e),
            other => HeatmapCliError::Insights(other),
        }
    }
}

impl From<serde_json::Error> for HeatmapCliError {
    fn from(e: serde_json::Error) -> Self {
        HeatmapCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HeatmapCliError> for CliError {
    fn from(e: HeatmapCliError) -> Self {
        match e {
            HeatmapCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HeatmapCliError::Insights(e) => {
                let (code, hint) = match &e {
                    InsightsError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Run 'heatmap doctor' to check the configuration")
                    }
                    InsightsError::InvalidTimezone(_) => {
                        ("TIMEZONE_ERROR", "Use an IANA zone name such as Pacific/Auckland")
                    }
                    InsightsError::InvalidRange(_) => {
                        ("RANGE_ERROR", "Use one of 1m, 3m, 6m, 12m, all")
                    }
                    InsightsError::DateParseError(_) => ("DATE_ERROR", "Use YYYY-MM-DD"),
                    InsightsError::Polyline(_) => {
                        ("POLYLINE_ERROR", "Check the encoded string and its precision")
                    }
                    _ => ("PARSE_ERROR", "Run 'heatmap validate' for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            HeatmapCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HeatmapCliError::NoFeatures => CliError {
                code: "NO_FEATURES".to_string(),
                message: "No features found in input".to_string(),
                hint: Some("Ensure the input is a non-empty FeatureCollection".to_string()),
            },
            HeatmapCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_features: usize,
    clean_features: usize,
    flagged_features: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    activity_id: Option<String>,
    issues: Vec<String>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
