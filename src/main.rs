//! CLI entry point for covid_curves.
//!
//! Loads a COVID-19 dataset, builds "days since threshold" curves and the
//! supporting rankings, monthly totals and per-population rates, and writes
//! them as JSON for a chart layer to consume.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use covid_curves::analyzers::curves::build_curves;
use covid_curves::analyzers::daily::daily_series;
use covid_curves::analyzers::monthly::monthly_totals;
use covid_curves::analyzers::rank::{rank_locations, top_n};
use covid_curves::analyzers::rates::monthly_per_population;
use covid_curves::analyzers::types::{DayBasis, Metric, Observation};
use covid_curves::{
    config::PipelineConfig,
    fetch::{DEFAULT_DATA_URL, load_source},
    ingest::parse_observations,
    output::{print_json, write_json, write_points_csv},
    summary::DatasetSummary,
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "covid_curves")]
#[command(about = "Normalize COVID-19 case and death curves across countries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DatasetArgs {
    /// Path or URL of the dataset (defaults to $COVID_DATA_URL, then the OWID CSV)
    #[arg(short, long, value_name = "FILE_OR_URL")]
    source: Option<String>,

    /// JSON file with pipeline parameters
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the "days since threshold" curves for one metric
    Curves {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Metric to accumulate: cases or deaths
        #[arg(short, long, default_value = "cases")]
        metric: Metric,

        /// Number of locations to keep (overrides the config)
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// How days are counted: qualifying_days or all_days (overrides the config)
        #[arg(long)]
        day_basis: Option<DayBasis>,

        /// JSON report destination
        #[arg(short, long, default_value = "curves.json")]
        output: String,

        /// Optional CSV export of the curve points
        #[arg(long)]
        csv: Option<String>,

        /// Gzip compress the JSON report
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Build every dashboard dataset and write one JSON file each
    Report {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Directory to write the reports to
        #[arg(short = 'd', long, default_value = "reports")]
        output_dir: String,

        /// Only count months after this date for monthly views
        #[arg(long, default_value = "2020-01-01")]
        since: NaiveDate,

        /// Gzip compress the JSON reports
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Rank locations by total burden
    Rank {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Primary ranking metric
        #[arg(short, long, default_value = "cases")]
        metric: Metric,

        /// Number of locations to show (overrides the config)
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },
    /// Show row, location, bucket and continent counts
    Summary {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Show daily cases and deaths of one location
    Daily {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Location name, e.g. "France"
        #[arg(short, long)]
        location: String,

        /// First date to include
        #[arg(long, default_value = "2020-03-01")]
        since: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/covid_curves.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("covid_curves.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Curves {
            dataset,
            metric,
            top_n,
            day_basis,
            output,
            csv,
            gzip,
        } => {
            let (config, observations) = load_dataset(&dataset).await?;
            let mut options = config.curve_options(metric);
            if let Some(n) = top_n {
                options.top_n = n;
            }
            if let Some(basis) = day_basis {
                options.day_basis = basis;
            }

            let report = build_curves(&observations, &options);
            if report.points.is_empty() {
                warn!(%metric, "No qualifying days in the selected locations");
            }

            let path = write_json(&output, &report, gzip)?;
            info!(path = %path.display(), points = report.points.len(), "Curve report written");

            if let Some(csv_path) = csv {
                write_points_csv(&csv_path, &report.points)?;
                info!(path = %csv_path, "Curve points written");
            }
        }
        Commands::Report {
            dataset,
            output_dir,
            since,
            gzip,
        } => {
            let (config, observations) = load_dataset(&dataset).await?;
            write_reports(&config, observations, &output_dir, since, gzip).await?;
        }
        Commands::Rank {
            dataset,
            metric,
            top_n,
        } => {
            let (config, observations) = load_dataset(&dataset).await?;
            let n = top_n.unwrap_or(config.top_n);

            let ranking = rank_locations(&observations, metric, config.secondary_metric);
            for entry in ranking.iter().take(n) {
                info!(
                    rank = entry.rank,
                    location = %entry.location,
                    total = entry.total_metric,
                    secondary = entry.secondary_total,
                    "Location"
                );
            }
            info!(locations = ranking.len(), shown = n.min(ranking.len()), %metric, "Ranking summary");
        }
        Commands::Summary { dataset } => {
            let (config, observations) = load_dataset(&dataset).await?;
            let summary = DatasetSummary::from_observations(&observations, &config.thresholds);
            print_json(&summary)?;
        }
        Commands::Daily {
            dataset,
            location,
            since,
        } => {
            let (_, observations) = load_dataset(&dataset).await?;
            let series = daily_series(&observations, &location, since);
            if series.is_empty() {
                warn!(location = %location, "No rows for location");
            }
            print_json(&series)?;
        }
    }

    Ok(())
}

/// Resolves the source, loads the config and parses the dataset.
async fn load_dataset(args: &DatasetArgs) -> Result<(PipelineConfig, Vec<Observation>)> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let source = args
        .source
        .clone()
        .or_else(|| std::env::var("COVID_DATA_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATA_URL.to_string());

    let bytes = load_source(&source).await?;
    let ingested = parse_observations(&bytes, &config.ingest_options())?;
    if ingested.rejected > 0 {
        warn!(rejected = ingested.rejected, "Some rows were rejected");
    }

    Ok((config, ingested.observations))
}

/// Builds the cases and deaths curves concurrently, then the monthly and
/// per-population views, writing each to `output_dir`.
#[tracing::instrument(skip(config, observations), fields(rows = observations.len()))]
async fn write_reports(
    config: &PipelineConfig,
    observations: Vec<Observation>,
    output_dir: &str,
    since: NaiveDate,
    gzip: bool,
) -> Result<()> {
    let observations: Arc<[Observation]> = observations.into();

    let summary = DatasetSummary::from_observations(&observations, &config.thresholds);
    info!(
        rows = summary.rows,
        locations = summary.locations,
        qualifying = summary.qualifying_rows(),
        "Dataset loaded"
    );

    let tasks: Vec<_> = [Metric::Cases, Metric::Deaths]
        .into_iter()
        .map(|metric| {
            let observations = Arc::clone(&observations);
            let options = config.curve_options(metric);
            tokio::task::spawn_blocking(move || build_curves(&observations, &options))
        })
        .collect();

    for task in tasks {
        let report = task.await?;
        let path = format!("{}/curves_{}.json", output_dir, report.metric);
        write_json(&path, &report, gzip)?;
    }

    let monthly = monthly_totals(&observations, since);
    write_json(&format!("{output_dir}/monthly_totals.json"), &monthly, gzip)?;

    let top_locations = top_n(
        &observations,
        config.top_n,
        Metric::Cases,
        config.secondary_metric,
    );
    let rates = monthly_per_population(&observations, &top_locations, since);
    let undefined = rates
        .iter()
        .filter(|r| r.cases_per_pop.value().is_none())
        .count();
    if undefined > 0 {
        warn!(undefined, "Per-population rates undefined for some months");
    }
    write_json(&format!("{output_dir}/population_rates.json"), &rates, gzip)?;

    write_json(&format!("{output_dir}/summary.json"), &summary, gzip)?;

    info!(output_dir, "Reports written");
    Ok(())
}
