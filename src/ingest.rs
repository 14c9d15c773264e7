//! CSV reader for OWID-shaped COVID-19 datasets.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::analyzers::types::Observation;

/// Ingestion settings.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Locations dropped on read (aggregates such as "World").
    pub excluded_locations: Vec<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            excluded_locations: vec!["World".to_string()],
        }
    }
}

/// Result of reading a dataset.
#[derive(Debug, Default)]
pub struct Ingested {
    pub observations: Vec<Observation>,
    pub rejected: usize,
    pub excluded: usize,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    location: String,
    date: NaiveDate,
    #[serde(default)]
    iso_code: String,
    #[serde(default)]
    continent: String,
    #[serde(default)]
    new_cases: Option<f64>,
    #[serde(default)]
    new_deaths: Option<f64>,
    #[serde(default)]
    population: Option<f64>,
    #[serde(default)]
    life_expectancy: Option<f64>,
}

const REQUIRED_COLUMNS: &[&str] = &["location", "date"];

/// Parses CSV bytes into observations, in input order.
///
/// Malformed rows are skipped and counted. A missing required column
/// aborts the read.
pub fn parse_observations(bytes: &[u8], options: &IngestOptions) -> Result<Ingested> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers = rdr.headers().context("reading CSV header")?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            bail!("input is missing required column '{column}'");
        }
    }

    let mut out = Ingested::default();

    for (index, result) in rdr.deserialize::<RawRow>().enumerate() {
        let line = index + 2;

        let row = match result.map_err(anyhow::Error::from).and_then(to_observation) {
            Ok(row) => row,
            Err(e) => {
                warn!(line, error = %e, "Rejected malformed row");
                out.rejected += 1;
                continue;
            }
        };

        if options.excluded_locations.iter().any(|l| *l == row.location) {
            out.excluded += 1;
            continue;
        }

        out.observations.push(row);
    }

    info!(
        rows = out.observations.len(),
        rejected = out.rejected,
        excluded = out.excluded,
        "Dataset parsed"
    );

    Ok(out)
}

fn to_observation(raw: RawRow) -> Result<Observation> {
    if raw.location.trim().is_empty() {
        bail!("empty location");
    }

    Ok(Observation {
        new_cases: to_count(raw.new_cases, "new_cases")?,
        new_deaths: to_count(raw.new_deaths, "new_deaths")?,
        location: raw.location,
        iso_code: raw.iso_code,
        continent: raw.continent.to_lowercase(),
        date: raw.date,
        population: raw.population,
        life_expectancy: raw.life_expectancy,
    })
}

/// Empty cells read as 0; anything that is not a whole number in `i64`
/// range is rejected.
fn to_count(value: Option<f64>, column: &str) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    const UPPER: f64 = i64::MAX as f64;
    const LOWER: f64 = i64::MIN as f64;

    match value {
        None => Ok(0),
        Some(v) if !v.is_finite() || v.fract() != 0.0 => {
            bail!("{column} is not a whole number: {v}")
        }
        Some(v) if !(LOWER..UPPER).contains(&v) => bail!("{column} is out of range: {v}"),
        Some(v) => Ok(v as i64),
    }
}
