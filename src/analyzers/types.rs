//! Data types shared by the curve pipeline and the supplementary aggregations.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of the raw input table: a location's figures for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location: String,
    pub iso_code: String,
    pub continent: String,
    pub date: NaiveDate,
    pub new_cases: i64,
    pub new_deaths: i64,
    pub population: Option<f64>,
    pub life_expectancy: Option<f64>,
}

impl Observation {
    pub fn new(location: &str, date: NaiveDate, new_cases: i64, new_deaths: i64) -> Self {
        Observation {
            location: location.to_string(),
            iso_code: String::new(),
            continent: String::new(),
            date,
            new_cases,
            new_deaths,
            population: None,
            life_expectancy: None,
        }
    }

    /// Set population and life expectancy
    pub fn with_population(mut self, population: f64, life_expectancy: Option<f64>) -> Self {
        self.population = Some(population);
        self.life_expectancy = life_expectancy;
        self
    }

    /// Set ISO code and continent
    pub fn with_region(mut self, iso_code: &str, continent: &str) -> Self {
        self.iso_code = iso_code.to_string();
        self.continent = continent.to_string();
        self
    }
}

/// The measure summed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cases,
    Deaths,
}

impl Metric {
    pub fn value(self, obs: &Observation) -> i64 {
        match self {
            Metric::Cases => obs.new_cases,
            Metric::Deaths => obs.new_deaths,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cases => f.write_str("cases"),
            Metric::Deaths => f.write_str("deaths"),
        }
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cases" | "new_cases" => Ok(Metric::Cases),
            "deaths" | "new_deaths" => Ok(Metric::Deaths),
            other => bail!("unknown metric '{other}' (expected cases or deaths)"),
        }
    }
}

/// Magnitude category of a day's `new_cases`, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Negative,
    Zero,
    Low,
    Mid,
    High,
    VeryHigh,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Bucket::Negative,
        Bucket::Zero,
        Bucket::Low,
        Bucket::Mid,
        Bucket::High,
        Bucket::VeryHigh,
    ];

    /// Short display label, as shown in chart legends.
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Negative => "lt 0",
            Bucket::Zero => "0",
            Bucket::Low => "lt 50",
            Bucket::Mid => "50-100",
            Bucket::High => "100-300",
            Bucket::VeryHigh => "gt 300",
        }
    }

    /// Only qualifying days feed the cumulative series.
    pub fn is_qualifying(self) -> bool {
        !matches!(self, Bucket::Negative | Bucket::Zero)
    }
}

/// Upper bounds of the positive buckets.
///
/// `LOW` is `(0, low_max)`, `MID` is `[low_max, mid_max)`, `HIGH` is
/// `[mid_max, high_max]` and anything above `high_max` is `VERY_HIGH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketThresholds {
    pub low_max: i64,
    pub mid_max: i64,
    pub high_max: i64,
}

impl Default for BucketThresholds {
    fn default() -> Self {
        BucketThresholds {
            low_max: 50,
            mid_max: 100,
            high_max: 300,
        }
    }
}

impl BucketThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.low_max <= 0 || self.low_max >= self.mid_max || self.mid_max >= self.high_max {
            bail!(
                "bucket thresholds must be positive and strictly increasing, got {} / {} / {}",
                self.low_max,
                self.mid_max,
                self.high_max
            );
        }
        Ok(())
    }
}

/// How `days_since_threshold` is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBasis {
    /// Count of qualifying days up to and including the point's date.
    #[default]
    QualifyingDays,
    /// Count of every observed date of the location, qualifying or not.
    AllDays,
}

impl FromStr for DayBasis {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "qualifying_days" | "qualifying" => Ok(DayBasis::QualifyingDays),
            "all_days" | "all" => Ok(DayBasis::AllDays),
            other => bail!("unknown day basis '{other}' (expected qualifying_days or all_days)"),
        }
    }
}

/// An observation paired with its bucket.
#[derive(Debug, Clone, Copy)]
pub struct Bucketed<'a> {
    pub observation: &'a Observation,
    pub bucket: Bucket,
}

/// Running metric total for a location on a qualifying date.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeValue {
    pub location: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// Running day count for a location on a qualifying date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeDays {
    pub location: String,
    pub date: NaiveDate,
    pub days: u32,
}

/// The two series produced by the accumulator.
#[derive(Debug, Default)]
pub struct Accumulated {
    pub metric: Vec<CumulativeValue>,
    pub days: Vec<CumulativeDays>,
}

/// One plottable point of a "days since threshold" curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPoint {
    pub location: String,
    pub date: NaiveDate,
    pub cum_metric: f64,
    pub days_since_threshold: u32,
}

/// A location's total burden and its position in the ranking (1-based).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRanking {
    pub location: String,
    pub total_metric: f64,
    pub secondary_total: f64,
    pub rank: usize,
}

/// Complete curve output for one metric, written as JSON.
#[derive(Debug, Serialize)]
pub struct CurveReport {
    pub schema_version: u8,
    pub metric: Metric,
    pub secondary_metric: Metric,
    pub day_basis: DayBasis,
    pub generated_at: DateTime<Utc>,
    pub top_n: usize,
    pub ranking: Vec<LocationRanking>,
    pub points: Vec<AlignedPoint>,
}

/// A value divided by population, or `Undefined` when population is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum Rate {
    Defined(f64),
    Undefined,
}

impl Rate {
    pub fn per_population(value: f64, population: Option<f64>) -> Rate {
        match population {
            Some(p) if Rate::is_usable_population(population) => Rate::Defined(value / p),
            _ => Rate::Undefined,
        }
    }

    /// A population can divide only when present, finite and positive.
    pub fn is_usable_population(population: Option<f64>) -> bool {
        population.is_some_and(|p| p.is_finite() && p > 0.0)
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Rate::Defined(v) => Some(v),
            Rate::Undefined => None,
        }
    }
}

/// Month-by-month cumulative totals of a location relative to its population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationRate {
    pub location: String,
    pub year: i32,
    pub month: u32,
    pub abb_month: String,
    pub population: Option<f64>,
    pub life_expectancy: Option<f64>,
    pub cum_cases: i64,
    pub cum_deaths: i64,
    pub cases_per_pop: Rate,
    pub deaths_per_pop: Rate,
}

/// Cases and deaths of one location over one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub location: String,
    pub iso_code: String,
    pub continent: String,
    pub year: i32,
    pub month: u32,
    pub abb_month: String,
    pub new_cases: i64,
    pub new_deaths: i64,
}

/// One bar of the daily cases & deaths chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub new_cases: i64,
    pub new_deaths: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_from_str() {
        assert_eq!("cases".parse::<Metric>().unwrap(), Metric::Cases);
        assert_eq!("new_deaths".parse::<Metric>().unwrap(), Metric::Deaths);
        assert_eq!(" Deaths ".parse::<Metric>().unwrap(), Metric::Deaths);
        assert!("tests".parse::<Metric>().is_err());
    }

    #[test]
    fn test_day_basis_from_str() {
        assert_eq!(
            "qualifying-days".parse::<DayBasis>().unwrap(),
            DayBasis::QualifyingDays
        );
        assert_eq!("all".parse::<DayBasis>().unwrap(), DayBasis::AllDays);
        assert!("weeks".parse::<DayBasis>().is_err());
    }

    #[test]
    fn test_thresholds_validate() {
        assert!(BucketThresholds::default().validate().is_ok());
        let bad = BucketThresholds {
            low_max: 100,
            mid_max: 100,
            high_max: 300,
        };
        assert!(bad.validate().is_err());
        let zero = BucketThresholds {
            low_max: 0,
            mid_max: 10,
            high_max: 20,
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_rate_per_population() {
        assert_eq!(Rate::per_population(50.0, Some(1000.0)), Rate::Defined(0.05));
        assert_eq!(Rate::per_population(50.0, Some(0.0)), Rate::Undefined);
        assert_eq!(Rate::per_population(50.0, None), Rate::Undefined);
        assert_eq!(Rate::per_population(50.0, Some(f64::NAN)), Rate::Undefined);
        assert_eq!(Rate::Undefined.value(), None);
    }

    #[test]
    fn test_usable_population() {
        assert!(Rate::is_usable_population(Some(1.0)));
        assert!(!Rate::is_usable_population(Some(0.0)));
        assert!(!Rate::is_usable_population(Some(-5.0)));
        assert!(!Rate::is_usable_population(Some(f64::INFINITY)));
        assert!(!Rate::is_usable_population(None));
    }

    #[test]
    fn test_rate_serializes_with_status() {
        let json = serde_json::to_string(&Rate::Undefined).unwrap();
        assert_eq!(json, r#"{"status":"undefined"}"#);
        let json = serde_json::to_string(&Rate::Defined(0.5)).unwrap();
        assert_eq!(json, r#"{"status":"defined","value":0.5}"#);
    }
}
