use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::bucket::classify_with;
use crate::analyzers::types::{Bucket, BucketThresholds, Observation};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BucketCount {
    pub bucket: Bucket,
    pub label: &'static str,
    pub count: usize,
}

/// Shape of a loaded dataset: size, time span and value counts.
#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub locations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub buckets: Vec<BucketCount>,
    pub continents: BTreeMap<String, usize>,
}

impl DatasetSummary {
    pub fn from_observations(observations: &[Observation], thresholds: &BucketThresholds) -> Self {
        let mut bucket_counts: BTreeMap<Bucket, usize> = BTreeMap::new();
        let mut continents: BTreeMap<String, usize> = BTreeMap::new();
        let mut locations = BTreeSet::new();

        for obs in observations {
            *bucket_counts
                .entry(classify_with(obs.new_cases, thresholds))
                .or_default() += 1;
            if !obs.continent.is_empty() {
                *continents.entry(obs.continent.clone()).or_default() += 1;
            }
            locations.insert(obs.location.as_str());
        }

        DatasetSummary {
            rows: observations.len(),
            locations: locations.len(),
            first_date: observations.iter().map(|o| o.date).min(),
            last_date: observations.iter().map(|o| o.date).max(),
            buckets: Bucket::ALL
                .iter()
                .map(|&bucket| BucketCount {
                    bucket,
                    label: bucket.label(),
                    count: bucket_counts.get(&bucket).copied().unwrap_or(0),
                })
                .collect(),
            continents,
        }
    }

    /// Number of rows that feed the cumulative series.
    pub fn qualifying_rows(&self) -> usize {
        self.buckets
            .iter()
            .filter(|b| b.bucket.is_qualifying())
            .map(|b| b.count)
            .sum()
    }
}
