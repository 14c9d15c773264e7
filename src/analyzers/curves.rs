use crate::analyzers::accumulate::accumulate;
use crate::analyzers::align::align;
use crate::analyzers::bucket::bucketize;
use crate::analyzers::rank::top_ranked;
use crate::analyzers::types::{
    AlignedPoint, BucketThresholds, CurveReport, DayBasis, Metric, Observation,
};
use chrono::Utc;
use std::collections::HashSet;
use tracing::info;

/// Runtime parameters of one curve computation.
#[derive(Debug, Clone)]
pub struct CurveOptions {
    pub metric: Metric,
    pub secondary: Metric,
    pub thresholds: BucketThresholds,
    pub top_n: usize,
    pub day_basis: DayBasis,
}

impl Default for CurveOptions {
    fn default() -> Self {
        CurveOptions {
            metric: Metric::Cases,
            secondary: Metric::Deaths,
            thresholds: BucketThresholds::default(),
            top_n: 30,
            day_basis: DayBasis::QualifyingDays,
        }
    }
}

impl CurveOptions {
    pub fn for_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }
}

/// Builds the "days since threshold" curves of the `top_n` most affected
/// locations.
///
/// The input is only read; every stage derives its own values, so several
/// calls may share one table.
#[tracing::instrument(skip(observations), fields(rows = observations.len()))]
pub fn build_curves(observations: &[Observation], options: &CurveOptions) -> CurveReport {
    let bucketed = bucketize(observations, &options.thresholds);
    let accumulated = accumulate(&bucketed, options.metric, options.day_basis);
    let aligned = align(&accumulated.metric, &accumulated.days);

    let ranking = top_ranked(observations, options.top_n, options.metric, options.secondary);

    let selected: Vec<&str> = ranking.iter().map(|r| r.location.as_str()).collect();
    let points = restrict_to(aligned, &selected);

    info!(
        metric = %options.metric,
        locations = ranking.len(),
        points = points.len(),
        "Curves built"
    );

    CurveReport {
        schema_version: 1,
        metric: options.metric,
        secondary_metric: options.secondary,
        day_basis: options.day_basis,
        generated_at: Utc::now(),
        top_n: options.top_n,
        ranking,
        points,
    }
}

/// Keeps only the points belonging to `locations`.
pub fn restrict_to(points: Vec<AlignedPoint>, locations: &[&str]) -> Vec<AlignedPoint> {
    let keep: HashSet<&str> = locations.iter().copied().collect();
    points
        .into_iter()
        .filter(|p| keep.contains(p.location.as_str()))
        .collect()
}
