use crate::analyzers::types::{LocationRanking, Metric, Observation};
use std::collections::HashMap;

/// Ranks every location by its total `primary` metric over all days.
///
/// Totals include non-qualifying days (corrections and zero days alike).
/// Ties fall back to the `secondary` total, then to the location name, so
/// the order is fully deterministic. Both orders are descending except the
/// name, which is ascending.
pub fn rank_locations(
    observations: &[Observation],
    primary: Metric,
    secondary: Metric,
) -> Vec<LocationRanking> {
    let mut totals: HashMap<&str, (f64, f64)> = HashMap::new();

    for obs in observations {
        let entry = totals.entry(obs.location.as_str()).or_default();
        entry.0 += primary.value(obs) as f64;
        entry.1 += secondary.value(obs) as f64;
    }

    let mut ranking: Vec<LocationRanking> = totals
        .into_iter()
        .map(|(location, (total_metric, secondary_total))| LocationRanking {
            location: location.to_string(),
            total_metric,
            secondary_total,
            rank: 0,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.total_metric
            .total_cmp(&a.total_metric)
            .then(b.secondary_total.total_cmp(&a.secondary_total))
            .then_with(|| a.location.cmp(&b.location))
    });

    for (i, entry) in ranking.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    ranking
}

/// The first `n` entries of [`rank_locations`].
///
/// Fewer than `n` locations is not an error; all of them are returned.
pub fn top_ranked(
    observations: &[Observation],
    n: usize,
    primary: Metric,
    secondary: Metric,
) -> Vec<LocationRanking> {
    let mut ranking = rank_locations(observations, primary, secondary);
    ranking.truncate(n);
    ranking
}

/// Names of the `n` most affected locations, in rank order.
pub fn top_n(
    observations: &[Observation],
    n: usize,
    primary: Metric,
    secondary: Metric,
) -> Vec<String> {
    top_ranked(observations, n, primary, secondary)
        .into_iter()
        .map(|r| r.location)
        .collect()
}
