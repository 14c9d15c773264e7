use crate::analyzers::types::{AlignedPoint, CumulativeDays, CumulativeValue};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

/// Inner-joins the cumulative metric series with the cumulative day series
/// on `(location, date)`.
///
/// Points missing from either side are dropped: an outer join would leave
/// an axis undefined. Output follows the order of `metric`.
pub fn align(metric: &[CumulativeValue], days: &[CumulativeDays]) -> Vec<AlignedPoint> {
    let day_index: HashMap<(&str, NaiveDate), u32> = days
        .iter()
        .map(|d| ((d.location.as_str(), d.date), d.days))
        .collect();

    let points: Vec<AlignedPoint> = metric
        .iter()
        .filter_map(|v| {
            day_index
                .get(&(v.location.as_str(), v.date))
                .map(|&days_since_threshold| AlignedPoint {
                    location: v.location.clone(),
                    date: v.date,
                    cum_metric: v.value,
                    days_since_threshold,
                })
        })
        .collect();

    let dropped = metric.len() - points.len();
    if dropped > 0 {
        debug!(dropped, "Unmatched cumulative rows dropped by alignment");
    }

    points
}
