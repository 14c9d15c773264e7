use crate::analyzers::types::{DailyPoint, Observation};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Daily cases and deaths of `location` from `since` onwards.
///
/// Rows carrying a negative correction in either column are skipped.
/// Duplicate dates are summed, saturating at `i64::MAX`.
pub fn daily_series(
    observations: &[Observation],
    location: &str,
    since: NaiveDate,
) -> Vec<DailyPoint> {
    let mut by_date: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();

    for obs in observations {
        if obs.location != location || obs.date < since {
            continue;
        }
        if obs.new_cases < 0 || obs.new_deaths < 0 {
            continue;
        }
        let entry = by_date.entry(obs.date).or_default();
        entry.0 = entry.0.saturating_add(obs.new_cases);
        entry.1 = entry.1.saturating_add(obs.new_deaths);
    }

    by_date
        .into_iter()
        .map(|(date, (new_cases, new_deaths))| DailyPoint {
            date,
            new_cases,
            new_deaths,
        })
        .collect()
}
