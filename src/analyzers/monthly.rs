use crate::analyzers::types::{MonthlyTotal, Observation};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Sums cases and deaths per location and calendar month, for dates
/// strictly after `since`. Ordered by location, then year and month.
/// Sums saturate at the `i64` bounds.
pub fn monthly_totals(observations: &[Observation], since: NaiveDate) -> Vec<MonthlyTotal> {
    let mut grouped: BTreeMap<(&str, &str, &str, i32, u32), MonthlyTotal> = BTreeMap::new();

    for obs in observations.iter().filter(|o| o.date > since) {
        let key = (
            obs.location.as_str(),
            obs.iso_code.as_str(),
            obs.continent.as_str(),
            obs.date.year(),
            obs.date.month(),
        );

        let total = grouped.entry(key).or_insert_with(|| MonthlyTotal {
            location: obs.location.clone(),
            iso_code: obs.iso_code.clone(),
            continent: obs.continent.clone(),
            year: obs.date.year(),
            month: obs.date.month(),
            abb_month: obs.date.format("%b").to_string(),
            new_cases: 0,
            new_deaths: 0,
        });
        total.new_cases = total.new_cases.saturating_add(obs.new_cases);
        total.new_deaths = total.new_deaths.saturating_add(obs.new_deaths);
    }

    grouped.into_values().collect()
}

/// Keeps the totals of one month of one year, optionally of one continent.
///
/// `None` and `"world"` keep every continent; otherwise the comparison is
/// case-insensitive.
pub fn filter_month<'a>(
    totals: &'a [MonthlyTotal],
    year: i32,
    month: u32,
    continent: Option<&str>,
) -> Vec<&'a MonthlyTotal> {
    let continent = continent
        .map(str::to_lowercase)
        .filter(|c| c != "world");

    totals
        .iter()
        .filter(|t| t.year == year && t.month == month)
        .filter(|t| match &continent {
            Some(c) => t.continent.to_lowercase() == *c,
            None => true,
        })
        .collect()
}
