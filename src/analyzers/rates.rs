use crate::analyzers::types::{Observation, PopulationRate, Rate};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Default)]
struct LocationMonths {
    population: Option<f64>,
    life_expectancy: Option<f64>,
    months: BTreeMap<(i32, u32), MonthSums>,
}

#[derive(Default)]
struct MonthSums {
    abb_month: String,
    cases: i64,
    deaths: i64,
}

/// Month-by-month cumulative cases and deaths of each location in
/// `locations`, divided by the location's population.
///
/// Only dates strictly after `since` are counted. Results follow the order
/// of `locations`, then calendar order. A location without a usable
/// population gets [`Rate::Undefined`] for every month.
#[tracing::instrument(skip(observations, locations), fields(locations = locations.len()))]
pub fn monthly_per_population(
    observations: &[Observation],
    locations: &[String],
    since: NaiveDate,
) -> Vec<PopulationRate> {
    let mut grouped: HashMap<&str, LocationMonths> = locations
        .iter()
        .map(|l| (l.as_str(), LocationMonths::default()))
        .collect();

    for obs in observations {
        let Some(entry) = grouped.get_mut(obs.location.as_str()) else {
            continue;
        };

        if entry.population.is_none() {
            entry.population = obs.population;
        }
        if entry.life_expectancy.is_none() {
            entry.life_expectancy = obs.life_expectancy;
        }

        if obs.date <= since {
            continue;
        }

        let month = entry
            .months
            .entry((obs.date.year(), obs.date.month()))
            .or_insert_with(|| MonthSums {
                abb_month: obs.date.format("%b").to_string(),
                ..MonthSums::default()
            });
        month.cases = month.cases.saturating_add(obs.new_cases);
        month.deaths = month.deaths.saturating_add(obs.new_deaths);
    }

    let mut out = Vec::new();

    for location in locations {
        let Some(entry) = grouped.remove(location.as_str()) else {
            continue;
        };

        if !Rate::is_usable_population(entry.population) {
            debug!(
                location = %location,
                population = ?entry.population,
                "Per-population rate undefined"
            );
        }

        let mut cum_cases = 0i64;
        let mut cum_deaths = 0i64;

        for ((year, month), sums) in entry.months {
            cum_cases = cum_cases.saturating_add(sums.cases);
            cum_deaths = cum_deaths.saturating_add(sums.deaths);

            out.push(PopulationRate {
                location: location.clone(),
                year,
                month,
                abb_month: sums.abb_month,
                population: entry.population,
                life_expectancy: entry.life_expectancy,
                cum_cases,
                cum_deaths,
                cases_per_pop: Rate::per_population(cum_cases as f64, entry.population),
                deaths_per_pop: Rate::per_population(cum_deaths as f64, entry.population),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    fn since() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn test_cumulative_rates_by_month() {
        let obs = vec![
            Observation::new("A", date(2, 1), 100, 1).with_population(1000.0, Some(80.0)),
            Observation::new("A", date(2, 15), 100, 1).with_population(1000.0, Some(80.0)),
            Observation::new("A", date(3, 1), 300, 8).with_population(1000.0, Some(80.0)),
        ];

        let rates = monthly_per_population(&obs, &["A".to_string()], since());

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].abb_month, "Feb");
        assert_eq!(rates[0].cum_cases, 200);
        assert_eq!(rates[0].cases_per_pop, Rate::Defined(0.2));
        assert_eq!(rates[1].abb_month, "Mar");
        assert_eq!(rates[1].cum_cases, 500);
        assert_eq!(rates[1].cum_deaths, 10);
        assert_eq!(rates[1].deaths_per_pop, Rate::Defined(0.01));
        assert_eq!(rates[1].life_expectancy, Some(80.0));
    }

    #[test]
    fn test_zero_population_is_undefined() {
        let obs = vec![Observation::new("A", date(2, 1), 10, 1).with_population(0.0, None)];

        let rates = monthly_per_population(&obs, &["A".to_string()], since());

        assert_eq!(rates[0].cases_per_pop, Rate::Undefined);
        assert_eq!(rates[0].deaths_per_pop, Rate::Undefined);
        assert_eq!(rates[0].cum_cases, 10);
    }

    #[test]
    fn test_since_is_exclusive_and_locations_filtered() {
        let obs = vec![
            Observation::new("A", since(), 50, 0).with_population(100.0, None),
            Observation::new("A", date(1, 2), 5, 0).with_population(100.0, None),
            Observation::new("B", date(1, 2), 7, 0).with_population(100.0, None),
        ];

        let rates = monthly_per_population(&obs, &["A".to_string()], since());

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].location, "A");
        assert_eq!(rates[0].cum_cases, 5);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let obs = vec![
            Observation::new("A", date(2, 1), i64::MAX, 0).with_population(10.0, None),
            Observation::new("A", date(2, 2), i64::MAX, 0).with_population(10.0, None),
            Observation::new("A", date(3, 1), i64::MAX, 0).with_population(10.0, None),
        ];

        let rates = monthly_per_population(&obs, &["A".to_string()], since());

        assert_eq!(rates[0].cum_cases, i64::MAX);
        assert_eq!(rates[1].cum_cases, i64::MAX);
        assert!(matches!(rates[1].cases_per_pop, Rate::Defined(v) if v.is_finite()));
    }

    #[test]
    fn test_output_follows_location_order() {
        let obs = vec![
            Observation::new("A", date(2, 1), 1, 0).with_population(10.0, None),
            Observation::new("B", date(2, 1), 2, 0).with_population(10.0, None),
        ];
        let order = vec!["B".to_string(), "A".to_string(), "Missing".to_string()];

        let rates = monthly_per_population(&obs, &order, since());
        let names: Vec<&str> = rates.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
