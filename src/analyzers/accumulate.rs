use crate::analyzers::types::{
    Accumulated, Bucketed, CumulativeDays, CumulativeValue, DayBasis, Metric,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Default)]
struct DayTotal {
    metric: f64,
    qualifying: bool,
}

/// Computes the per-location running metric total and running day count
/// over qualifying days.
///
/// Input order does not matter: rows are grouped by location and date
/// first, so each location's series is strictly chronological and both
/// counters restart at every location. Rows sharing a date are summed into
/// one sequence position. Excluded buckets contribute nothing.
pub fn accumulate(rows: &[Bucketed<'_>], metric: Metric, basis: DayBasis) -> Accumulated {
    let mut by_location: BTreeMap<&str, BTreeMap<NaiveDate, DayTotal>> = BTreeMap::new();

    for row in rows {
        let obs = row.observation;
        let day = by_location
            .entry(obs.location.as_str())
            .or_default()
            .entry(obs.date)
            .or_default();

        if row.bucket.is_qualifying() {
            day.metric += metric.value(obs) as f64;
            day.qualifying = true;
        }
    }

    let mut out = Accumulated::default();

    for (location, days) in by_location {
        let mut running = 0.0;
        let mut qualifying_days = 0u32;
        let mut observed_days = 0u32;

        for (date, total) in days {
            observed_days += 1;
            if !total.qualifying {
                continue;
            }

            qualifying_days += 1;
            running += total.metric;

            out.metric.push(CumulativeValue {
                location: location.to_string(),
                date,
                value: running,
            });
            out.days.push(CumulativeDays {
                location: location.to_string(),
                date,
                days: match basis {
                    DayBasis::QualifyingDays => qualifying_days,
                    DayBasis::AllDays => observed_days,
                },
            });
        }

        if qualifying_days == 0 {
            debug!(location, "Location has no qualifying days");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::bucket::bucketize;
    use crate::analyzers::types::{BucketThresholds, Observation};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    fn series(location: &str, cases: &[i64]) -> Vec<Observation> {
        cases
            .iter()
            .enumerate()
            .map(|(i, &c)| Observation::new(location, day(i as u32 + 1), c, c / 10))
            .collect()
    }

    fn run(obs: &[Observation], metric: Metric, basis: DayBasis) -> Accumulated {
        accumulate(&bucketize(obs, &BucketThresholds::default()), metric, basis)
    }

    #[test]
    fn test_scenario_cases() {
        let obs = series("X", &[-5, 0, 10, 60, 400]);
        let acc = run(&obs, Metric::Cases, DayBasis::QualifyingDays);

        let values: Vec<f64> = acc.metric.iter().map(|v| v.value).collect();
        let days: Vec<u32> = acc.days.iter().map(|d| d.days).collect();
        let dates: Vec<NaiveDate> = acc.metric.iter().map(|v| v.date).collect();

        assert_eq!(values, vec![10.0, 70.0, 470.0]);
        assert_eq!(days, vec![1, 2, 3]);
        assert_eq!(dates, vec![day(3), day(4), day(5)]);
    }

    #[test]
    fn test_deaths_follow_case_buckets() {
        let obs = series("X", &[-50, 0, 100, 200]);
        let acc = run(&obs, Metric::Deaths, DayBasis::QualifyingDays);

        let values: Vec<f64> = acc.metric.iter().map(|v| v.value).collect();
        assert_eq!(values, vec![10.0, 30.0]);
    }

    #[test]
    fn test_counters_reset_per_location() {
        let mut obs = series("A", &[10, 20]);
        obs.extend(series("B", &[0, 5]));
        let acc = run(&obs, Metric::Cases, DayBasis::QualifyingDays);

        let b: Vec<(f64, u32)> = acc
            .metric
            .iter()
            .zip(&acc.days)
            .filter(|(v, _)| v.location == "B")
            .map(|(v, d)| (v.value, d.days))
            .collect();
        assert_eq!(b, vec![(5.0, 1)]);
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let mut obs = series("A", &[1, 2, 3]);
        obs.reverse();
        obs.insert(1, Observation::new("0-first", day(9), 7, 0));
        let acc = run(&obs, Metric::Cases, DayBasis::QualifyingDays);

        let keys: Vec<(&str, f64)> = acc
            .metric
            .iter()
            .map(|v| (v.location.as_str(), v.value))
            .collect();
        assert_eq!(keys, vec![("0-first", 7.0), ("A", 1.0), ("A", 3.0), ("A", 6.0)]);
    }

    #[test]
    fn test_duplicate_dates_are_summed() {
        let obs = vec![
            Observation::new("A", day(1), 10, 0),
            Observation::new("A", day(1), 15, 0),
            Observation::new("A", day(1), -3, 0),
            Observation::new("A", day(2), 5, 0),
        ];
        let acc = run(&obs, Metric::Cases, DayBasis::QualifyingDays);

        let points: Vec<(f64, u32)> = acc
            .metric
            .iter()
            .zip(&acc.days)
            .map(|(v, d)| (v.value, d.days))
            .collect();
        assert_eq!(points, vec![(25.0, 1), (30.0, 2)]);
    }

    #[test]
    fn test_huge_same_date_counts_do_not_overflow() {
        let obs = vec![
            Observation::new("A", day(1), i64::MAX, 0),
            Observation::new("A", day(1), i64::MAX, 0),
            Observation::new("A", day(2), 1, 0),
        ];
        let acc = run(&obs, Metric::Cases, DayBasis::QualifyingDays);

        let expected = 2.0 * i64::MAX as f64;
        assert_eq!(acc.metric.len(), 2);
        assert_eq!(acc.metric[0].value, expected);
        assert!(acc.metric[1].value >= expected);
        assert_eq!(acc.days[1].days, 2);
    }

    #[test]
    fn test_all_days_basis_counts_non_qualifying_dates() {
        let obs = series("X", &[-5, 0, 10, 0, 60]);
        let acc = run(&obs, Metric::Cases, DayBasis::AllDays);

        let days: Vec<u32> = acc.days.iter().map(|d| d.days).collect();
        assert_eq!(days, vec![3, 5]);
        assert_eq!(acc.metric.len(), 2);
    }

    #[test]
    fn test_no_qualifying_days_yields_nothing() {
        let obs = series("X", &[0, -1, 0]);
        let acc = run(&obs, Metric::Cases, DayBasis::QualifyingDays);
        assert!(acc.metric.is_empty());
        assert!(acc.days.is_empty());

        let empty = run(&[], Metric::Cases, DayBasis::QualifyingDays);
        assert!(empty.metric.is_empty());
    }
}
