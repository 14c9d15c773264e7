use crate::analyzers::types::{Bucket, BucketThresholds, Bucketed, Observation};

/// Classifies a daily case count using the default thresholds.
///
/// | Range              | Bucket     |
/// |--------------------|------------|
/// | < 0                | NEGATIVE   |
/// | == 0               | ZERO       |
/// | 1 ..= 49           | LOW        |
/// | 50 ..= 99          | MID        |
/// | 100 ..= 300        | HIGH       |
/// | > 300              | VERY_HIGH  |
pub fn classify(new_cases: i64) -> Bucket {
    classify_with(new_cases, &BucketThresholds::default())
}

/// Classifies a daily case count against explicit thresholds.
pub fn classify_with(new_cases: i64, t: &BucketThresholds) -> Bucket {
    match new_cases {
        n if n < 0 => Bucket::Negative,
        0 => Bucket::Zero,
        n if n < t.low_max => Bucket::Low,
        n if n < t.mid_max => Bucket::Mid,
        n if n <= t.high_max => Bucket::High,
        _ => Bucket::VeryHigh,
    }
}

/// Attaches a bucket to every observation, row by row.
pub fn bucketize<'a>(observations: &'a [Observation], t: &BucketThresholds) -> Vec<Bucketed<'a>> {
    observations
        .iter()
        .map(|observation| Bucketed {
            observation,
            bucket: classify_with(observation.new_cases, t),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(i64::MIN), Bucket::Negative);
        assert_eq!(classify(-1), Bucket::Negative);
        assert_eq!(classify(0), Bucket::Zero);
        assert_eq!(classify(1), Bucket::Low);
        assert_eq!(classify(49), Bucket::Low);
        assert_eq!(classify(50), Bucket::Mid);
        assert_eq!(classify(99), Bucket::Mid);
        assert_eq!(classify(100), Bucket::High);
        assert_eq!(classify(300), Bucket::High);
        assert_eq!(classify(301), Bucket::VeryHigh);
        assert_eq!(classify(i64::MAX), Bucket::VeryHigh);
    }

    #[test]
    fn test_classify_is_monotonic_around_boundaries() {
        // Buckets never step backwards as the count grows.
        let mut previous = classify(-10);
        for n in -10..=400 {
            let current = classify(n);
            assert!(current >= previous, "{n} moved from {previous:?} to {current:?}");
            previous = current;
        }
    }

    #[test]
    fn test_classify_with_custom_thresholds() {
        let t = BucketThresholds {
            low_max: 5,
            mid_max: 10,
            high_max: 20,
        };
        assert_eq!(classify_with(4, &t), Bucket::Low);
        assert_eq!(classify_with(5, &t), Bucket::Mid);
        assert_eq!(classify_with(10, &t), Bucket::High);
        assert_eq!(classify_with(20, &t), Bucket::High);
        assert_eq!(classify_with(21, &t), Bucket::VeryHigh);
    }

    #[test]
    fn test_qualifying_buckets() {
        let qualifying: Vec<_> = Bucket::ALL.iter().filter(|b| b.is_qualifying()).collect();
        assert_eq!(
            qualifying,
            vec![&Bucket::Low, &Bucket::Mid, &Bucket::High, &Bucket::VeryHigh]
        );
    }

    #[test]
    fn test_bucketize_scenario() {
        let day = |d| NaiveDate::from_ymd_opt(2020, 3, d).unwrap();
        let obs: Vec<_> = [-5, 0, 10, 60, 400]
            .iter()
            .enumerate()
            .map(|(i, &c)| Observation::new("X", day(i as u32 + 1), c, 0))
            .collect();

        let buckets: Vec<_> = bucketize(&obs, &BucketThresholds::default())
            .iter()
            .map(|b| b.bucket)
            .collect();

        assert_eq!(
            buckets,
            vec![
                Bucket::Negative,
                Bucket::Zero,
                Bucket::Low,
                Bucket::Mid,
                Bucket::VeryHigh
            ]
        );
    }
}
