//! Time-series alignment onto a shared bucket grid

use std::collections::BTreeMap;

use crate::data::types::Sample;

use super::stats::stable_mean;

const MS_PER_HOUR: i64 = 3_600_000;

/// Two series sharing the same ascending bucket keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedPair {
    /// Bucket start in epoch milliseconds
    pub buckets: Vec<i64>,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Buckets samples into fixed-width windows and intersects two series
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesAligner {
    bucket_ms: i64,
}

impl TimeSeriesAligner {
    /// A zero-hour window is treated as one hour
    pub fn new(window_hours: u32) -> Self {
        let hours = i64::from(window_hours.max(1));
        Self {
            bucket_ms: hours * MS_PER_HOUR,
        }
    }

    /// Start of the bucket containing `ts_ms`. Floors toward negative infinity.
    pub fn bucket_of(&self, ts_ms: i64) -> i64 {
        ts_ms.div_euclid(self.bucket_ms) * self.bucket_ms
    }

    /// Mean value per bucket, keyed by bucket start
    pub fn bucketize(&self, samples: &[Sample]) -> BTreeMap<i64, f64> {
        let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for sample in samples {
            let key = self.bucket_of(sample.timestamp.timestamp_millis());
            buckets.entry(key).or_default().push(sample.value);
        }
        buckets
            .into_iter()
            .filter_map(|(key, values)| stable_mean(&values).map(|mean| (key, mean)))
            .collect()
    }

    /// Intersection of bucket keys present in both series, ascending.
    /// An empty pair means insufficient data.
    pub fn align(&self, left: &[Sample], right: &[Sample]) -> AlignedPair {
        let left = self.bucketize(left);
        let right = self.bucketize(right);

        let mut pair = AlignedPair::default();
        for (key, left_value) in &left {
            if let Some(right_value) = right.get(key) {
                pair.buckets.push(*key);
                pair.left.push(*left_value);
                pair.right.push(*right_value);
            }
        }
        pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hour: i64, minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
            + Duration::hours(hour)
            + Duration::minutes(minute)
    }

    #[test]
    fn test_samples_in_same_bucket_are_averaged() {
        let aligner = TimeSeriesAligner::new(1);
        let samples = [
            Sample::new(at(0, 5), 2.0),
            Sample::new(at(0, 55), 4.0),
            Sample::new(at(1, 0), 10.0),
        ];
        let buckets = aligner.bucketize(&samples);
        let values: Vec<f64> = buckets.values().copied().collect();
        assert_eq!(values, vec![3.0, 10.0]);
    }

    #[test]
    fn test_align_intersects_sorted_keys() {
        let aligner = TimeSeriesAligner::new(1);
        let cost = [
            Sample::new(at(3, 0), 3.0),
            Sample::new(at(1, 0), 1.0),
            Sample::new(at(2, 0), 2.0),
        ];
        let outcome = [Sample::new(at(2, 30), 20.0), Sample::new(at(3, 10), 30.0)];
        let pair = aligner.align(&cost, &outcome);
        assert_eq!(pair.len(), 2);
        assert!(pair.buckets.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(pair.left, vec![2.0, 3.0]);
        assert_eq!(pair.right, vec![20.0, 30.0]);
    }

    #[test]
    fn test_disjoint_series_yield_empty_pair() {
        let aligner = TimeSeriesAligner::new(1);
        let pair = aligner.align(&[Sample::new(at(0, 0), 1.0)], &[Sample::new(at(5, 0), 1.0)]);
        assert!(pair.is_empty());
    }

    #[test]
    fn test_bucket_floor_for_pre_epoch_timestamps() {
        let aligner = TimeSeriesAligner::new(1);
        assert_eq!(aligner.bucket_of(-1), -MS_PER_HOUR);
        assert_eq!(aligner.bucket_of(0), 0);
        assert_eq!(aligner.bucket_of(MS_PER_HOUR + 1), MS_PER_HOUR);
    }

    #[test]
    fn test_wide_window_merges_hours() {
        let aligner = TimeSeriesAligner::new(24);
        let buckets = aligner.bucketize(&[Sample::new(at(1, 0), 1.0), Sample::new(at(20, 0), 3.0)]);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets.values().next(), Some(&2.0));
    }
}
