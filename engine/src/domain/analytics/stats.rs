//! Order-independent descriptive statistics
//!
//! Floating-point addition is not associative, so summing in input order
//! would make averages depend on record order. Values are sorted with a
//! total order before summation.

/// Mean of a slice, `None` when empty
pub fn stable_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let sum: f64 = sorted.iter().sum();
    Some(sum / sorted.len() as f64)
}

/// Mean over the present values only; absent values are skipped, never zeroed
pub fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    stable_mean(&present)
}

/// Arithmetic mean without reordering (for already ordered series)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Minimum and maximum of a slice, `None` when empty
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_mean_empty() {
        assert_eq!(stable_mean(&[]), None);
    }

    #[test]
    fn test_stable_mean_is_order_independent() {
        let a = [0.1, 0.2, 0.3, 1e16, -1e16, 7.7];
        let b = [7.7, -1e16, 0.3, 0.1, 1e16, 0.2];
        assert_eq!(stable_mean(&a), stable_mean(&b));
    }

    #[test]
    fn test_mean_present_skips_absent() {
        let mean = mean_present([Some(0.5), None, Some(1.0), None]);
        assert_eq!(mean, Some(0.75));
        assert_eq!(mean_present([None, None]), None);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(min_max(&[]), None);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }
}
