//! Detection of the cost level where marginal quality gain collapses

use serde::Serialize;

/// Default collapse ratio: a marginal gain below half the previous one
pub const DEFAULT_DIMINISHING_RATIO: f64 = 0.5;

/// Default minimum number of groups carrying quality
pub const DEFAULT_MIN_GROUPS: usize = 3;

/// Result of diminishing-returns detection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiminishingReturns {
    /// Too few groups with quality; nothing computed
    InsufficientData { groups_with_quality: usize },
    NotDetected,
    Detected {
        /// Cost at the start of the segment where gain collapses
        threshold_cost: f64,
        marginal_gain: f64,
        previous_marginal_gain: f64,
        group_identifier: String,
    },
}

impl DiminishingReturns {
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected { .. })
    }
}

/// A group that carries quality, placed on the cost axis
#[derive(Debug, Clone, PartialEq)]
pub struct CostQualityPoint {
    pub identifier: String,
    pub cost: f64,
    pub quality: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct DiminishingReturnsDetector {
    ratio: f64,
    min_groups: usize,
}

impl Default for DiminishingReturnsDetector {
    fn default() -> Self {
        Self::new(DEFAULT_DIMINISHING_RATIO, DEFAULT_MIN_GROUPS)
    }
}

impl DiminishingReturnsDetector {
    pub fn new(ratio: f64, min_groups: usize) -> Self {
        Self {
            ratio,
            min_groups: min_groups.max(2),
        }
    }

    pub fn detect(&self, points: &[CostQualityPoint]) -> DiminishingReturns {
        if points.len() < self.min_groups {
            return DiminishingReturns::InsufficientData {
                groups_with_quality: points.len(),
            };
        }

        let mut sorted: Vec<&CostQualityPoint> = points.iter().collect();
        sorted.sort_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });

        // (segment start, marginal gain), skipping pairs with no cost increase
        let segments: Vec<(&CostQualityPoint, f64)> = sorted
            .windows(2)
            .filter_map(|pair| {
                let delta_cost = pair[1].cost - pair[0].cost;
                (delta_cost > 0.0).then(|| (pair[0], (pair[1].quality - pair[0].quality) / delta_cost))
            })
            .collect();

        for i in 1..segments.len() {
            let (start, gain) = segments[i];
            let previous = segments[i - 1].1;
            if previous > 0.0 && gain < self.ratio * previous {
                tracing::debug!(
                    group = %start.identifier,
                    threshold_cost = start.cost,
                    marginal_gain = gain,
                    previous_marginal_gain = previous,
                    "Diminishing returns detected"
                );
                return DiminishingReturns::Detected {
                    threshold_cost: start.cost,
                    marginal_gain: gain,
                    previous_marginal_gain: previous,
                    group_identifier: start.identifier.clone(),
                };
            }
        }
        DiminishingReturns::NotDetected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(pairs: &[(f64, f64)]) -> Vec<CostQualityPoint> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(cost, quality))| CostQualityPoint {
                identifier: format!("g{}", i),
                cost,
                quality,
            })
            .collect()
    }

    #[test]
    fn test_constant_marginal_gain_not_detected() {
        let detector = DiminishingReturnsDetector::default();
        let result = detector.detect(&points(&[(1.0, 0.1), (2.0, 0.2), (3.0, 0.3), (4.0, 0.4)]));
        assert_eq!(result, DiminishingReturns::NotDetected);
        assert!(!result.is_detected());
    }

    #[test]
    fn test_collapse_detected_at_segment_start() {
        let detector = DiminishingReturnsDetector::default();
        let result = detector.detect(&points(&[(1.0, 0.5), (2.0, 0.8), (3.0, 0.85), (4.0, 0.86)]));
        match result {
            DiminishingReturns::Detected {
                threshold_cost,
                group_identifier,
                marginal_gain,
                previous_marginal_gain,
            } => {
                assert_eq!(threshold_cost, 2.0);
                assert_eq!(group_identifier, "g1");
                assert!((marginal_gain - 0.05).abs() < 1e-9);
                assert!((previous_marginal_gain - 0.3).abs() < 1e-9);
            }
            other => panic!("expected detection, got {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_groups() {
        let detector = DiminishingReturnsDetector::default();
        let result = detector.detect(&points(&[(1.0, 0.5), (2.0, 0.9)]));
        assert_eq!(
            result,
            DiminishingReturns::InsufficientData {
                groups_with_quality: 2
            }
        );
    }

    #[test]
    fn test_unsorted_input_is_sorted_by_cost() {
        let detector = DiminishingReturnsDetector::default();
        let result = detector.detect(&points(&[(3.0, 0.85), (1.0, 0.5), (2.0, 0.8)]));
        assert!(result.is_detected());
    }

    #[test]
    fn test_equal_cost_pairs_skipped() {
        let detector = DiminishingReturnsDetector::default();
        let result = detector.detect(&points(&[(1.0, 0.1), (1.0, 0.9), (2.0, 1.0)]));
        // only one usable segment, so nothing to compare
        assert_eq!(result, DiminishingReturns::NotDetected);
    }

    #[test]
    fn test_non_positive_previous_gain_never_triggers() {
        let detector = DiminishingReturnsDetector::default();
        let result = detector.detect(&points(&[(1.0, 0.9), (2.0, 0.8), (3.0, 0.1)]));
        assert_eq!(result, DiminishingReturns::NotDetected);
    }

    #[test]
    fn test_serialized_status_tag() {
        let json = serde_json::to_value(DiminishingReturns::NotDetected).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "not_detected" }));
    }
}
