//! Heuristic policy knobs shared by every flavor

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::analytics::ScoringPolicy;
use crate::domain::analytics::diminishing::{DEFAULT_DIMINISHING_RATIO, DEFAULT_MIN_GROUPS};

/// Tunable constants. None of these are protocol invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPolicy {
    pub significance_level: f64,
    pub normalize: bool,
    pub cost_ceiling_per_request: f64,
    pub latency_ceiling_ms: f64,
    pub diminishing_ratio: f64,
    pub diminishing_min_groups: usize,
    pub cost_per_1k_threshold: Decimal,
    pub confidence_saturation_records: usize,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            normalize: true,
            cost_ceiling_per_request: 0.10,
            latency_ceiling_ms: 10_000.0,
            diminishing_ratio: DEFAULT_DIMINISHING_RATIO,
            diminishing_min_groups: DEFAULT_MIN_GROUPS,
            cost_per_1k_threshold: dec!(0.05),
            confidence_saturation_records: 100,
        }
    }
}

impl AnalysisPolicy {
    /// Scoring knobs, with min-max normalization gated by the request toggle
    pub fn scoring(&self, normalization_requested: bool) -> ScoringPolicy {
        ScoringPolicy {
            normalize: self.normalize && normalization_requested,
            cost_ceiling_per_request: self.cost_ceiling_per_request,
            latency_ceiling_ms: self.latency_ceiling_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_toggle_can_only_disable() {
        let policy = AnalysisPolicy::default();
        assert!(policy.scoring(true).normalize);
        assert!(!policy.scoring(false).normalize);

        let off = AnalysisPolicy {
            normalize: false,
            ..AnalysisPolicy::default()
        };
        assert!(!off.scoring(true).normalize);
    }
}
