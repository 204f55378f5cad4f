//! Non-dominated subset over (cost, latency, quality)

use serde::Serialize;

/// A scored group reduced to the three dominance dimensions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoPoint {
    pub identifier: String,
    pub cost: f64,
    pub latency: f64,
    pub quality: Option<f64>,
}

impl ParetoPoint {
    pub fn new(identifier: impl Into<String>, cost: f64, latency: f64, quality: Option<f64>) -> Self {
        Self {
            identifier: identifier.into(),
            cost,
            latency,
            quality,
        }
    }

    /// Lower cost and latency are better, higher quality is better.
    /// Absent quality counts as 0. Identical points do not dominate.
    pub fn dominates(&self, other: &ParetoPoint) -> bool {
        let (q_self, q_other) = (self.quality.unwrap_or(0.0), other.quality.unwrap_or(0.0));
        let no_worse = self.cost <= other.cost && self.latency <= other.latency && q_self >= q_other;
        let strictly_better =
            self.cost < other.cost || self.latency < other.latency || q_self > q_other;
        no_worse && strictly_better
    }
}

/// All and only the points no other point dominates, in input order.
/// Pairwise O(n^2); callers pass pre-aggregated groups.
pub fn pareto_frontier(points: &[ParetoPoint]) -> Vec<ParetoPoint> {
    points
        .iter()
        .enumerate()
        .filter(|(i, candidate)| {
            !points
                .iter()
                .enumerate()
                .any(|(j, other)| *i != j && other.dominates(candidate))
        })
        .map(|(_, point)| point.clone())
        .collect()
}
