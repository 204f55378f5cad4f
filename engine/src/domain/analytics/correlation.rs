//! Correlation between cost and outcome series

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::types::{CorrelationMethod, MetricType};

use super::distribution::t_two_sided_p;
use super::stats::mean;

/// Smallest series that is correlated at all
pub const MIN_CORRELATION_SAMPLES: usize = 3;

/// Seven-way classification of a coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    StrongPositive,
    ModeratePositive,
    WeakPositive,
    None,
    WeakNegative,
    ModerateNegative,
    StrongNegative,
}

impl CorrelationStrength {
    pub fn from_coefficient(coefficient: f64) -> Self {
        let magnitude = coefficient.abs();
        let positive = coefficient > 0.0;
        match magnitude {
            m if m >= 0.7 && positive => Self::StrongPositive,
            m if m >= 0.7 => Self::StrongNegative,
            m if m >= 0.4 && positive => Self::ModeratePositive,
            m if m >= 0.4 => Self::ModerateNegative,
            m if m >= 0.2 && positive => Self::WeakPositive,
            m if m >= 0.2 => Self::WeakNegative,
            _ => Self::None,
        }
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, Self::StrongPositive | Self::StrongNegative)
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StrongPositive => "strong_positive",
            Self::ModeratePositive => "moderate_positive",
            Self::WeakPositive => "weak_positive",
            Self::None => "none",
            Self::WeakNegative => "weak_negative",
            Self::ModerateNegative => "moderate_negative",
            Self::StrongNegative => "strong_negative",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of correlating one cost series with one outcome metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub metric_name: String,
    pub metric_type: MetricType,
    pub method: CorrelationMethod,
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    /// Absent when the coefficient is degenerate (zero variance)
    pub p_value: Option<f64>,
    pub sample_size: usize,
    pub is_significant: bool,
}

impl CorrelationResult {
    /// Fixed result for fewer than three aligned samples
    pub fn insufficient(
        metric_name: impl Into<String>,
        metric_type: MetricType,
        method: CorrelationMethod,
        sample_size: usize,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            metric_type,
            method,
            coefficient: 0.0,
            strength: CorrelationStrength::None,
            p_value: Some(1.0),
            sample_size,
            is_significant: false,
        }
    }

    pub fn has_sufficient_data(&self) -> bool {
        self.sample_size >= MIN_CORRELATION_SAMPLES
    }
}

/// Computes coefficients and approximate significance
#[derive(Debug, Clone, Copy)]
pub struct CorrelationAnalyzer {
    significance_level: f64,
}

impl CorrelationAnalyzer {
    pub fn new(significance_level: f64) -> Self {
        Self { significance_level }
    }

    /// Correlate two paired series. Extra values on the longer side are ignored.
    pub fn analyze(
        &self,
        metric_name: &str,
        metric_type: MetricType,
        method: CorrelationMethod,
        x: &[f64],
        y: &[f64],
    ) -> CorrelationResult {
        let n = x.len().min(y.len());
        if n < MIN_CORRELATION_SAMPLES {
            return CorrelationResult::insufficient(metric_name, metric_type, method, n);
        }
        let (x, y) = (&x[..n], &y[..n]);

        let coefficient = match method {
            CorrelationMethod::Pearson => pearson(x, y),
            CorrelationMethod::Spearman => pearson(&average_ranks(x), &average_ranks(y)),
            CorrelationMethod::Kendall => Some(kendall_tau_a(x, y)),
        };

        let (coefficient, p_value) = match coefficient {
            Some(r) => {
                let r = r.clamp(-1.0, 1.0);
                (r, Some(p_value(r, n)))
            }
            None => (0.0, None),
        };
        let is_significant = p_value.is_some_and(|p| p < self.significance_level);

        tracing::debug!(
            metric = metric_name,
            method = %method,
            coefficient,
            sample_size = n,
            is_significant,
            "Correlation computed"
        );

        CorrelationResult {
            metric_name: metric_name.to_string(),
            metric_type,
            method,
            coefficient,
            strength: CorrelationStrength::from_coefficient(coefficient),
            p_value,
            sample_size: n,
            is_significant,
        }
    }
}

/// Product-moment coefficient, `None` when either series has zero variance
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    // Coefficient is scale-invariant; unit-scaling keeps squared deviations finite
    let (x, y) = (unit_scaled(x)?, unit_scaled(y)?);
    let (mean_x, mean_y) = (mean(&x), mean(&y));
    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (a, b) in x.iter().zip(&y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }
    let denominator = variance_x.sqrt() * variance_y.sqrt();
    if denominator == 0.0 {
        return None;
    }
    Some((covariance / denominator).clamp(-1.0, 1.0))
}

/// Divide by the largest magnitude; `None` for an all-zero or non-finite series
fn unit_scaled(values: &[f64]) -> Option<Vec<f64>> {
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| v / scale).collect())
}

/// 1-based ranks; ties share the average of their positions
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        // positions start..=end share rank (start+1 + end+1) / 2
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &index in &order[start..=end] {
            ranks[index] = rank;
        }
        start = end + 1;
    }
    ranks
}

/// Tau-a: tied pairs count in neither numerator term, denominator is C(n, 2)
pub fn kendall_tau_a(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mut concordant: i64 = 0;
    let mut discordant: i64 = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            let product = sign(x[j] - x[i]) * sign(y[j] - y[i]);
            if product > 0.0 {
                concordant += 1;
            } else if product < 0.0 {
                discordant += 1;
            }
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    (concordant - discordant) as f64 / pairs
}

/// Two-sided p-value of a coefficient via its t statistic
fn p_value(r: f64, n: usize) -> f64 {
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    t_two_sided_p(t, df)
}

/// Like `f64::signum`, but zero maps to zero
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
#[path = "correlation_tests.rs"]
mod tests;
