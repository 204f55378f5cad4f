//! Tagged request envelopes, one variant per analysis flavor

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{CorrelationMethod, CostRecord, GainRecord, OutcomeMetric, PerformanceRecord, Sample, Scope};
use crate::domain::decision::DecisionType;
use crate::domain::error::AnalysisError;

fn default_true() -> bool {
    true
}

fn default_period_days() -> u32 {
    30
}

// ============================================================================
// Weights
// ============================================================================

/// Relative importance of cost, latency and quality in the overall score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub cost: f64,
    pub latency: f64,
    pub quality: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            cost: 0.33,
            latency: 0.33,
            quality: 0.34,
        }
    }
}

impl Weights {
    pub fn new(cost: f64, latency: f64, quality: f64) -> Self {
        Self {
            cost,
            latency,
            quality,
        }
    }

    fn check(&self) -> Result<(), AnalysisError> {
        for (name, value) in [
            ("weights.cost", self.cost),
            ("weights.latency", self.latency),
            ("weights.quality", self.quality),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::validation(
                    name,
                    "must be a finite, non-negative number",
                ));
            }
        }
        let sum = self.sum();
        if sum <= 0.0 {
            return Err(AnalysisError::validation(
                "weights",
                "must sum to a positive value",
            ));
        }
        if !sum.is_finite() {
            return Err(AnalysisError::validation(
                "weights",
                "sum overflows; scale the weights down",
            ));
        }
        Ok(())
    }

    fn sum(&self) -> f64 {
        self.cost + self.latency + self.quality
    }

    /// Scale so the three weights sum to 1. Assumes `check` passed.
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 || !sum.is_finite() {
            return Self::default();
        }
        Self {
            cost: self.cost / sum,
            latency: self.latency / sum,
            quality: self.quality / sum,
        }
    }
}

// ============================================================================
// Constraints and toggles
// ============================================================================

/// Advisory thresholds evaluated per group. Groups are never dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost_per_request: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub max_latency_p95_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_quality: Option<f64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.max_cost_per_request.is_none()
            && self.max_latency_p95_ms.is_none()
            && self.min_quality.is_none()
    }

    fn check(&self) -> Result<(), AnalysisError> {
        if let Some(max_cost) = self.max_cost_per_request
            && max_cost.is_sign_negative()
            && !max_cost.is_zero()
        {
            return Err(AnalysisError::validation(
                "constraints.max_cost_per_request",
                "must be greater than or equal to 0",
            ));
        }
        if let Some(latency) = self.max_latency_p95_ms
            && !latency.is_finite()
        {
            return Err(AnalysisError::validation(
                "constraints.max_latency_p95_ms",
                "must be finite",
            ));
        }
        Ok(())
    }
}

/// Which optional sub-analyses to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisToggles {
    #[serde(default = "default_true")]
    pub pareto: bool,
    #[serde(default = "default_true")]
    pub diminishing_returns: bool,
    #[serde(default = "default_true")]
    pub recommendations: bool,
    #[serde(default = "default_true")]
    pub normalization: bool,
}

impl Default for AnalysisToggles {
    fn default() -> Self {
        Self {
            pareto: true,
            diminishing_returns: true,
            recommendations: true,
            normalization: true,
        }
    }
}

// ============================================================================
// Flavor requests
// ============================================================================

/// Multi-objective comparison of grouped performance records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TradeoffRequest {
    #[validate(length(min = 1), nested)]
    pub records: Vec<PerformanceRecord>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Weights>,
    #[serde(default)]
    #[validate(nested)]
    pub constraints: Constraints,
    #[serde(default)]
    pub toggles: AnalysisToggles,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_ref: Option<String>,
}

/// Cost series correlated against one or more outcome metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CorrelationRequest {
    #[validate(nested)]
    pub cost_samples: Vec<Sample>,
    #[validate(length(min = 1), nested)]
    pub metrics: Vec<OutcomeMetric>,
    #[serde(default)]
    pub method: CorrelationMethod,
    /// Overrides the configured significance level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub significance_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_ref: Option<String>,
}

/// Return on investment of summed spend against summed monetized gain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RoiRequest {
    #[validate(nested)]
    pub cost_records: Vec<CostRecord>,
    #[serde(default)]
    #[validate(nested)]
    pub gains: Vec<GainRecord>,
    #[serde(default = "default_period_days")]
    pub period_days: u32,
    /// Overrides the configured cost-per-1k-units threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_1k_threshold: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_ref: Option<String>,
}

/// One analysis invocation, tagged by flavor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum AnalysisRequest {
    Tradeoff(TradeoffRequest),
    Correlation(CorrelationRequest),
    Roi(RoiRequest),
}

impl AnalysisRequest {
    /// Validate the whole request once. No analysis runs on failure.
    pub fn check(&self) -> Result<(), AnalysisError> {
        match self {
            AnalysisRequest::Tradeoff(request) => {
                request.validate()?;
                request.constraints.check()?;
                if let Some(weights) = &request.weights {
                    weights.check()?;
                }
            }
            AnalysisRequest::Correlation(request) => {
                request.validate()?;
            }
            AnalysisRequest::Roi(request) => {
                request.validate()?;
                if let Some(threshold) = request.cost_per_1k_threshold
                    && threshold.is_sign_negative()
                    && !threshold.is_zero()
                {
                    return Err(AnalysisError::validation(
                        "cost_per_1k_threshold",
                        "must be greater than or equal to 0",
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn decision_type(&self) -> DecisionType {
        match self {
            AnalysisRequest::Tradeoff(_) => DecisionType::TradeoffAnalysis,
            AnalysisRequest::Correlation(_) => DecisionType::CorrelationAnalysis,
            AnalysisRequest::Roi(_) => DecisionType::RoiAnalysis,
        }
    }

    /// Input rows the flavor consumes
    pub fn record_count(&self) -> usize {
        match self {
            AnalysisRequest::Tradeoff(r) => r.records.len(),
            AnalysisRequest::Correlation(r) => {
                r.cost_samples.len() + r.metrics.iter().map(|m| m.samples.len()).sum::<usize>()
            }
            AnalysisRequest::Roi(r) => r.cost_records.len() + r.gains.len(),
        }
    }

    pub fn execution_ref(&self) -> Option<&str> {
        match self {
            AnalysisRequest::Tradeoff(r) => r.execution_ref.as_deref(),
            AnalysisRequest::Correlation(r) => r.execution_ref.as_deref(),
            AnalysisRequest::Roi(r) => r.execution_ref.as_deref(),
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
