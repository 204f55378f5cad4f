//! Raw per-unit records supplied by upstream ingestion

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{validate_finite, validate_non_negative_decimal};

// ============================================================================
// Performance records (tradeoff flavor)
// ============================================================================

/// Monetary breakdown of a single record, in exact decimal units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CostBreakdown {
    #[validate(custom(function = "validate_non_negative_decimal"))]
    pub total_cost: Decimal,
    #[validate(custom(function = "validate_non_negative_decimal"))]
    pub cost_per_request: Decimal,
    #[serde(default)]
    #[validate(custom(function = "validate_non_negative_decimal"))]
    pub cost_per_1k_tokens: Decimal,
    #[serde(default)]
    pub token_count: u64,
}

/// Latency percentiles in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct LatencyBreakdown {
    #[validate(range(min = 0.0), custom(function = "validate_finite"))]
    pub p50_ms: f64,
    #[validate(range(min = 0.0), custom(function = "validate_finite"))]
    pub p95_ms: f64,
    #[validate(range(min = 0.0), custom(function = "validate_finite"))]
    pub p99_ms: f64,
    #[validate(range(min = 0.0), custom(function = "validate_finite"))]
    pub avg_ms: f64,
    #[validate(range(min = 0.0), custom(function = "validate_finite"))]
    pub min_ms: f64,
    #[validate(range(min = 0.0), custom(function = "validate_finite"))]
    pub max_ms: f64,
}

/// Quality assessment. Sub-dimensions are optional and averaged only where present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct QualityMetrics {
    #[validate(range(min = 0.0, max = 1.0), custom(function = "validate_finite"))]
    pub composite_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub relevance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub coherence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub completeness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub safety: Option<f64>,
}

impl QualityMetrics {
    /// Sub-dimension values in a fixed order, absent ones as `None`
    pub fn dimensions(&self) -> [Option<f64>; 5] {
        [
            self.accuracy,
            self.relevance,
            self.coherence,
            self.completeness,
            self.safety,
        ]
    }
}

/// One metered unit of work with its cost, latency and optional quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PerformanceRecord {
    /// Stable record identifier (used for input hashing)
    #[validate(length(min = 1, max = 256))]
    pub id: String,
    #[validate(length(min = 1, max = 256))]
    pub provider: String,
    #[validate(length(min = 1, max = 256))]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[validate(nested)]
    pub cost: CostBreakdown,
    #[validate(nested)]
    pub latency: LatencyBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub quality: Option<QualityMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================================================
// Cost and gain records (ROI flavor)
// ============================================================================

/// Spend attributed to one unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CostRecord {
    #[validate(length(min = 1, max = 256))]
    pub id: String,
    #[validate(custom(function = "validate_non_negative_decimal"))]
    pub cost: Decimal,
    /// Metered units consumed (tokens, calls, ...)
    #[serde(default)]
    pub units: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Monetized outcome attributed to the analysed spend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GainRecord {
    #[validate(length(min = 1, max = 256))]
    pub id: String,
    #[validate(custom(function = "validate_non_negative_decimal"))]
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
