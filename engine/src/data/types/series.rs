//! Timestamped observations for the correlation flavor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::MetricType;
use super::validate_finite;

fn default_window_hours() -> u32 {
    24
}

/// A raw cost or outcome observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    #[validate(custom(function = "validate_finite"))]
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Business outcome tracked against cost, with its raw samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OutcomeMetric {
    pub metric_type: MetricType,
    #[validate(length(min = 1, max = 256))]
    pub metric_name: String,
    /// Headline value reported upstream (informational)
    #[serde(default)]
    #[validate(custom(function = "validate_finite"))]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    /// Bucket width used when aligning samples against cost
    #[serde(default = "default_window_hours")]
    #[validate(range(min = 1, max = 8760))]
    pub correlation_window_hours: u32,
    #[serde(default)]
    #[validate(nested)]
    pub samples: Vec<Sample>,
}
