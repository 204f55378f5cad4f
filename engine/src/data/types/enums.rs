//! Enum types for the input contract

use std::fmt;

use serde::{Deserialize, Serialize};

/// Grouping key used to aggregate raw records before scoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// One group per provider/model pair
    #[default]
    Model,
    /// One group per provider
    Provider,
    /// One group per model tier
    Tier,
    /// One group per execution id
    Execution,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Model => write!(f, "model"),
            Scope::Provider => write!(f, "provider"),
            Scope::Tier => write!(f, "tier"),
            Scope::Execution => write!(f, "execution"),
        }
    }
}

/// Correlation coefficient family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
    Kendall,
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationMethod::Pearson => write!(f, "pearson"),
            CorrelationMethod::Spearman => write!(f, "spearman"),
            CorrelationMethod::Kendall => write!(f, "kendall"),
        }
    }
}

/// Kind of business outcome tracked against cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Throughput,
    Latency,
    SuccessRate,
    QualityScore,
    RevenueImpact,
    CostSavings,
    ErrorRate,
    UserSatisfaction,
    Custom,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricType::Throughput => "throughput",
            MetricType::Latency => "latency",
            MetricType::SuccessRate => "success_rate",
            MetricType::QualityScore => "quality_score",
            MetricType::RevenueImpact => "revenue_impact",
            MetricType::CostSavings => "cost_savings",
            MetricType::ErrorRate => "error_rate",
            MetricType::UserSatisfaction => "user_satisfaction",
            MetricType::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_serde() {
        let scope: Scope = serde_json::from_str(r#""provider""#).unwrap();
        assert_eq!(scope, Scope::Provider);
        assert_eq!(serde_json::to_string(&Scope::Tier).unwrap(), r#""tier""#);
        assert_eq!(Scope::default(), Scope::Model);
    }

    #[test]
    fn test_metric_type_display_matches_serde() {
        for metric in [
            MetricType::Throughput,
            MetricType::SuccessRate,
            MetricType::RevenueImpact,
            MetricType::UserSatisfaction,
        ] {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{}\"", metric));
        }
    }

    #[test]
    fn test_correlation_method_default() {
        assert_eq!(CorrelationMethod::default(), CorrelationMethod::Pearson);
        assert_eq!(CorrelationMethod::Kendall.to_string(), "kendall");
    }
}
