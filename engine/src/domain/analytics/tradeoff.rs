//! Grouping, averaging and weighted scoring of performance records

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::data::types::{
    LatencyBreakdown, PerformanceRecord, QualityMetrics, Scope, Weights,
};
use crate::domain::error::AnalysisError;

use super::stats::{mean_present, min_max, stable_mean};

/// Quality assumed for groups without any quality data
pub const NEUTRAL_QUALITY: f64 = 0.5;

/// Key used when tier scoping meets a record without a tier
pub const UNSPECIFIED_TIER: &str = "unspecified";

/// Provider/model label for groups spanning several values
pub const MIXED: &str = "mixed";

// ============================================================================
// Policy
// ============================================================================

/// Normalization knobs. Ceilings apply when min-max is disabled or degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub normalize: bool,
    pub cost_ceiling_per_request: f64,
    pub latency_ceiling_ms: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            normalize: true,
            cost_ceiling_per_request: 0.10,
            latency_ceiling_ms: 10_000.0,
        }
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Exact mean cost of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageCost {
    pub total_cost: Decimal,
    pub cost_per_request: Decimal,
    pub cost_per_1k_tokens: Decimal,
    pub token_count: f64,
}

/// Records sharing one scope key, averaged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedGroup {
    pub identifier: String,
    pub provider: String,
    pub model: String,
    pub record_count: usize,
    pub cost: AverageCost,
    pub latency: LatencyBreakdown,
    /// Averaged over the records that carry quality only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMetrics>,
    pub quality_record_count: usize,
}

impl AggregatedGroup {
    pub fn cost_per_request_f64(&self) -> f64 {
        self.cost.cost_per_request.to_f64().unwrap_or(0.0)
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.quality.as_ref().map(|q| q.composite_score)
    }
}

/// Component and combined scores, each in [0, 1] except `efficiency_ratio`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeoffScore {
    pub overall_score: f64,
    pub cost_score: f64,
    pub latency_score: f64,
    pub quality_score: f64,
    /// Quality per unit of cost_per_request; 0 when cost is 0
    pub efficiency_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredGroup {
    #[serde(flatten)]
    pub group: AggregatedGroup,
    pub score: TradeoffScore,
    /// Constraint names this group fails; advisory only
    pub constraint_violations: Vec<String>,
}

// ============================================================================
// Normalization
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Normalizer {
    MinMax { min: f64, max: f64 },
    Fixed { ceiling: f64 },
}

impl Normalizer {
    fn fit(values: &[f64], enabled: bool, ceiling: f64) -> Self {
        match min_max(values) {
            Some((min, max)) if enabled && max > min => Self::MinMax { min, max },
            _ => Self::Fixed { ceiling },
        }
    }

    fn apply(&self, value: f64) -> f64 {
        let normalized = match *self {
            Self::MinMax { min, max } => (value - min) / (max - min),
            Self::Fixed { ceiling } if ceiling > 0.0 => value / ceiling,
            Self::Fixed { .. } => 0.0,
        };
        if normalized.is_finite() {
            normalized.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

// ============================================================================
// Scorer
// ============================================================================

pub struct TradeoffScorer {
    policy: ScoringPolicy,
    weights: Weights,
}

impl TradeoffScorer {
    /// Weights are normalized to sum to 1
    pub fn new(policy: ScoringPolicy, weights: Weights) -> Self {
        Self {
            policy,
            weights: weights.normalized(),
        }
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    /// Grouping key of a record under `scope`
    pub fn group_key(record: &PerformanceRecord, scope: Scope) -> String {
        match scope {
            Scope::Model => format!("{}/{}", record.provider, record.model),
            Scope::Provider => record.provider.clone(),
            Scope::Tier => record
                .model_tier
                .clone()
                .unwrap_or_else(|| UNSPECIFIED_TIER.to_string()),
            Scope::Execution => record
                .execution_id
                .clone()
                .unwrap_or_else(|| record.id.clone()),
        }
    }

    /// Group records and average each group. Output is sorted by identifier.
    pub fn aggregate(
        &self,
        records: &[PerformanceRecord],
        scope: Scope,
    ) -> Result<Vec<AggregatedGroup>, AnalysisError> {
        let mut grouped: BTreeMap<String, Vec<&PerformanceRecord>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(Self::group_key(record, scope))
                .or_default()
                .push(record);
        }

        grouped
            .into_iter()
            .map(|(identifier, members)| aggregate_group(identifier, &members))
            .collect()
    }

    /// Normalize across groups and combine into weighted scores
    pub fn score(&self, groups: Vec<AggregatedGroup>) -> Vec<ScoredGroup> {
        let costs: Vec<f64> = groups.iter().map(|g| g.cost_per_request_f64()).collect();
        let latencies: Vec<f64> = groups.iter().map(|g| g.latency.p95_ms).collect();
        let qualities: Vec<f64> = groups.iter().filter_map(|g| g.quality_score()).collect();

        let cost_norm = Normalizer::fit(
            &costs,
            self.policy.normalize,
            self.policy.cost_ceiling_per_request,
        );
        let latency_norm = Normalizer::fit(
            &latencies,
            self.policy.normalize,
            self.policy.latency_ceiling_ms,
        );
        let quality_norm = Normalizer::fit(&qualities, self.policy.normalize, 1.0);

        tracing::debug!(
            groups = groups.len(),
            groups_with_quality = qualities.len(),
            ?cost_norm,
            ?latency_norm,
            "Scoring groups"
        );

        groups
            .into_iter()
            .map(|group| {
                let cost = group.cost_per_request_f64();
                let cost_score = 1.0 - cost_norm.apply(cost);
                let latency_score = 1.0 - latency_norm.apply(group.latency.p95_ms);
                let quality_score = group
                    .quality_score()
                    .map(|q| quality_norm.apply(q))
                    .unwrap_or(NEUTRAL_QUALITY);

                let overall_score = (self.weights.cost * cost_score
                    + self.weights.latency * latency_score
                    + self.weights.quality * quality_score)
                    .clamp(0.0, 1.0);

                let raw_quality = group.quality_score().unwrap_or(NEUTRAL_QUALITY);
                let efficiency_ratio = if cost > 0.0 { raw_quality / cost } else { 0.0 };

                ScoredGroup {
                    group,
                    score: TradeoffScore {
                        overall_score,
                        cost_score,
                        latency_score,
                        quality_score,
                        efficiency_ratio,
                    },
                    constraint_violations: Vec::new(),
                }
            })
            .collect()
    }
}

fn shared_or_mixed<'a>(mut values: impl Iterator<Item = &'a str>) -> String {
    match values.next() {
        Some(first) if values.all(|v| v == first) => first.to_string(),
        Some(_) => MIXED.to_string(),
        None => String::new(),
    }
}

fn decimal_mean(
    values: impl Iterator<Item = Decimal>,
    count: usize,
    field: &str,
) -> Result<Decimal, AnalysisError> {
    let mut sum = Decimal::ZERO;
    for value in values {
        sum = sum
            .checked_add(value)
            .ok_or_else(|| AnalysisError::overflow(field))?;
    }
    sum.checked_div(Decimal::from(count.max(1)))
        .map(|mean| mean.normalize())
        .ok_or_else(|| AnalysisError::overflow(field))
}

fn aggregate_group(
    identifier: String,
    members: &[&PerformanceRecord],
) -> Result<AggregatedGroup, AnalysisError> {
    let count = members.len();

    let cost = AverageCost {
        total_cost: decimal_mean(members.iter().map(|r| r.cost.total_cost), count, "total_cost")?,
        cost_per_request: decimal_mean(
            members.iter().map(|r| r.cost.cost_per_request),
            count,
            "cost_per_request",
        )?,
        cost_per_1k_tokens: decimal_mean(
            members.iter().map(|r| r.cost.cost_per_1k_tokens),
            count,
            "cost_per_1k_tokens",
        )?,
        token_count: {
            let total: u128 = members.iter().map(|r| u128::from(r.cost.token_count)).sum();
            total as f64 / count.max(1) as f64
        },
    };

    let latency_mean = |select: fn(&LatencyBreakdown) -> f64| -> f64 {
        let values: Vec<f64> = members.iter().map(|r| select(&r.latency)).collect();
        stable_mean(&values).unwrap_or(0.0)
    };
    let latency = LatencyBreakdown {
        p50_ms: latency_mean(|l| l.p50_ms),
        p95_ms: latency_mean(|l| l.p95_ms),
        p99_ms: latency_mean(|l| l.p99_ms),
        avg_ms: latency_mean(|l| l.avg_ms),
        min_ms: latency_mean(|l| l.min_ms),
        max_ms: latency_mean(|l| l.max_ms),
    };

    let with_quality: Vec<&QualityMetrics> =
        members.iter().filter_map(|r| r.quality.as_ref()).collect();
    let quality = if with_quality.is_empty() {
        None
    } else {
        let dimension = |index: usize| mean_present(with_quality.iter().map(|q| q.dimensions()[index]));
        Some(QualityMetrics {
            composite_score: mean_present(with_quality.iter().map(|q| Some(q.composite_score)))
                .unwrap_or(0.0),
            accuracy: dimension(0),
            relevance: dimension(1),
            coherence: dimension(2),
            completeness: dimension(3),
            safety: dimension(4),
        })
    };

    Ok(AggregatedGroup {
        identifier,
        provider: shared_or_mixed(members.iter().map(|r| r.provider.as_str())),
        model: shared_or_mixed(members.iter().map(|r| r.model.as_str())),
        record_count: count,
        cost,
        latency,
        quality,
        quality_record_count: with_quality.len(),
    })
}

#[cfg(test)]
#[path = "tradeoff_tests.rs"]
mod tests;
