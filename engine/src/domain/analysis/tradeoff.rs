//! Tradeoff flavor: score groups, extract the frontier, detect diminishing returns

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::types::{Constraints, PerformanceRecord, Scope, TradeoffRequest, Weights};
use crate::domain::analytics::{
    CostQualityPoint, DiminishingReturns, DiminishingReturnsDetector, ParetoPoint, ScoredGroup,
    TradeoffScorer, pareto_frontier,
};
use crate::domain::decision::{
    ConfidenceFactors, DecisionEvent, DecisionType, InputsCanonicalizer, outputs_hash,
};
use crate::domain::error::AnalysisError;
use crate::domain::recommend::{Recommendation, RecommendationGenerator, RecommendationSignals};

use super::AnalysisEngine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeoffSummary {
    pub record_count: usize,
    pub group_count: usize,
    pub model_count: usize,
    pub provider_count: usize,
    /// Fraction of records carrying quality
    pub quality_coverage: f64,
    pub best_overall: Option<String>,
    pub lowest_cost: Option<String>,
    pub lowest_latency: Option<String>,
    pub highest_quality: Option<String>,
    pub best_efficiency: Option<String>,
    /// Groups passing every configured constraint
    pub satisfying_constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeoffReport {
    pub scope: Scope,
    pub weights: Weights,
    pub groups: Vec<ScoredGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pareto_frontier: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diminishing_returns: Option<DiminishingReturns>,
    pub recommendations: Vec<Recommendation>,
    pub summary: TradeoffSummary,
}

/// Constraint settings as `name=value`, in a fixed order
pub fn describe_constraints(constraints: &Constraints) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(cost) = constraints.max_cost_per_request {
        out.push(format!("max_cost_per_request={}", cost.normalize()));
    }
    if let Some(latency) = constraints.max_latency_p95_ms {
        out.push(format!("max_latency_p95_ms={}", latency));
    }
    if let Some(quality) = constraints.min_quality {
        out.push(format!("min_quality={}", quality));
    }
    out
}

/// Names of the constraints a group fails. Missing quality fails `min_quality`.
pub fn constraint_violations(group: &ScoredGroup, constraints: &Constraints) -> Vec<String> {
    let mut violations = Vec::new();
    if let Some(max_cost) = constraints.max_cost_per_request
        && group.group.cost.cost_per_request > max_cost
    {
        violations.push("max_cost_per_request".to_string());
    }
    if let Some(max_latency) = constraints.max_latency_p95_ms
        && group.group.latency.p95_ms > max_latency
    {
        violations.push("max_latency_p95_ms".to_string());
    }
    if let Some(min_quality) = constraints.min_quality
        && group.group.quality_score().is_none_or(|q| q < min_quality)
    {
        violations.push("min_quality".to_string());
    }
    violations
}

fn distinct_count<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.collect::<BTreeSet<_>>().len()
}

/// First identifier with the best key; groups arrive sorted by identifier
fn best_by<F>(groups: &[ScoredGroup], better: F) -> Option<String>
where
    F: Fn(&ScoredGroup, &ScoredGroup) -> bool,
{
    let mut best: Option<&ScoredGroup> = None;
    for group in groups {
        if best.is_none_or(|current| better(group, current)) {
            best = Some(group);
        }
    }
    best.map(|g| g.group.identifier.clone())
}

fn summarize(records: &[PerformanceRecord], groups: &[ScoredGroup]) -> TradeoffSummary {
    let with_quality = records.iter().filter(|r| r.quality.is_some()).count();
    let with_quality_groups: Vec<ScoredGroup> = groups
        .iter()
        .filter(|g| g.group.quality.is_some())
        .cloned()
        .collect();

    TradeoffSummary {
        record_count: records.len(),
        group_count: groups.len(),
        model_count: distinct_count(records.iter().map(|r| r.model.as_str())),
        provider_count: distinct_count(records.iter().map(|r| r.provider.as_str())),
        quality_coverage: if records.is_empty() {
            0.0
        } else {
            with_quality as f64 / records.len() as f64
        },
        best_overall: best_by(groups, |a, b| a.score.overall_score > b.score.overall_score),
        lowest_cost: best_by(groups, |a, b| {
            a.group.cost.cost_per_request < b.group.cost.cost_per_request
        }),
        lowest_latency: best_by(groups, |a, b| a.group.latency.p95_ms < b.group.latency.p95_ms),
        highest_quality: best_by(&with_quality_groups, |a, b| {
            a.group.quality_score() > b.group.quality_score()
        }),
        best_efficiency: best_by(groups, |a, b| {
            a.score.efficiency_ratio > b.score.efficiency_ratio
        }),
        satisfying_constraints: groups
            .iter()
            .filter(|g| g.constraint_violations.is_empty())
            .map(|g| g.group.identifier.clone())
            .collect(),
    }
}

impl AnalysisEngine {
    pub(super) fn run_tradeoff(
        &self,
        request: &TradeoffRequest,
    ) -> Result<(TradeoffReport, DecisionEvent), AnalysisError> {
        let scorer = TradeoffScorer::new(
            self.policy.scoring(request.toggles.normalization),
            request.weights.unwrap_or_default(),
        );
        let aggregated = scorer.aggregate(&request.records, request.scope)?;
        let mut groups = scorer.score(aggregated);
        for group in &mut groups {
            group.constraint_violations = constraint_violations(group, &request.constraints);
        }

        let frontier: Option<Vec<String>> = request.toggles.pareto.then(|| {
            let points: Vec<ParetoPoint> = groups
                .iter()
                .map(|g| {
                    ParetoPoint::new(
                        g.group.identifier.clone(),
                        g.group.cost_per_request_f64(),
                        g.group.latency.p95_ms,
                        g.group.quality_score(),
                    )
                })
                .collect();
            pareto_frontier(&points)
                .into_iter()
                .map(|p| p.identifier)
                .collect()
        });
        let dominated: Vec<String> = match &frontier {
            Some(members) => groups
                .iter()
                .map(|g| g.group.identifier.clone())
                .filter(|id| !members.contains(id))
                .collect(),
            None => Vec::new(),
        };

        let diminishing = request.toggles.diminishing_returns.then(|| {
            let points: Vec<CostQualityPoint> = groups
                .iter()
                .filter_map(|g| {
                    g.group.quality_score().map(|quality| CostQualityPoint {
                        identifier: g.group.identifier.clone(),
                        cost: g.group.cost_per_request_f64(),
                        quality,
                    })
                })
                .collect();
            DiminishingReturnsDetector::new(
                self.policy.diminishing_ratio,
                self.policy.diminishing_min_groups,
            )
            .detect(&points)
        });

        let violators: Vec<String> = groups
            .iter()
            .filter(|g| !g.constraint_violations.is_empty())
            .map(|g| g.group.identifier.clone())
            .collect();

        let unit_costs: Vec<(String, Decimal)> = groups
            .iter()
            .map(|g| (g.group.identifier.clone(), g.group.cost.cost_per_1k_tokens))
            .collect();

        let recommendations = if request.toggles.recommendations {
            RecommendationGenerator::new(self.policy.cost_per_1k_threshold).generate(
                &RecommendationSignals {
                    diminishing: diminishing.as_ref(),
                    frontier: frontier.as_deref().unwrap_or_default(),
                    dominated: &dominated,
                    constraint_violators: &violators,
                    group_unit_costs: &unit_costs,
                    ..Default::default()
                },
            )
        } else {
            Vec::new()
        };

        let summary = summarize(&request.records, &groups);
        let weights = scorer.weights();

        tracing::debug!(
            scope = %request.scope,
            records = summary.record_count,
            groups = summary.group_count,
            frontier = frontier.as_ref().map_or(0, Vec::len),
            "Tradeoff analysis complete"
        );

        let constraints = describe_constraints(&request.constraints);
        let inputs = InputsCanonicalizer::new(serde_json::json!({
            "analysis": "tradeoff",
            "scope": request.scope,
            "weights": weights,
            "toggles": request.toggles,
        }))
        .identifiers(request.records.iter().map(|r| r.id.as_str()))
        .constraints(&constraints);

        let outputs = serde_json::json!({
            "group_count": summary.group_count,
            "best_overall": summary.best_overall,
            "pareto_frontier": frontier,
            "diminishing_returns_detected": diminishing.as_ref().is_some_and(DiminishingReturns::is_detected),
            "recommendation_count": recommendations.len(),
            "scores_hash": outputs_hash(&serde_json::to_value(&groups).unwrap_or_default()),
        });

        let factors = ConfidenceFactors {
            record_count: summary.record_count,
            quality_coverage: summary.quality_coverage,
            model_count: summary.model_count,
            provider_count: summary.provider_count,
            frontier_size: frontier.as_ref().map_or(0, Vec::len),
        };
        let mut event = self.builder.build(
            DecisionType::TradeoffAnalysis,
            &inputs,
            outputs,
            &factors,
            request.execution_ref.clone(),
        );
        if !request.constraints.is_empty() {
            event.constraints_applied.push(format!(
                "satisfied_groups={}/{}",
                summary.satisfying_constraints.len(),
                summary.group_count
            ));
        }

        let report = TradeoffReport {
            scope: request.scope,
            weights,
            groups,
            pareto_frontier: frontier,
            diminishing_returns: diminishing,
            recommendations,
            summary,
        };
        Ok((report, event))
    }
}

#[cfg(test)]
#[path = "tradeoff_tests.rs"]
mod tests;
