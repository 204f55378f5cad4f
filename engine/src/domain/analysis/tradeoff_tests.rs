use super::*;
use crate::data::types::{AnalysisToggles, CostBreakdown, LatencyBreakdown, QualityMetrics};
use crate::domain::analytics::DiminishingReturns;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn record(
    id: &str,
    provider: &str,
    model: &str,
    cost_per_request: Decimal,
    p95_ms: f64,
    quality: Option<f64>,
) -> PerformanceRecord {
    PerformanceRecord {
        id: id.to_string(),
        provider: provider.to_string(),
        model: model.to_string(),
        model_tier: None,
        execution_id: None,
        cost: CostBreakdown {
            total_cost: cost_per_request * dec!(10),
            cost_per_request,
            cost_per_1k_tokens: dec!(0.001),
            token_count: 500,
        },
        latency: LatencyBreakdown {
            p50_ms: p95_ms / 2.0,
            p95_ms,
            p99_ms: p95_ms,
            avg_ms: p95_ms / 2.0,
            min_ms: 1.0,
            max_ms: p95_ms,
        },
        quality: quality.map(|composite_score| QualityMetrics {
            composite_score,
            ..Default::default()
        }),
        timestamp: None,
    }
}

fn request(records: Vec<PerformanceRecord>) -> TradeoffRequest {
    TradeoffRequest {
        records,
        scope: Scope::Model,
        weights: None,
        constraints: Constraints::default(),
        toggles: AnalysisToggles::default(),
        execution_ref: None,
    }
}

fn ladder() -> Vec<PerformanceRecord> {
    vec![
        record("a", "openai", "nano", dec!(0.001), 200.0, Some(0.50)),
        record("b", "openai", "mini", dec!(0.002), 300.0, Some(0.80)),
        record("c", "mistral", "mid", dec!(0.003), 500.0, Some(0.85)),
        record("d", "mistral", "large", dec!(0.004), 900.0, Some(0.86)),
        record("e", "google", "slow", dec!(0.004), 1200.0, Some(0.60)),
    ]
}

#[test]
fn test_full_tradeoff_report() {
    let engine = AnalysisEngine::default();
    let (report, event) = engine.run_tradeoff(&request(ladder())).unwrap();

    assert_eq!(report.groups.len(), 5);
    let frontier = report.pareto_frontier.as_ref().unwrap();
    assert!(!frontier.contains(&"google/slow".to_string()));
    assert!(frontier.contains(&"openai/nano".to_string()));

    assert!(matches!(
        report.diminishing_returns,
        Some(DiminishingReturns::Detected { .. })
    ));
    assert_eq!(report.summary.lowest_cost.as_deref(), Some("openai/nano"));
    assert_eq!(report.summary.lowest_latency.as_deref(), Some("openai/nano"));
    assert_eq!(report.summary.highest_quality.as_deref(), Some("mistral/large"));
    assert_eq!(report.summary.model_count, 5);
    assert_eq!(report.summary.provider_count, 3);
    assert_eq!(report.summary.quality_coverage, 1.0);

    assert_eq!(event.decision_type, DecisionType::TradeoffAnalysis);
    assert!(event.validate().is_ok());
    assert!(event.confidence <= 0.95);
    assert!(!report.recommendations.is_empty());
}

#[test]
fn test_toggles_disable_sub_analyses() {
    let engine = AnalysisEngine::default();
    let mut req = request(ladder());
    req.toggles = AnalysisToggles {
        pareto: false,
        diminishing_returns: false,
        recommendations: false,
        normalization: true,
    };
    let (report, _) = engine.run_tradeoff(&req).unwrap();
    assert!(report.pareto_frontier.is_none());
    assert!(report.diminishing_returns.is_none());
    assert!(report.recommendations.is_empty());
}

#[test]
fn test_constraints_flag_but_keep_groups() {
    let engine = AnalysisEngine::default();
    let mut req = request(ladder());
    req.constraints = Constraints {
        max_cost_per_request: Some(dec!(0.003)),
        max_latency_p95_ms: Some(1000.0),
        min_quality: Some(0.7),
    };
    let (report, event) = engine.run_tradeoff(&req).unwrap();
    assert_eq!(report.groups.len(), 5);

    let slow = report
        .groups
        .iter()
        .find(|g| g.group.identifier == "google/slow")
        .unwrap();
    assert_eq!(
        slow.constraint_violations,
        vec!["max_cost_per_request", "max_latency_p95_ms", "min_quality"]
    );
    assert_eq!(
        report.summary.satisfying_constraints,
        vec!["mistral/mid", "openai/mini"]
    );
    assert_eq!(
        event.constraints_applied,
        vec![
            "max_cost_per_request=0.003",
            "max_latency_p95_ms=1000",
            "min_quality=0.7",
            "satisfied_groups=2/5",
        ]
    );
    assert_eq!(
        report.recommendations[0].category,
        crate::domain::recommend::RecommendationCategory::ModelSelection
    );
}

#[test]
fn test_expensive_unit_cost_suggests_model_selection() {
    let engine = AnalysisEngine::default();
    let mut records = vec![
        record("a", "openai", "gpt-4o", dec!(0.01), 400.0, Some(0.9)),
        record("b", "mistral", "large", dec!(0.02), 500.0, Some(0.8)),
    ];
    for r in &mut records {
        r.cost.cost_per_1k_tokens = dec!(5);
    }
    let mut req = request(records);
    req.toggles.pareto = false;
    req.toggles.diminishing_returns = false;

    let (report, _) = engine.run_tradeoff(&req).unwrap();
    assert_eq!(report.recommendations.len(), 1);
    let rec = &report.recommendations[0];
    assert_eq!(
        rec.category,
        crate::domain::recommend::RecommendationCategory::ModelSelection
    );
    assert_eq!(rec.priority, crate::domain::recommend::Priority::Medium);
    assert!(rec.rationale.contains("mistral/large"));
    assert!(rec.rationale.contains("openai/gpt-4o"));
}

#[test]
fn test_missing_quality_fails_min_quality() {
    let engine = AnalysisEngine::default();
    let mut req = request(vec![record("x", "p", "m", dec!(0.01), 100.0, None)]);
    req.constraints.min_quality = Some(0.1);
    let (report, _) = engine.run_tradeoff(&req).unwrap();
    assert_eq!(report.groups[0].constraint_violations, vec!["min_quality"]);
}

#[test]
fn test_single_group_without_quality() {
    let engine = AnalysisEngine::default();
    let (report, event) = engine
        .run_tradeoff(&request(vec![record("x", "p", "m", dec!(0.01), 100.0, None)]))
        .unwrap();
    assert_eq!(
        report.diminishing_returns,
        Some(DiminishingReturns::InsufficientData {
            groups_with_quality: 0
        })
    );
    assert_eq!(report.pareto_frontier, Some(vec!["p/m".to_string()]));
    assert!((0.0..=0.95).contains(&event.confidence));
}

#[test]
fn test_order_independent_hash_and_scores() {
    let engine = AnalysisEngine::default();
    let forward = request(ladder());
    let mut shuffled = forward.clone();
    shuffled.records.rotate_left(2);
    shuffled.records.swap(0, 3);

    let (a, ea) = engine.run_tradeoff(&forward).unwrap();
    let (b, eb) = engine.run_tradeoff(&shuffled).unwrap();
    assert_eq!(ea.inputs_hash, eb.inputs_hash);
    assert_eq!(a.groups, b.groups);
    assert_eq!(ea.outputs, eb.outputs);
}

#[test]
fn test_describe_constraints_empty() {
    assert!(describe_constraints(&Constraints::default()).is_empty());
}
