//! Correlation flavor: align cost against each outcome metric and correlate

use std::collections::BTreeSet;

use serde::Serialize;

use crate::data::types::{CorrelationMethod, CorrelationRequest, Sample};
use crate::domain::analytics::{CorrelationAnalyzer, CorrelationResult, TimeSeriesAligner};
use crate::domain::decision::{
    ConfidenceFactors, DecisionEvent, DecisionType, InputsCanonicalizer, outputs_hash,
};
use crate::domain::error::AnalysisError;
use crate::domain::recommend::{Recommendation, RecommendationGenerator, RecommendationSignals};

use super::AnalysisEngine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationSummary {
    pub cost_sample_count: usize,
    pub metric_count: usize,
    /// Metrics with at least three aligned buckets
    pub sufficient_count: usize,
    pub significant_count: usize,
    /// Largest |coefficient| among significant results
    pub strongest_metric: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub method: CorrelationMethod,
    pub significance_level: f64,
    pub correlations: Vec<CorrelationResult>,
    pub recommendations: Vec<Recommendation>,
    pub summary: CorrelationSummary,
}

fn sample_keys<'a>(label: &'a str, samples: &'a [Sample]) -> impl Iterator<Item = String> + 'a {
    samples
        .iter()
        .map(move |s| format!("{}@{}={}", label, s.timestamp.timestamp_millis(), s.value))
}

impl AnalysisEngine {
    pub(super) fn run_correlation(
        &self,
        request: &CorrelationRequest,
    ) -> Result<(CorrelationReport, DecisionEvent), AnalysisError> {
        let significance_level = request
            .significance_level
            .unwrap_or(self.policy.significance_level);
        let analyzer = CorrelationAnalyzer::new(significance_level);

        let correlations: Vec<CorrelationResult> = request
            .metrics
            .iter()
            .map(|metric| {
                let aligned = TimeSeriesAligner::new(metric.correlation_window_hours)
                    .align(&request.cost_samples, &metric.samples);
                if aligned.is_empty() {
                    tracing::debug!(metric = %metric.metric_name, "No overlapping buckets");
                }
                analyzer.analyze(
                    &metric.metric_name,
                    metric.metric_type,
                    request.method,
                    &aligned.left,
                    &aligned.right,
                )
            })
            .collect();

        let sufficient_count = correlations.iter().filter(|c| c.has_sufficient_data()).count();
        let significant: Vec<&CorrelationResult> =
            correlations.iter().filter(|c| c.is_significant).collect();
        let strongest_metric = significant
            .iter()
            .fold(None::<&CorrelationResult>, |best, c| match best {
                Some(b) if b.coefficient.abs() >= c.coefficient.abs() => Some(b),
                _ => Some(c),
            })
            .map(|c| c.metric_name.clone());

        let summary = CorrelationSummary {
            cost_sample_count: request.cost_samples.len(),
            metric_count: request.metrics.len(),
            sufficient_count,
            significant_count: significant.len(),
            strongest_metric,
        };

        let recommendations = RecommendationGenerator::new(self.policy.cost_per_1k_threshold)
            .generate(&RecommendationSignals {
                correlations: &correlations,
                ..Default::default()
            });

        tracing::debug!(
            method = %request.method,
            metrics = summary.metric_count,
            significant = summary.significant_count,
            "Correlation analysis complete"
        );

        let windows: Vec<String> = request
            .metrics
            .iter()
            .map(|m| format!("{}={}h", m.metric_name, m.correlation_window_hours))
            .collect();
        let constraints = vec![format!("significance_level={}", significance_level)];
        let mut identifiers: Vec<String> = sample_keys("cost", &request.cost_samples).collect();
        for metric in &request.metrics {
            identifiers.extend(sample_keys(&metric.metric_name, &metric.samples));
        }
        let inputs = InputsCanonicalizer::new(serde_json::json!({
            "analysis": "correlation",
            "method": request.method,
            "windows": windows,
        }))
        .identifiers(identifiers)
        .constraints(&constraints);

        let outputs = serde_json::json!({
            "metric_count": summary.metric_count,
            "significant_count": summary.significant_count,
            "strongest_metric": summary.strongest_metric,
            "recommendation_count": recommendations.len(),
            "correlations_hash": outputs_hash(&serde_json::to_value(&correlations).unwrap_or_default()),
        });

        let metric_types = request
            .metrics
            .iter()
            .map(|m| m.metric_type)
            .collect::<BTreeSet<_>>()
            .len();
        let factors = ConfidenceFactors {
            record_count: request.cost_samples.len(),
            quality_coverage: sufficient_count as f64 / request.metrics.len().max(1) as f64,
            model_count: request.metrics.len(),
            provider_count: metric_types,
            frontier_size: summary.significant_count,
        };
        let event = self.builder.build(
            DecisionType::CorrelationAnalysis,
            &inputs,
            outputs,
            &factors,
            request.execution_ref.clone(),
        );

        let report = CorrelationReport {
            method: request.method,
            significance_level,
            correlations,
            recommendations,
            summary,
        };
        Ok((report, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{MetricType, OutcomeMetric};
    use chrono::{Duration, TimeZone, Utc};

    fn hourly(values: &[f64]) -> Vec<Sample> {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(start + Duration::hours(i as i64), *v))
            .collect()
    }

    fn metric(name: &str, values: &[f64]) -> OutcomeMetric {
        OutcomeMetric {
            metric_type: MetricType::Throughput,
            metric_name: name.to_string(),
            value: 0.0,
            unit: "rps".into(),
            correlation_window_hours: 1,
            samples: hourly(values),
        }
    }

    fn request(metrics: Vec<OutcomeMetric>) -> CorrelationRequest {
        CorrelationRequest {
            cost_samples: hourly(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            metrics,
            method: CorrelationMethod::Pearson,
            significance_level: None,
            execution_ref: None,
        }
    }

    #[test]
    fn test_insufficient_metric_does_not_block_others() {
        let engine = AnalysisEngine::default();
        let (report, event) = engine
            .run_correlation(&request(vec![
                metric("linear", &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]),
                metric("sparse", &[1.0, 2.0]),
            ]))
            .unwrap();
        assert_eq!(report.correlations.len(), 2);
        assert!(report.correlations[0].is_significant);
        assert_eq!(report.correlations[1].sample_size, 2);
        assert_eq!(report.correlations[1].p_value, Some(1.0));
        assert_eq!(report.summary.sufficient_count, 1);
        assert_eq!(report.summary.strongest_metric.as_deref(), Some("linear"));
        assert_eq!(event.decision_type, DecisionType::CorrelationAnalysis);
        assert_eq!(event.constraints_applied, vec!["significance_level=0.05"]);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_request_significance_overrides_policy() {
        let engine = AnalysisEngine::default();
        let mut req = request(vec![metric("m", &[1.0, 3.0, 2.0, 5.0, 4.0, 6.0])]);
        req.significance_level = Some(0.2);
        let (report, _) = engine.run_correlation(&req).unwrap();
        assert_eq!(report.significance_level, 0.2);
    }

    #[test]
    fn test_hash_ignores_sample_order() {
        let engine = AnalysisEngine::default();
        let forward = request(vec![metric("m", &[1.0, 3.0, 2.0, 5.0, 4.0, 6.0])]);
        let mut reversed = forward.clone();
        reversed.cost_samples.reverse();
        reversed.metrics[0].samples.reverse();
        let (a_report, a) = engine.run_correlation(&forward).unwrap();
        let (b_report, b) = engine.run_correlation(&reversed).unwrap();
        assert_eq!(a.inputs_hash, b.inputs_hash);
        assert_eq!(a_report.correlations, b_report.correlations);
    }
}
