//! ROI flavor: exact sums of spend and gain, then ROI figures

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::types::RoiRequest;
use crate::domain::analytics::roi::{cost_per_1k_units, sum_exact};
use crate::domain::analytics::{RoiCalculator, RoiMetric};
use crate::domain::decision::{
    ConfidenceFactors, DecisionEvent, DecisionType, InputsCanonicalizer, outputs_hash,
};
use crate::domain::error::AnalysisError;
use crate::domain::recommend::{Recommendation, RecommendationGenerator, RecommendationSignals};

use super::AnalysisEngine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiSummary {
    pub cost_record_count: usize,
    pub gain_count: usize,
    pub total_units: u64,
    pub model_count: usize,
    pub provider_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiReport {
    pub period_days: u32,
    pub roi: RoiMetric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_1k_units: Option<Decimal>,
    pub recommendations: Vec<Recommendation>,
    pub summary: RoiSummary,
}

impl AnalysisEngine {
    pub(super) fn run_roi(
        &self,
        request: &RoiRequest,
    ) -> Result<(RoiReport, DecisionEvent), AnalysisError> {
        let total_cost = sum_exact(request.cost_records.iter().map(|r| r.cost), "total_cost")?;
        let total_gain = sum_exact(request.gains.iter().map(|g| g.value), "total_gain")?;
        let total_units = request
            .cost_records
            .iter()
            .try_fold(0u64, |acc, r| acc.checked_add(r.units))
            .ok_or_else(|| AnalysisError::overflow("units"))?;

        let roi = RoiCalculator::new().calculate(total_cost, total_gain, request.period_days)?;
        let per_1k = cost_per_1k_units(total_cost, total_units);
        let threshold = request
            .cost_per_1k_threshold
            .unwrap_or(self.policy.cost_per_1k_threshold);

        let recommendations = RecommendationGenerator::new(threshold).generate(&RecommendationSignals {
            roi: Some(&roi),
            cost_per_1k_units: per_1k,
            ..Default::default()
        });

        let summary = RoiSummary {
            cost_record_count: request.cost_records.len(),
            gain_count: request.gains.len(),
            total_units,
            model_count: request
                .cost_records
                .iter()
                .filter_map(|r| r.model.as_deref())
                .collect::<BTreeSet<_>>()
                .len(),
            provider_count: request
                .cost_records
                .iter()
                .filter_map(|r| r.provider.as_deref())
                .collect::<BTreeSet<_>>()
                .len(),
        };

        tracing::debug!(
            total_cost = %roi.total_cost,
            total_gain = %roi.total_gain,
            infinite = roi.roi_percentage.is_infinite(),
            "ROI analysis complete"
        );

        let constraints = vec![format!("cost_per_1k_threshold={}", threshold.normalize())];
        let inputs = InputsCanonicalizer::new(serde_json::json!({
            "analysis": "roi",
            "period_days": request.period_days,
        }))
        .identifiers(request.cost_records.iter().map(|r| format!("cost:{}", r.id)))
        .identifiers(request.gains.iter().map(|g| format!("gain:{}", g.id)))
        .constraints(&constraints);

        let outputs = serde_json::json!({
            "roi_percentage": roi.roi_percentage,
            "net_value": roi.net_value,
            "payback_period_days": roi.payback_period_days,
            "recommendation_count": recommendations.len(),
            "roi_hash": outputs_hash(&serde_json::to_value(&roi).unwrap_or_default()),
        });

        let factors = ConfidenceFactors {
            record_count: summary.cost_record_count,
            quality_coverage: if total_gain > Decimal::ZERO { 1.0 } else { 0.0 },
            model_count: summary.model_count,
            provider_count: summary.provider_count,
            frontier_size: 0,
        };
        let event = self.builder.build(
            DecisionType::RoiAnalysis,
            &inputs,
            outputs,
            &factors,
            request.execution_ref.clone(),
        );

        let report = RoiReport {
            period_days: request.period_days,
            roi,
            cost_per_1k_units: per_1k,
            recommendations,
            summary,
        };
        Ok((report, event))
    }
}
