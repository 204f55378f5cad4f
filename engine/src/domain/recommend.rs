//! Rule table turning analysis signals into prioritized advisories
//!
//! Rules are fixed and evaluated in a fixed order, so identical signals
//! always produce the identical list.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::analytics::{CorrelationResult, CorrelationStrength, DiminishingReturns, RoiMetric};

const ROI_CONFIDENCE: f64 = 0.85;
const COST_PER_1K_CONFIDENCE: f64 = 0.7;
const LONG_PAYBACK_CONFIDENCE: f64 = 0.75;
const SHORT_PAYBACK_CONFIDENCE: f64 = 0.7;
const DIMINISHING_CONFIDENCE: f64 = 0.65;
const FRONTIER_CONFIDENCE: f64 = 0.6;
const CONSTRAINT_CONFIDENCE: f64 = 0.9;

const LONG_PAYBACK_DAYS: Decimal = dec!(90);
const SHORT_PAYBACK_DAYS: Decimal = dec!(7);
const LOW_ROI_PERCENT: Decimal = dec!(50);
const HIGH_ROI_PERCENT: Decimal = dec!(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    CostOptimization,
    OutcomeImprovement,
    ScalingDecision,
    ProcessImprovement,
    ModelSelection,
    BudgetAdjustment,
}

impl fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CostOptimization => "cost_optimization",
            Self::OutcomeImprovement => "outcome_improvement",
            Self::ScalingDecision => "scaling_decision",
            Self::ProcessImprovement => "process_improvement",
            Self::ModelSelection => "model_selection",
            Self::BudgetAdjustment => "budget_adjustment",
        };
        write!(f, "{}", name)
    }
}

/// Declaration order is sort order: high first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub title: String,
    pub rationale: String,
    pub estimated_impact: String,
    /// In [0, 1]
    pub confidence: f64,
}

impl Recommendation {
    fn new(
        category: RecommendationCategory,
        priority: Priority,
        title: impl Into<String>,
        rationale: impl Into<String>,
        estimated_impact: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            category,
            priority,
            title: title.into(),
            rationale: rationale.into(),
            estimated_impact: estimated_impact.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Everything the rule table can react to. Absent signals trigger nothing.
#[derive(Debug, Default)]
pub struct RecommendationSignals<'a> {
    pub roi: Option<&'a RoiMetric>,
    pub correlations: &'a [CorrelationResult],
    pub cost_per_1k_units: Option<Decimal>,
    /// Per-group cost per 1k tokens, by group identifier
    pub group_unit_costs: &'a [(String, Decimal)],
    pub diminishing: Option<&'a DiminishingReturns>,
    pub frontier: &'a [String],
    pub dominated: &'a [String],
    pub constraint_violators: &'a [String],
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationGenerator {
    cost_per_1k_threshold: Decimal,
}

impl RecommendationGenerator {
    pub fn new(cost_per_1k_threshold: Decimal) -> Self {
        Self {
            cost_per_1k_threshold,
        }
    }

    /// Apply every rule, then sort by priority (stable within a priority)
    pub fn generate(&self, signals: &RecommendationSignals<'_>) -> Vec<Recommendation> {
        let mut out = Vec::new();

        if let Some(roi) = signals.roi {
            roi_rules(roi, &mut out);
        }
        correlation_rules(signals.correlations, &mut out);
        if let Some(cost) = signals.cost_per_1k_units
            && cost > self.cost_per_1k_threshold
        {
            out.push(Recommendation::new(
                RecommendationCategory::ModelSelection,
                Priority::Medium,
                "Evaluate cheaper models",
                format!(
                    "Cost per 1k units is {} against a threshold of {}",
                    cost, self.cost_per_1k_threshold
                ),
                "Lower unit cost at comparable output",
                COST_PER_1K_CONFIDENCE,
            ));
        }
        self.group_unit_cost_rule(signals.group_unit_costs, &mut out);
        tradeoff_rules(signals, &mut out);

        out.sort_by_key(|r| r.priority);
        tracing::debug!(count = out.len(), "Recommendations generated");
        out
    }

    fn group_unit_cost_rule(
        &self,
        unit_costs: &[(String, Decimal)],
        out: &mut Vec<Recommendation>,
    ) {
        let expensive: Vec<&str> = unit_costs
            .iter()
            .filter(|(_, cost)| *cost > self.cost_per_1k_threshold)
            .map(|(identifier, _)| identifier.as_str())
            .collect();
        if expensive.is_empty() {
            return;
        }
        out.push(Recommendation::new(
            RecommendationCategory::ModelSelection,
            Priority::Medium,
            "Evaluate cheaper models",
            format!(
                "Cost per 1k tokens exceeds {} for: {}",
                self.cost_per_1k_threshold,
                expensive.join(", ")
            ),
            "Lower unit cost at comparable output",
            COST_PER_1K_CONFIDENCE,
        ));
    }
}

fn roi_rules(roi: &RoiMetric, out: &mut Vec<Recommendation>) {
    if let Some(percentage) = roi.roi_percentage.finite() {
        if percentage < Decimal::ZERO {
            out.push(Recommendation::new(
                RecommendationCategory::CostOptimization,
                Priority::High,
                "Spend exceeds returns",
                format!("ROI is {}%; the spend is not paying for itself", percentage),
                format!("Recover up to {} in net losses", -roi.net_value),
                ROI_CONFIDENCE,
            ));
        } else if percentage < LOW_ROI_PERCENT {
            out.push(Recommendation::new(
                RecommendationCategory::OutcomeImprovement,
                Priority::Medium,
                "Improve outcomes per unit of spend",
                format!("ROI is {}%, below the {}% mark", percentage, LOW_ROI_PERCENT),
                "Raise monetized gain without adding cost",
                ROI_CONFIDENCE,
            ));
        }
    }
    if roi.roi_percentage.exceeds(HIGH_ROI_PERCENT) {
        out.push(Recommendation::new(
            RecommendationCategory::ScalingDecision,
            Priority::Medium,
            "Consider scaling this workload",
            format!("ROI exceeds {}%", HIGH_ROI_PERCENT),
            "Additional spend is likely to return more than it costs",
            ROI_CONFIDENCE,
        ));
    }

    if let Some(payback) = roi.payback_period_days {
        if payback > LONG_PAYBACK_DAYS {
            out.push(Recommendation::new(
                RecommendationCategory::BudgetAdjustment,
                Priority::Medium,
                "Long payback period",
                format!("Spend takes {} days to pay back", payback),
                "Rebalance budget toward faster-returning work",
                LONG_PAYBACK_CONFIDENCE,
            ));
        } else if payback < SHORT_PAYBACK_DAYS {
            out.push(Recommendation::new(
                RecommendationCategory::ScalingDecision,
                Priority::Low,
                "Fast payback",
                format!("Spend pays back in {} days", payback),
                "Short payback supports expanding usage",
                SHORT_PAYBACK_CONFIDENCE,
            ));
        }
    }
}

fn correlation_rules(correlations: &[CorrelationResult], out: &mut Vec<Recommendation>) {
    for result in correlations.iter().filter(|r| r.is_significant) {
        let confidence = result.coefficient.abs();
        match result.strength {
            CorrelationStrength::StrongPositive => out.push(Recommendation::new(
                RecommendationCategory::ProcessImprovement,
                Priority::Low,
                format!("Cost tracks {}", result.metric_name),
                format!(
                    "Strong positive correlation (r = {:.3}) between cost and {}",
                    result.coefficient, result.metric_name
                ),
                "Spend is associated with better outcomes",
                confidence,
            )),
            CorrelationStrength::StrongNegative => out.push(Recommendation::new(
                RecommendationCategory::CostOptimization,
                Priority::High,
                format!("Cost works against {}", result.metric_name),
                format!(
                    "Strong negative correlation (r = {:.3}) between cost and {}",
                    result.coefficient, result.metric_name
                ),
                "Extra spend coincides with worse outcomes",
                confidence,
            )),
            _ => {}
        }
    }
}

fn tradeoff_rules(signals: &RecommendationSignals<'_>, out: &mut Vec<Recommendation>) {
    if let Some(DiminishingReturns::Detected {
        threshold_cost,
        group_identifier,
        ..
    }) = signals.diminishing
    {
        out.push(Recommendation::new(
            RecommendationCategory::CostOptimization,
            Priority::Medium,
            "Diminishing quality returns",
            format!(
                "Spend beyond {:.6} per request ({}) yields little additional quality",
                threshold_cost, group_identifier
            ),
            "Cap spend near the threshold",
            DIMINISHING_CONFIDENCE,
        ));
    }

    if !signals.dominated.is_empty() && !signals.frontier.is_empty() {
        out.push(Recommendation::new(
            RecommendationCategory::ModelSelection,
            Priority::Low,
            "Prefer frontier options",
            format!(
                "{} option(s) are dominated; frontier: {}",
                signals.dominated.len(),
                signals.frontier.join(", ")
            ),
            "Same or better quality at lower cost or latency",
            FRONTIER_CONFIDENCE,
        ));
    }

    if !signals.constraint_violators.is_empty() {
        out.push(Recommendation::new(
            RecommendationCategory::ModelSelection,
            Priority::High,
            "Constraint violations",
            format!(
                "Violating configured constraints: {}",
                signals.constraint_violators.join(", ")
            ),
            "Move traffic to options that satisfy constraints",
            CONSTRAINT_CONFIDENCE,
        ));
    }
}

#[cfg(test)]
#[path = "recommend_tests.rs"]
mod tests;
