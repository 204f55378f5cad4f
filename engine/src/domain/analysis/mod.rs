//! Flavor orchestration
//!
//! `AnalysisEngine::run` validates a request once, dispatches to the flavor,
//! and returns the report together with exactly one `DecisionEvent`.
//! Nothing here performs I/O.

mod correlation;
mod policy;
mod roi;
mod tradeoff;

pub use correlation::{CorrelationReport, CorrelationSummary};
pub use policy::AnalysisPolicy;
pub use roi::{RoiReport, RoiSummary};
pub use tradeoff::{TradeoffReport, TradeoffSummary, constraint_violations, describe_constraints};

use serde::Serialize;

use crate::data::types::AnalysisRequest;
use crate::domain::decision::{DecisionEvent, DecisionEventBuilder};
use crate::domain::error::AnalysisError;

/// Default agent identity stamped on decision events
pub const DEFAULT_AGENT_ID: &str = "costlens-tradeoff-agent";

/// Flavor-specific report, tagged like the request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum AnalysisReport {
    Tradeoff(TradeoffReport),
    Correlation(CorrelationReport),
    Roi(RoiReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub decision_event: DecisionEvent,
}

#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    policy: AnalysisPolicy,
    builder: DecisionEventBuilder,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(
            AnalysisPolicy::default(),
            DEFAULT_AGENT_ID,
            env!("CARGO_PKG_VERSION"),
        )
    }
}

impl AnalysisEngine {
    pub fn new(
        policy: AnalysisPolicy,
        agent_id: impl Into<String>,
        agent_version: impl Into<String>,
    ) -> Self {
        let builder = DecisionEventBuilder::new(
            agent_id,
            agent_version,
            policy.confidence_saturation_records,
        );
        Self { policy, builder }
    }

    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    pub fn agent_id(&self) -> &str {
        self.builder.agent_id()
    }

    pub fn agent_version(&self) -> &str {
        self.builder.agent_version()
    }

    /// Validate and run one request. Rejected requests produce no partial result.
    pub fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
        request.check()?;

        let (report, decision_event) = match request {
            AnalysisRequest::Tradeoff(r) => {
                let (report, event) = self.run_tradeoff(r)?;
                (AnalysisReport::Tradeoff(report), event)
            }
            AnalysisRequest::Correlation(r) => {
                let (report, event) = self.run_correlation(r)?;
                (AnalysisReport::Correlation(report), event)
            }
            AnalysisRequest::Roi(r) => {
                let (report, event) = self.run_roi(r)?;
                (AnalysisReport::Roi(report), event)
            }
        };

        Ok(AnalysisResponse {
            report,
            decision_event,
        })
    }
}
