//! Analytics, decision events and flavor orchestration

pub mod analysis;
pub mod analytics;
pub mod decision;
pub mod error;
pub mod recommend;

pub use analysis::{AnalysisEngine, AnalysisPolicy, AnalysisReport, AnalysisResponse};
pub use decision::{DecisionEvent, DecisionType};
pub use error::AnalysisError;
pub use recommend::{Recommendation, RecommendationGenerator};
