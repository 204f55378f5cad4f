//! Pure analytics building blocks
//!
//! Every function here is synchronous and works on an in-memory snapshot.
//! No component keeps state between invocations.

pub mod align;
pub mod correlation;
pub mod diminishing;
pub mod distribution;
pub mod pareto;
pub mod roi;
pub mod stats;
pub mod tradeoff;

pub use align::{AlignedPair, TimeSeriesAligner};
pub use correlation::{CorrelationAnalyzer, CorrelationResult, CorrelationStrength};
pub use diminishing::{CostQualityPoint, DiminishingReturns, DiminishingReturnsDetector};
pub use pareto::{ParetoPoint, pareto_frontier};
pub use roi::{RoiCalculator, RoiFigure, RoiMetric};
pub use tradeoff::{AggregatedGroup, ScoredGroup, ScoringPolicy, TradeoffScore, TradeoffScorer};
