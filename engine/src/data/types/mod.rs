//! Typed input contract shared by every analysis flavor
//!
//! Payloads arrive already parsed into these types. Validation runs once at
//! the boundary (`AnalysisRequest::check`) and the core never re-checks.

mod enums;
mod records;
mod request;
mod series;

pub use enums::{CorrelationMethod, MetricType, Scope};
pub use records::{
    CostBreakdown, CostRecord, GainRecord, LatencyBreakdown, PerformanceRecord, QualityMetrics,
};
pub use request::{
    AnalysisRequest, AnalysisToggles, Constraints, CorrelationRequest, RoiRequest,
    TradeoffRequest, Weights,
};
pub use series::{OutcomeMetric, Sample};

use std::borrow::{Borrow, Cow};

use rust_decimal::Decimal;
use validator::ValidationError;

/// Reject negative decimal amounts
pub(crate) fn validate_non_negative_decimal<T: Borrow<Decimal>>(
    value: T,
) -> Result<(), ValidationError> {
    let value = value.borrow();
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative")
            .with_message(Cow::from("must be greater than or equal to 0")));
    }
    Ok(())
}

/// Reject NaN and infinities
pub(crate) fn validate_finite<T: Borrow<f64>>(value: T) -> Result<(), ValidationError> {
    if !value.borrow().is_finite() {
        return Err(ValidationError::new("finite").with_message(Cow::from("must be finite")));
    }
    Ok(())
}
