//! Exact-decimal return on investment

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

use crate::domain::error::AnalysisError;

/// Fractional digits kept at the presentation boundary
pub const PRESENTATION_DP: u32 = 6;

/// A ratio that is either a finite decimal or unbounded (zero cost, positive gain)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiFigure {
    Finite(Decimal),
    Infinite,
}

impl RoiFigure {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// Whether the figure exceeds `bound`; infinite exceeds everything
    pub fn exceeds(&self, bound: Decimal) -> bool {
        match self {
            Self::Finite(value) => *value > bound,
            Self::Infinite => true,
        }
    }

    pub fn finite(&self) -> Option<Decimal> {
        match self {
            Self::Finite(value) => Some(*value),
            Self::Infinite => None,
        }
    }
}

impl Serialize for RoiFigure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(value) => Serialize::serialize(value, serializer),
            Self::Infinite => serializer.serialize_str("infinite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiMetric {
    pub roi_percentage: RoiFigure,
    pub roi_ratio: RoiFigure,
    pub net_value: Decimal,
    pub total_cost: Decimal,
    pub total_gain: Decimal,
    pub cost_per_outcome_unit: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_period_days: Option<Decimal>,
}

/// Round half away from zero to the presentation precision
pub fn present(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(PRESENTATION_DP, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Exact sum of decimal amounts
pub fn sum_exact<I>(values: I, field: &str) -> Result<Decimal, AnalysisError>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value)
            .ok_or_else(|| AnalysisError::overflow(field))
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoiCalculator;

impl RoiCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute ROI figures. Zero cost and zero gain take defined branches.
    pub fn calculate(
        &self,
        total_cost: Decimal,
        total_gain: Decimal,
        period_days: u32,
    ) -> Result<RoiMetric, AnalysisError> {
        if total_cost.is_sign_negative() && !total_cost.is_zero() {
            return Err(AnalysisError::validation("total_cost", "must not be negative"));
        }
        if total_gain.is_sign_negative() && !total_gain.is_zero() {
            return Err(AnalysisError::validation("total_gain", "must not be negative"));
        }

        let overflow = |op: &str| AnalysisError::overflow(op);
        let net_value = total_gain
            .checked_sub(total_cost)
            .ok_or_else(|| overflow("net_value"))?;

        if total_cost.is_zero() {
            let figure = if total_gain > Decimal::ZERO {
                RoiFigure::Infinite
            } else {
                RoiFigure::Finite(Decimal::ZERO)
            };
            return Ok(RoiMetric {
                roi_percentage: figure,
                roi_ratio: figure,
                net_value: present(net_value),
                total_cost: present(total_cost),
                total_gain: present(total_gain),
                cost_per_outcome_unit: Decimal::ZERO,
                payback_period_days: None,
            });
        }

        let roi_ratio = total_gain
            .checked_div(total_cost)
            .ok_or_else(|| overflow("roi_ratio"))?;
        let roi_percentage = net_value
            .checked_div(total_cost)
            .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| overflow("roi_percentage"))?;
        let cost_per_outcome_unit = if total_gain.is_zero() {
            Decimal::ZERO
        } else {
            total_cost
                .checked_div(total_gain)
                .ok_or_else(|| overflow("cost_per_outcome_unit"))?
        };
        // cost / (net / period) rearranged to a single division
        let payback_period_days = if net_value > Decimal::ZERO && period_days > 0 {
            Some(
                total_cost
                    .checked_mul(Decimal::from(period_days))
                    .and_then(|v| v.checked_div(net_value))
                    .map(present)
                    .ok_or_else(|| overflow("payback_period_days"))?,
            )
        } else {
            None
        };

        Ok(RoiMetric {
            roi_percentage: RoiFigure::Finite(present(roi_percentage)),
            roi_ratio: RoiFigure::Finite(present(roi_ratio)),
            net_value: present(net_value),
            total_cost: present(total_cost),
            total_gain: present(total_gain),
            cost_per_outcome_unit: present(cost_per_outcome_unit),
            payback_period_days,
        })
    }
}

/// `total_cost / units * 1000`, `None` when no units were metered
pub fn cost_per_1k_units(total_cost: Decimal, units: u64) -> Option<Decimal> {
    if units == 0 {
        return None;
    }
    total_cost
        .checked_mul(Decimal::ONE_THOUSAND)
        .and_then(|v| v.checked_div(Decimal::from(units)))
        .map(present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_roi_basic() {
        let metric = RoiCalculator::new().calculate(dec!(100), dec!(150), 30).unwrap();
        assert_eq!(metric.roi_percentage, RoiFigure::Finite(dec!(50)));
        assert_eq!(metric.roi_ratio, RoiFigure::Finite(dec!(1.5)));
        assert_eq!(metric.net_value, dec!(50));
        assert_eq!(metric.payback_period_days, Some(dec!(60)));
        assert_eq!(metric.cost_per_outcome_unit, dec!(0.666667));
    }

    #[test]
    fn test_zero_cost_positive_gain_is_infinite() {
        let metric = RoiCalculator::new().calculate(dec!(0), dec!(50), 30).unwrap();
        assert!(metric.roi_percentage.is_infinite());
        assert!(metric.roi_ratio.is_infinite());
        assert_eq!(metric.net_value, dec!(50));
        assert_eq!(metric.payback_period_days, None);
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["roi_percentage"], "infinite");
    }

    #[test]
    fn test_finite_figure_serializes_as_decimal() {
        let metric = RoiCalculator::new().calculate(dec!(100), dec!(150), 30).unwrap();
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["roi_percentage"], serde_json::to_value(dec!(50)).unwrap());
        assert_eq!(json["roi_ratio"], serde_json::to_value(dec!(1.5)).unwrap());
    }

    #[test]
    fn test_zero_cost_zero_gain_is_zero() {
        let metric = RoiCalculator::new().calculate(dec!(0), dec!(0), 30).unwrap();
        assert_eq!(metric.roi_percentage, RoiFigure::Finite(Decimal::ZERO));
        assert_eq!(metric.cost_per_outcome_unit, Decimal::ZERO);
    }

    #[test]
    fn test_zero_gain_loses_everything() {
        let metric = RoiCalculator::new().calculate(dec!(40), dec!(0), 30).unwrap();
        assert_eq!(metric.roi_percentage, RoiFigure::Finite(dec!(-100)));
        assert_eq!(metric.cost_per_outcome_unit, Decimal::ZERO);
        assert_eq!(metric.payback_period_days, None);
    }

    #[test]
    fn test_no_payback_without_period() {
        let metric = RoiCalculator::new().calculate(dec!(10), dec!(20), 0).unwrap();
        assert_eq!(metric.payback_period_days, None);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let calculator = RoiCalculator::new();
        assert!(calculator.calculate(dec!(-1), dec!(5), 30).unwrap_err().is_validation());
        assert!(calculator.calculate(dec!(1), dec!(-5), 30).unwrap_err().is_validation());
    }

    #[test]
    fn test_exact_sum_has_no_drift() {
        let total = sum_exact(std::iter::repeat_n(dec!(0.1), 1_000), "cost").unwrap();
        assert_eq!(total, dec!(100));
    }

    #[test]
    fn test_presentation_rounding() {
        assert_eq!(present(dec!(1.23456749)), dec!(1.234567));
        assert_eq!(present(dec!(1.2345675)), dec!(1.234568));
        assert_eq!(present(dec!(-1.2345675)), dec!(-1.234568));
    }

    #[test]
    fn test_cost_per_1k_units() {
        assert_eq!(cost_per_1k_units(dec!(2.5), 50_000), Some(dec!(0.05)));
        assert_eq!(cost_per_1k_units(dec!(2.5), 0), None);
    }

    #[test]
    fn test_figure_exceeds() {
        assert!(RoiFigure::Infinite.exceeds(dec!(200)));
        assert!(!RoiFigure::Finite(dec!(200)).exceeds(dec!(200)));
        assert_eq!(RoiFigure::Finite(dec!(3)).finite(), Some(dec!(3)));
        assert_eq!(RoiFigure::Infinite.finite(), None);
    }
}
