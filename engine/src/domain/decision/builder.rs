//! Canonical input hashing and bounded confidence

use chrono::Utc;
use uuid::Uuid;

use super::event::{DecisionEvent, DecisionType};
use crate::utils::crypto::sha256_hex;

/// Upper bound on reported confidence
pub const MAX_CONFIDENCE: f64 = 0.95;

const BASE_CONFIDENCE: f64 = 0.5;
const VOLUME_WEIGHT: f64 = 0.25;
const COVERAGE_WEIGHT: f64 = 0.1;
const COVERAGE_THRESHOLD: f64 = 0.5;
const DIVERSITY_STEP: f64 = 0.05;
const FRONTIER_BONUS: f64 = 0.05;

/// Data-support signals feeding the confidence heuristic
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfidenceFactors {
    pub record_count: usize,
    /// Fraction in [0, 1] of inputs carrying outcome/quality data
    pub quality_coverage: f64,
    pub model_count: usize,
    pub provider_count: usize,
    pub frontier_size: usize,
}

/// Builds an order-independent canonical string of the inputs.
///
/// Identifiers and constraints are sorted and the whole is serialized as
/// JSON, so separators inside identifiers stay escaped. Execution
/// references and timestamps never enter the hash.
#[derive(Debug, Clone, Default)]
pub struct InputsCanonicalizer {
    identifiers: Vec<String>,
    params: serde_json::Value,
    constraints: Vec<String>,
}

impl InputsCanonicalizer {
    pub fn new(params: serde_json::Value) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifiers.extend(identifiers.into_iter().map(Into::into));
        self
    }

    pub fn constraints(mut self, constraints: &[String]) -> Self {
        self.constraints.extend_from_slice(constraints);
        self
    }

    pub fn constraints_applied(&self) -> &[String] {
        &self.constraints
    }

    pub fn canonical_string(&self) -> String {
        let mut identifiers: Vec<&str> = self.identifiers.iter().map(String::as_str).collect();
        identifiers.sort_unstable();
        let mut constraints: Vec<&str> = self.constraints.iter().map(String::as_str).collect();
        constraints.sort_unstable();
        serde_json::json!({
            "records": identifiers,
            "params": self.params,
            "constraints": constraints,
        })
        .to_string()
    }

    pub fn hash(&self) -> String {
        sha256_hex(&self.canonical_string())
    }
}

#[derive(Debug, Clone)]
pub struct DecisionEventBuilder {
    agent_id: String,
    agent_version: String,
    saturation_records: usize,
}

impl DecisionEventBuilder {
    pub fn new(
        agent_id: impl Into<String>,
        agent_version: impl Into<String>,
        saturation_records: usize,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_version: agent_version.into(),
            saturation_records: saturation_records.max(1),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn agent_version(&self) -> &str {
        &self.agent_version
    }

    /// Base 0.5, plus volume (up to 0.25), coverage above half (up to 0.1),
    /// model and provider diversity (0.05 each), non-empty frontier (0.05).
    /// Clamped to [0, 0.95].
    pub fn confidence(&self, factors: &ConfidenceFactors) -> f64 {
        let volume = (factors.record_count as f64 / self.saturation_records as f64).min(1.0);
        let coverage = if factors.quality_coverage.is_finite() {
            factors.quality_coverage.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut confidence = BASE_CONFIDENCE + volume * VOLUME_WEIGHT;
        if coverage > COVERAGE_THRESHOLD {
            confidence += coverage * COVERAGE_WEIGHT;
        }
        if factors.model_count > 1 {
            confidence += DIVERSITY_STEP;
        }
        if factors.provider_count > 1 {
            confidence += DIVERSITY_STEP;
        }
        if factors.frontier_size > 0 {
            confidence += FRONTIER_BONUS;
        }
        confidence.clamp(0.0, MAX_CONFIDENCE)
    }

    /// Assemble the single event for one invocation
    pub fn build(
        &self,
        decision_type: DecisionType,
        inputs: &InputsCanonicalizer,
        outputs: serde_json::Value,
        factors: &ConfidenceFactors,
        execution_ref: Option<String>,
    ) -> DecisionEvent {
        DecisionEvent {
            id: Uuid::new_v4(),
            agent_id: self.agent_id.clone(),
            agent_version: self.agent_version.clone(),
            decision_type,
            inputs_hash: inputs.hash(),
            outputs,
            confidence: self.confidence(factors),
            constraints_applied: inputs.constraints_applied().to_vec(),
            execution_ref,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> DecisionEventBuilder {
        DecisionEventBuilder::new("costlens-tradeoff-agent", "0.1.0", 100)
    }

    #[test]
    fn test_hash_ignores_identifier_order() {
        let params = serde_json::json!({ "scope": "model" });
        let a = InputsCanonicalizer::new(params.clone()).identifiers(["r3", "r1", "r2"]);
        let b = InputsCanonicalizer::new(params).identifiers(["r1", "r2", "r3"]);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(
            a.canonical_string(),
            r#"{"records":["r1","r2","r3"],"params":{"scope":"model"},"constraints":[]}"#
        );
    }

    #[test]
    fn test_hash_separates_identifier_boundaries() {
        let params = serde_json::json!({ "scope": "model" });
        let joined = InputsCanonicalizer::new(params.clone()).identifiers(["a,b"]);
        let split = InputsCanonicalizer::new(params).identifiers(["a", "b"]);
        assert_ne!(joined.hash(), split.hash());

        let quoted = InputsCanonicalizer::new(serde_json::Value::Null)
            .constraints(&["x=1\",\"y=2".to_string()]);
        let pair = InputsCanonicalizer::new(serde_json::Value::Null)
            .constraints(&["x=1".to_string(), "y=2".to_string()]);
        assert_ne!(quoted.hash(), pair.hash());
    }

    #[test]
    fn test_hash_sensitive_to_params_and_constraints() {
        let base = InputsCanonicalizer::new(serde_json::json!({ "scope": "model" })).identifiers(["r1"]);
        let other_scope =
            InputsCanonicalizer::new(serde_json::json!({ "scope": "provider" })).identifiers(["r1"]);
        let constrained = base.clone().constraints(&["min_quality=0.8".to_string()]);
        assert_ne!(base.hash(), other_scope.hash());
        assert_ne!(base.hash(), constrained.hash());
    }

    #[test]
    fn test_confidence_minimal_input() {
        let confidence = builder().confidence(&ConfidenceFactors {
            record_count: 1,
            ..Default::default()
        });
        assert!((confidence - 0.5025).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_capped() {
        let confidence = builder().confidence(&ConfidenceFactors {
            record_count: 10_000,
            quality_coverage: 1.0,
            model_count: 5,
            provider_count: 3,
            frontier_size: 2,
        });
        assert_eq!(confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn test_confidence_always_bounded() {
        let b = builder();
        for records in [0, 1, 50, 100, 1_000] {
            for coverage in [0.0, 0.4, 0.51, 1.0, f64::NAN, 7.0] {
                for frontier in [0, 1] {
                    let c = b.confidence(&ConfidenceFactors {
                        record_count: records,
                        quality_coverage: coverage,
                        model_count: 2,
                        provider_count: 1,
                        frontier_size: frontier,
                    });
                    assert!((0.0..=MAX_CONFIDENCE).contains(&c));
                }
            }
        }
    }

    #[test]
    fn test_low_coverage_adds_nothing() {
        let b = builder();
        let without = b.confidence(&ConfidenceFactors::default());
        let half = b.confidence(&ConfidenceFactors {
            quality_coverage: 0.5,
            ..Default::default()
        });
        assert_eq!(without, half);
    }

    #[test]
    fn test_build_produces_valid_event() {
        let inputs = InputsCanonicalizer::new(serde_json::json!({}))
            .identifiers(["a"])
            .constraints(&["max_latency_p95_ms=500".to_string()]);
        let event = builder().build(
            DecisionType::TradeoffAnalysis,
            &inputs,
            serde_json::json!({ "groups": 1 }),
            &ConfidenceFactors::default(),
            Some("exec-1".into()),
        );
        assert!(event.validate().is_ok());
        assert_eq!(event.constraints_applied, vec!["max_latency_p95_ms=500"]);
        assert_eq!(event.execution_ref.as_deref(), Some("exec-1"));
        assert_eq!(event.inputs_hash, inputs.hash());
    }
}
