//! Decision event record

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::builder::MAX_CONFIDENCE;
use crate::domain::error::AnalysisError;
use crate::utils::crypto::sha256_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    TradeoffAnalysis,
    CorrelationAnalysis,
    RoiAnalysis,
}

impl DecisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TradeoffAnalysis => "tradeoff_analysis",
            Self::CorrelationAnalysis => "correlation_analysis",
            Self::RoiAnalysis => "roi_analysis",
        }
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic version of the emitting agent
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentVersion(semver::Version);

impl AgentVersion {
    pub fn parse(input: &str) -> Result<Self, AnalysisError> {
        semver::Version::parse(input).map(Self).map_err(|e| {
            AnalysisError::validation(
                "agent_version",
                format!("'{}' is not a semantic version: {}", input, e),
            )
        })
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    /// Same major version means compatible
    pub fn is_compatible_with(&self, other: &AgentVersion) -> bool {
        self.0.major == other.0.major
    }
}

impl fmt::Display for AgentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One immutable record per analysis invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub id: Uuid,
    pub agent_id: String,
    pub agent_version: String,
    pub decision_type: DecisionType,
    /// SHA-256 hex of the canonicalized inputs
    pub inputs_hash: String,
    /// Summary of the analysis output
    pub outputs: serde_json::Value,
    /// In [0, 0.95]
    pub confidence: f64,
    pub constraints_applied: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DecisionEvent {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.agent_id.trim().is_empty() {
            return Err(AnalysisError::validation("agent_id", "must not be empty"));
        }
        AgentVersion::parse(&self.agent_version)?;
        if self.inputs_hash.len() != 64 || !self.inputs_hash.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(AnalysisError::validation(
                "inputs_hash",
                "must be a 64-character hex digest",
            ));
        }
        if !(0.0..=MAX_CONFIDENCE).contains(&self.confidence) {
            return Err(AnalysisError::validation(
                "confidence",
                format!("must be within [0, {}]", MAX_CONFIDENCE),
            ));
        }
        Ok(())
    }

    /// Digest of this event's output summary
    pub fn outputs_hash(&self) -> String {
        outputs_hash(&self.outputs)
    }
}

/// SHA-256 hex of a serialized output summary
pub fn outputs_hash(outputs: &serde_json::Value) -> String {
    sha256_hex(&outputs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_version_parse() {
        let version = AgentVersion::parse("1.4.2").unwrap();
        assert_eq!(version.major(), 1);
        assert_eq!(version.to_string(), "1.4.2");
        assert_eq!(AgentVersion::parse("2.0.0-beta.1").unwrap().major(), 2);
        assert_eq!(
            AgentVersion::parse("2.0.0-beta.1+build.7").unwrap().to_string(),
            "2.0.0-beta.1+build.7"
        );
        assert!(AgentVersion::parse("1.4").is_err());
        assert!(AgentVersion::parse("1.x.0").is_err());
    }

    #[test]
    fn test_agent_version_rejects_malformed_input() {
        for input in ["01.02.03", "1.2.3-", "1.2.3+", " 1.2.3 ", ""] {
            let err = AgentVersion::parse(input).unwrap_err();
            assert!(err.is_validation(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_agent_version_compatibility() {
        let a = AgentVersion::parse("1.0.0").unwrap();
        let b = AgentVersion::parse("1.9.3").unwrap();
        let c = AgentVersion::parse("2.0.0").unwrap();
        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
    }

    #[test]
    fn test_decision_type_serde() {
        let json = serde_json::to_value(DecisionType::RoiAnalysis).unwrap();
        assert_eq!(json, "roi_analysis");
        assert_eq!(DecisionType::TradeoffAnalysis.to_string(), "tradeoff_analysis");
    }

    #[test]
    fn test_outputs_hash_is_stable() {
        let outputs = serde_json::json!({ "groups": 2, "best": "a" });
        assert_eq!(outputs_hash(&outputs), outputs_hash(&outputs.clone()));
        assert_eq!(outputs_hash(&outputs).len(), 64);
    }
}
