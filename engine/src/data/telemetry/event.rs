//! Telemetry event taxonomy

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::decision::DecisionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryEventKind {
    ExecutionStarted,
    ExecutionCompleted,
    ExecutionFailed,
    DecisionPersisted,
    PersistenceFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub id: Uuid,
    pub kind: TelemetryEventKind,
    pub agent_id: String,
    pub agent_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_type: Option<DecisionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_event_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

/// Identity shared by every event of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryContext {
    pub agent_id: String,
    pub agent_version: String,
    pub decision_type: Option<DecisionType>,
    pub execution_ref: Option<String>,
}

impl TelemetryContext {
    fn event(&self, kind: TelemetryEventKind) -> TelemetryEvent {
        TelemetryEvent {
            id: Uuid::new_v4(),
            kind,
            agent_id: self.agent_id.clone(),
            agent_version: self.agent_version.clone(),
            decision_type: self.decision_type,
            execution_ref: self.execution_ref.clone(),
            decision_event_id: None,
            timestamp: Utc::now(),
            duration_ms: None,
            success: None,
            error: None,
            metrics: BTreeMap::new(),
        }
    }

    pub fn execution_started(&self) -> TelemetryEvent {
        self.event(TelemetryEventKind::ExecutionStarted)
    }

    pub fn execution_completed(
        &self,
        duration_ms: u64,
        records_processed: usize,
        confidence: f64,
    ) -> TelemetryEvent {
        let mut event = self.event(TelemetryEventKind::ExecutionCompleted);
        event.duration_ms = Some(duration_ms);
        event.success = Some(true);
        event
            .metrics
            .insert("records_processed".into(), records_processed as f64);
        event.metrics.insert("confidence".into(), confidence);
        event
    }

    pub fn execution_failed(&self, duration_ms: u64, error: impl Into<String>) -> TelemetryEvent {
        let mut event = self.event(TelemetryEventKind::ExecutionFailed);
        event.duration_ms = Some(duration_ms);
        event.success = Some(false);
        event.error = Some(error.into());
        event
    }

    pub fn decision_persisted(&self, decision_event_id: Uuid, attempts: u32) -> TelemetryEvent {
        let mut event = self.event(TelemetryEventKind::DecisionPersisted);
        event.decision_event_id = Some(decision_event_id);
        event.success = Some(true);
        event.metrics.insert("attempts".into(), f64::from(attempts));
        event
    }

    pub fn persistence_failed(
        &self,
        decision_event_id: Uuid,
        error: impl Into<String>,
    ) -> TelemetryEvent {
        let mut event = self.event(TelemetryEventKind::PersistenceFailed);
        event.decision_event_id = Some(decision_event_id);
        event.success = Some(false);
        event.error = Some(error.into());
        event
    }
}
