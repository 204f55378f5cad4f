//! Decision event persistence
//!
//! The analysis core hands each event to a `StorageAdapter` exactly once and
//! never waits on the outcome. Adapters own their retry behaviour.

mod http;
mod memory;

pub use http::{HttpStorageAdapter, HttpStorageConfig};
pub use memory::InMemoryStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::data::error::StorageError;
use crate::domain::decision::{DecisionEvent, DecisionType};

/// Default number of events returned by a query
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Acknowledgement of a stored event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageReceipt {
    pub event_id: Uuid,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

// ============================================================================
// Query filters
// ============================================================================

/// Filters for listing stored decision events. Unset filters match everything.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionEventQuery {
    pub agent_id: Option<String>,
    pub decision_type: Option<DecisionType>,
    pub execution_ref: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl Default for DecisionEventQuery {
    fn default() -> Self {
        Self {
            agent_id: None,
            decision_type: None,
            execution_ref: None,
            since: None,
            until: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl DecisionEventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn decision_type(mut self, decision_type: DecisionType) -> Self {
        self.decision_type = Some(decision_type);
        self
    }

    pub fn execution_ref(mut self, execution_ref: impl Into<String>) -> Self {
        self.execution_ref = Some(execution_ref.into());
        self
    }

    /// Inclusive lower bound on event timestamp
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Exclusive upper bound on event timestamp
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, event: &DecisionEvent) -> bool {
        self.agent_id.as_deref().is_none_or(|id| event.agent_id == id)
            && self.decision_type.is_none_or(|t| event.decision_type == t)
            && self
                .execution_ref
                .as_deref()
                .is_none_or(|r| event.execution_ref.as_deref() == Some(r))
            && self.since.is_none_or(|since| event.timestamp >= since)
            && self.until.is_none_or(|until| event.timestamp < until)
    }

    /// Filters as URL query parameters
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(agent_id) = &self.agent_id {
            pairs.push(("agent_id", agent_id.clone()));
        }
        if let Some(decision_type) = self.decision_type {
            pairs.push(("decision_type", decision_type.to_string()));
        }
        if let Some(execution_ref) = &self.execution_ref {
            pairs.push(("execution_ref", execution_ref.clone()));
        }
        if let Some(since) = self.since {
            pairs.push(("since", since.to_rfc3339()));
        }
        if let Some(until) = self.until {
            pairs.push(("until", until.to_rfc3339()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

// ============================================================================
// Adapter trait
// ============================================================================

#[async_trait]
pub trait StorageAdapter: Send + Sync + std::fmt::Debug {
    /// Persist one event
    async fn save(&self, event: &DecisionEvent) -> Result<StorageReceipt, StorageError>;

    /// Events matching the filters, newest first
    async fn query(&self, query: &DecisionEventQuery) -> Result<Vec<DecisionEvent>, StorageError>;

    /// Backend reachability
    async fn health(&self) -> Result<(), StorageError>;

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}
