//! Process-local storage used when no endpoint is configured

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DecisionEventQuery, StorageAdapter, StorageReceipt};
use crate::data::error::StorageError;
use crate::domain::decision::DecisionEvent;

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    events: Mutex<Vec<DecisionEvent>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Snapshot in insertion order
    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl StorageAdapter for InMemoryStorage {
    async fn save(&self, event: &DecisionEvent) -> Result<StorageReceipt, StorageError> {
        event
            .validate()
            .map_err(|e| StorageError::InvalidEvent(e.to_string()))?;
        self.events.lock().push(event.clone());
        tracing::debug!(event_id = %event.id, "Decision event stored in memory");
        Ok(StorageReceipt {
            event_id: event.id,
            attempts: 1,
        })
    }

    async fn query(&self, query: &DecisionEventQuery) -> Result<Vec<DecisionEvent>, StorageError> {
        let mut matched: Vec<DecisionEvent> = self
            .events
            .lock()
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched.truncate(query.limit);
        Ok(matched)
    }

    async fn health(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
