//! Storage adapter for a remote decision-event service over HTTP
//!
//! Routes: `POST {endpoint}/v1/decision-events`, `GET {endpoint}/v1/decision-events`,
//! `GET {endpoint}/health`. Writes and reads retry transient failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use super::{DecisionEventQuery, StorageAdapter, StorageReceipt};
use crate::data::error::StorageError;
use crate::domain::decision::DecisionEvent;
use crate::utils::retry::{RetryPolicy, retry_with_backoff_async};

const EVENTS_PATH: &str = "/v1/decision-events";
const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone)]
pub struct HttpStorageConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

#[derive(Debug)]
pub struct HttpStorageAdapter {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl HttpStorageAdapter {
    pub fn new(config: HttpStorageConfig) -> Result<Self, StorageError> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(StorageError::Config("storage endpoint is empty".into()));
        }

        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .map_err(|e| StorageError::Config(format!("invalid api key: {}", e)))?,
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("costlens/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            endpoint = %endpoint,
            timeout_secs = config.timeout.as_secs(),
            max_attempts = config.retry.max_attempts,
            "HTTP storage adapter initialized"
        );
        Ok(Self {
            client,
            endpoint,
            retry: config.retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn error_from(resp: reqwest::Response) -> StorageError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        StorageError::status(status, body)
    }

    async fn post_once(&self, event: &DecisionEvent) -> Result<(), StorageError> {
        let resp = self
            .client
            .post(self.url(EVENTS_PATH))
            .json(event)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        Ok(())
    }

    async fn get_once(&self, url: &reqwest::Url) -> Result<Vec<DecisionEvent>, StorageError> {
        let resp = self.client.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Collapse a retry failure: a single attempt keeps its original error
fn exhausted((error, attempts): (StorageError, u32)) -> StorageError {
    if attempts > 1 {
        StorageError::RetriesExhausted {
            attempts,
            last_error: error.to_string(),
        }
    } else {
        error
    }
}

#[async_trait]
impl StorageAdapter for HttpStorageAdapter {
    async fn save(&self, event: &DecisionEvent) -> Result<StorageReceipt, StorageError> {
        event
            .validate()
            .map_err(|e| StorageError::InvalidEvent(e.to_string()))?;

        let ((), attempts) =
            retry_with_backoff_async(&self.retry, StorageError::is_transient, || {
                self.post_once(event)
            })
            .await
            .map_err(exhausted)?;

        tracing::debug!(event_id = %event.id, attempts, "Decision event persisted");
        Ok(StorageReceipt {
            event_id: event.id,
            attempts,
        })
    }

    async fn query(&self, query: &DecisionEventQuery) -> Result<Vec<DecisionEvent>, StorageError> {
        let url = reqwest::Url::parse_with_params(&self.url(EVENTS_PATH), query.to_query_pairs())
            .map_err(|e| StorageError::Config(format!("invalid storage url: {}", e)))?;

        let (events, _) = retry_with_backoff_async(&self.retry, StorageError::is_transient, || {
            self.get_once(&url)
        })
        .await
        .map_err(exhausted)?;
        Ok(events)
    }

    async fn health(&self) -> Result<(), StorageError> {
        let resp = self.client.get(self.url(HEALTH_PATH)).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
