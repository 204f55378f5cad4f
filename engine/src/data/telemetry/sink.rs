//! Destinations for telemetry batches

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use super::event::TelemetryEvent;
use crate::data::error::TelemetryError;
use crate::utils::retry::{RetryPolicy, retry_with_backoff_async};

const TELEMETRY_PATH: &str = "/v1/telemetry";

#[async_trait]
pub trait TelemetrySink: Send + Sync + std::fmt::Debug {
    async fn send_batch(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError>;

    fn name(&self) -> &'static str;
}

/// Writes each event as a structured log line
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl TelemetrySink for LogSink {
    async fn send_batch(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        for event in batch {
            tracing::info!(
                target: "costlens::telemetry",
                kind = ?event.kind,
                agent_id = %event.agent_id,
                decision_type = ?event.decision_type,
                execution_ref = event.execution_ref.as_deref(),
                duration_ms = event.duration_ms,
                success = event.success,
                error = event.error.as_deref(),
                "telemetry"
            );
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Posts batches as `{"events": [...]}` to a collector
#[derive(Debug)]
pub struct HttpTelemetrySink {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl HttpTelemetrySink {
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, TelemetryError> {
        let endpoint = endpoint.trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(TelemetryError::Sink("telemetry endpoint is empty".into()));
        }

        let mut headers = HeaderMap::new();
        if let Some(api_key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .map_err(|e| TelemetryError::Sink(format!("invalid api key: {}", e)))?,
            );
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TelemetryError::Sink(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!("{}{}", endpoint, TELEMETRY_PATH),
            retry,
        })
    }

    async fn post_once(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "events": batch }))
            .send()
            .await
            .map_err(|e| TelemetryError::Sink(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(TelemetryError::Sink(format!(
                "POST {} returned {}",
                self.url,
                resp.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn send_batch(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        retry_with_backoff_async(&self.retry, |_| true, || self.post_once(batch))
            .await
            .map(|_| ())
            .map_err(|(e, _)| e)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
