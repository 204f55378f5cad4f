//! Core application

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio_util::task::TaskTracker;

use crate::core::cli::{self, Commands};
use crate::core::config::{AppConfig, LogFormat, StorageConfig, TelemetryConfig};
use crate::core::constants::{
    DEFAULT_LOG_FILTER, DEFAULT_TELEMETRY_TIMEOUT_SECS, ENV_LOG, ENV_STORAGE_ENDPOINT,
};
use crate::core::shutdown::ShutdownService;
use crate::data::error::{StorageError, TelemetryError};
use crate::data::storage::{HttpStorageAdapter, HttpStorageConfig, InMemoryStorage};
use crate::data::telemetry::{
    HttpTelemetrySink, LogSink, TelemetryContext, TelemetryEmitter, TelemetryEvent, TelemetrySink,
};
use crate::data::types::AnalysisRequest;
use crate::data::{DecisionEventQuery, StorageAdapter, TelemetryHandle};
use crate::domain::analysis::{AnalysisEngine, AnalysisResponse};
use crate::domain::decision::DecisionEvent;
use crate::domain::error::AnalysisError;
use crate::utils::retry::RetryPolicy;

// ============================================================================
// Analysis service
// ============================================================================

/// Runs analyses and hands each resulting decision event to storage exactly
/// once. Persistence and telemetry happen in the background; their failures
/// are logged and never change the caller's result.
#[derive(Debug, Clone)]
pub struct AnalysisService {
    engine: Arc<AnalysisEngine>,
    storage: Arc<dyn StorageAdapter>,
    telemetry: Option<TelemetryHandle>,
    tracker: TaskTracker,
}

impl AnalysisService {
    pub fn new(engine: AnalysisEngine, storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            engine: Arc::new(engine),
            storage,
            telemetry: None,
            tracker: TaskTracker::new(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryHandle) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Validate and run one request, then persist its decision event in the background
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let context = TelemetryContext {
            agent_id: self.engine.agent_id().to_string(),
            agent_version: self.engine.agent_version().to_string(),
            decision_type: Some(request.decision_type()),
            execution_ref: request.execution_ref().map(str::to_string),
        };
        self.emit(context.execution_started());

        let started = Instant::now();
        let result = self.engine.run(request);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(response) => {
                tracing::debug!(
                    decision_type = %request.decision_type(),
                    event_id = %response.decision_event.id,
                    confidence = response.decision_event.confidence,
                    elapsed_ms,
                    "Analysis completed"
                );
                self.emit(context.execution_completed(
                    elapsed_ms,
                    request.record_count(),
                    response.decision_event.confidence,
                ));
                self.persist(context, response.decision_event.clone());
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(
                    decision_type = %request.decision_type(),
                    error = %e,
                    "Analysis rejected"
                );
                self.emit(context.execution_failed(elapsed_ms, e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn query_events(
        &self,
        query: &DecisionEventQuery,
    ) -> Result<Vec<DecisionEvent>, StorageError> {
        self.storage.query(query).await
    }

    /// Wait for in-flight persistence tasks
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn persist(&self, context: TelemetryContext, event: DecisionEvent) {
        let storage = Arc::clone(&self.storage);
        let telemetry = self.telemetry.clone();

        self.tracker.spawn(async move {
            let follow_up = match storage.save(&event).await {
                Ok(receipt) => {
                    tracing::debug!(
                        event_id = %receipt.event_id,
                        attempts = receipt.attempts,
                        storage = storage.name(),
                        "Decision event persisted"
                    );
                    context.decision_persisted(receipt.event_id, receipt.attempts)
                }
                Err(e) => {
                    tracing::error!(
                        event_id = %event.id,
                        storage = storage.name(),
                        error = %e,
                        "Failed to persist decision event"
                    );
                    context.persistence_failed(event.id, e.to_string())
                }
            };
            if let Some(telemetry) = telemetry {
                emit_to(&telemetry, follow_up);
            }
        });
    }

    fn emit(&self, event: TelemetryEvent) {
        if let Some(telemetry) = &self.telemetry {
            emit_to(telemetry, event);
        }
    }
}

fn emit_to(telemetry: &TelemetryHandle, event: TelemetryEvent) {
    if let Err(TelemetryError::ChannelClosed) = telemetry.emit(event) {
        tracing::debug!("Telemetry emitter stopped, event discarded");
    }
}

// ============================================================================
// Application
// ============================================================================

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub service: AnalysisService,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        let (cli_config, command) = cli::parse();
        Self::init_logging(cli_config.log_format.unwrap_or_default());

        tracing::debug!("Application starting");
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;
        let app = Self::init(config).await?;

        let result = match command {
            Commands::Analyze { input, output } => app.analyze_file(&input, output.as_deref()).await,
            Commands::Events {
                limit,
                execution_ref,
            } => app.list_events(limit, execution_ref).await,
        };

        app.service.drain().await;
        app.shutdown.shutdown().await;
        result
    }

    async fn init(config: AppConfig) -> Result<Self> {
        let shutdown = ShutdownService::default();

        let storage = Self::init_storage(&config.storage).await?;
        tracing::debug!(backend = storage.name(), "Storage initialized");

        let engine = AnalysisEngine::new(
            config.policy.clone(),
            config.agent.agent_id.clone(),
            config.agent.agent_version.clone(),
        );
        let mut service = AnalysisService::new(engine, storage);

        if let Some(sink) = Self::init_telemetry_sink(&config.telemetry)? {
            tracing::debug!(sink = sink.name(), "Telemetry initialized");
            let emitter = TelemetryEmitter::new(
                sink,
                config.telemetry.batch_size,
                config.telemetry.flush_interval,
            );
            let (handle, task) = emitter.start(config.telemetry.buffer, shutdown.subscribe());
            shutdown.register(task).await;
            service = service.with_telemetry(handle);
        } else {
            tracing::debug!("Telemetry disabled by config");
        }

        Ok(Self {
            shutdown,
            config,
            service,
        })
    }

    async fn init_storage(config: &StorageConfig) -> Result<Arc<dyn StorageAdapter>> {
        let Some(endpoint) = &config.endpoint else {
            return Ok(Arc::new(InMemoryStorage::new()));
        };

        let adapter = HttpStorageAdapter::new(HttpStorageConfig {
            endpoint: endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            retry: config.retry,
        })
        .context("Failed to initialize storage adapter")?;

        if let Err(e) = adapter.health().await {
            tracing::warn!(endpoint = %endpoint, error = %e, "Storage health check failed");
        }
        Ok(Arc::new(adapter))
    }

    fn init_telemetry_sink(config: &TelemetryConfig) -> Result<Option<Arc<dyn TelemetrySink>>> {
        if !config.enabled {
            return Ok(None);
        }
        let sink: Arc<dyn TelemetrySink> = match &config.endpoint {
            Some(endpoint) => Arc::new(
                HttpTelemetrySink::new(
                    endpoint,
                    config.api_key.as_deref(),
                    Duration::from_secs(DEFAULT_TELEMETRY_TIMEOUT_SECS),
                    RetryPolicy::default(),
                )
                .context("Failed to initialize telemetry sink")?,
            ),
            None => Arc::new(LogSink),
        };
        Ok(Some(sink))
    }

    async fn analyze_file(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        let raw = if input.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        } else {
            std::fs::read_to_string(input)
                .with_context(|| format!("Failed to read request file: {}", input.display()))?
        };

        let request: AnalysisRequest =
            serde_json::from_str(&raw).context("Failed to parse analysis request")?;
        let response = self
            .service
            .analyze(&request)
            .await
            .context("Analysis request rejected")?;

        let rendered = serde_json::to_string_pretty(&response)?;
        match output {
            Some(path) => std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write response: {}", path.display()))?,
            None => println!("{}", rendered),
        }
        Ok(())
    }

    async fn list_events(&self, limit: usize, execution_ref: Option<String>) -> Result<()> {
        if self.config.storage.endpoint.is_none() {
            anyhow::bail!(
                "No storage endpoint configured; set --storage-endpoint or {} to query persisted events",
                ENV_STORAGE_ENDPOINT
            );
        }
        let mut query = DecisionEventQuery::new().limit(limit);
        if let Some(execution_ref) = execution_ref {
            query = query.execution_ref(execution_ref);
        }

        let events = self
            .service
            .query_events(&query)
            .await
            .context("Failed to query decision events")?;
        println!("{}", serde_json::to_string_pretty(&events)?);
        Ok(())
    }

    fn init_logging(format: LogFormat) {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        match format {
            LogFormat::Compact => tracing_subscriber::fmt()
                .with_target(false)
                .with_thread_ids(false)
                .with_level(true)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .compact()
                .with_env_filter(filter)
                .init(),
            LogFormat::Json => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_env_filter(filter)
                .init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cli::CliConfig;
    use crate::core::config::FileConfig;

    fn offline_config() -> AppConfig {
        let cli = CliConfig {
            telemetry: Some(false),
            ..CliConfig::default()
        };
        AppConfig::resolve(&cli, FileConfig::default())
    }

    #[tokio::test]
    async fn test_events_without_storage_endpoint_rejected() {
        let app = CoreApp::init(offline_config()).await.unwrap();
        let err = app.list_events(10, None).await.unwrap_err();
        assert!(err.to_string().contains("No storage endpoint configured"));
        app.shutdown.shutdown().await;
    }

    #[tokio::test]
    async fn test_init_without_endpoints_uses_in_memory_storage() {
        let app = CoreApp::init(offline_config()).await.unwrap();
        assert_eq!(app.service.storage().name(), "memory");
        app.shutdown.shutdown().await;
    }
}
