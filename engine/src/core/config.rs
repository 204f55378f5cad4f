use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::analysis::{AnalysisPolicy, DEFAULT_AGENT_ID};
use crate::domain::decision::AgentVersion;
use crate::utils::file::expand_path;
use crate::utils::retry::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, RetryPolicy,
};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_STORAGE_TIMEOUT_SECS, DEFAULT_TELEMETRY_BATCH_SIZE,
    DEFAULT_TELEMETRY_BUFFER, DEFAULT_TELEMETRY_FLUSH_INTERVAL_MS,
};

// =============================================================================
// Log Format Enum
// =============================================================================

/// Log line formatting. Chosen on the command line or environment because
/// logging starts before config files are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

// =============================================================================
// File Config (JSON)
// =============================================================================

/// Heuristic policy section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PolicyFileConfig {
    pub significance_level: Option<f64>,
    pub normalize: Option<bool>,
    pub cost_ceiling_per_request: Option<f64>,
    pub latency_ceiling_ms: Option<f64>,
    pub diminishing_ratio: Option<f64>,
    pub diminishing_min_groups: Option<usize>,
    pub cost_per_1k_threshold: Option<Decimal>,
    pub confidence_saturation_records: Option<usize>,
}

/// Decision event storage section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StorageFileConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

/// Telemetry section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TelemetryFileConfig {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub batch_size: Option<usize>,
    pub flush_interval_ms: Option<u64>,
    pub buffer: Option<usize>,
}

/// Agent identity section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AgentFileConfig {
    pub agent_id: Option<String>,
    pub agent_version: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub policy: Option<PolicyFileConfig>,
    pub storage: Option<StorageFileConfig>,
    pub telemetry: Option<TelemetryFileConfig>,
    pub agent: Option<AgentFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overwrite `current` with `incoming` when the incoming value is set
fn merge_field<T: fmt::Debug>(current: &mut Option<T>, incoming: Option<T>, key: &'static str) {
    if incoming.is_some() {
        tracing::trace!(key, value = ?incoming, "Merging config value");
        *current = incoming;
    }
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Keys that matched no known section
    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(|k| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let keys = self.unknown_fields();
        if !keys.is_empty() {
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(policy) = other.policy {
            let current = self.policy.get_or_insert_with(PolicyFileConfig::default);
            merge_field(
                &mut current.significance_level,
                policy.significance_level,
                "policy.significance_level",
            );
            merge_field(&mut current.normalize, policy.normalize, "policy.normalize");
            merge_field(
                &mut current.cost_ceiling_per_request,
                policy.cost_ceiling_per_request,
                "policy.cost_ceiling_per_request",
            );
            merge_field(
                &mut current.latency_ceiling_ms,
                policy.latency_ceiling_ms,
                "policy.latency_ceiling_ms",
            );
            merge_field(
                &mut current.diminishing_ratio,
                policy.diminishing_ratio,
                "policy.diminishing_ratio",
            );
            merge_field(
                &mut current.diminishing_min_groups,
                policy.diminishing_min_groups,
                "policy.diminishing_min_groups",
            );
            merge_field(
                &mut current.cost_per_1k_threshold,
                policy.cost_per_1k_threshold,
                "policy.cost_per_1k_threshold",
            );
            merge_field(
                &mut current.confidence_saturation_records,
                policy.confidence_saturation_records,
                "policy.confidence_saturation_records",
            );
        }

        if let Some(storage) = other.storage {
            let current = self.storage.get_or_insert_with(StorageFileConfig::default);
            merge_field(&mut current.endpoint, storage.endpoint, "storage.endpoint");
            merge_field(&mut current.api_key, storage.api_key, "storage.api_key");
            merge_field(
                &mut current.timeout_secs,
                storage.timeout_secs,
                "storage.timeout_secs",
            );
            merge_field(
                &mut current.max_attempts,
                storage.max_attempts,
                "storage.max_attempts",
            );
            merge_field(
                &mut current.base_delay_ms,
                storage.base_delay_ms,
                "storage.base_delay_ms",
            );
            merge_field(
                &mut current.max_delay_ms,
                storage.max_delay_ms,
                "storage.max_delay_ms",
            );
        }

        if let Some(telemetry) = other.telemetry {
            let current = self
                .telemetry
                .get_or_insert_with(TelemetryFileConfig::default);
            merge_field(&mut current.enabled, telemetry.enabled, "telemetry.enabled");
            merge_field(
                &mut current.endpoint,
                telemetry.endpoint,
                "telemetry.endpoint",
            );
            merge_field(&mut current.api_key, telemetry.api_key, "telemetry.api_key");
            merge_field(
                &mut current.batch_size,
                telemetry.batch_size,
                "telemetry.batch_size",
            );
            merge_field(
                &mut current.flush_interval_ms,
                telemetry.flush_interval_ms,
                "telemetry.flush_interval_ms",
            );
            merge_field(&mut current.buffer, telemetry.buffer, "telemetry.buffer");
        }

        if let Some(agent) = other.agent {
            let current = self.agent.get_or_insert_with(AgentFileConfig::default);
            merge_field(&mut current.agent_id, agent.agent_id, "agent.agent_id");
            merge_field(
                &mut current.agent_version,
                agent.agent_version,
                "agent.agent_version",
            );
        }
    }
}

// =============================================================================
// Final Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Remote decision event service; `None` keeps events in memory
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// Collector base URL; `None` writes telemetry to the log
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub buffer: usize,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub agent_id: String,
    pub agent_version: String,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub policy: AnalysisPolicy,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub agent: AgentConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.costlens/costlens.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layered(cli, get_profile_config_path().as_deref())
    }

    fn load_layered(cli: &CliConfig, profile_path: Option<&Path>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(cli, file_config);
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, file values and CLI/env overrides
    pub(crate) fn resolve(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_policy = file_config.policy.unwrap_or_default();
        let file_storage = file_config.storage.unwrap_or_default();
        let file_telemetry = file_config.telemetry.unwrap_or_default();
        let file_agent = file_config.agent.unwrap_or_default();

        let defaults = AnalysisPolicy::default();
        let policy = AnalysisPolicy {
            significance_level: cli
                .significance_level
                .or(file_policy.significance_level)
                .unwrap_or(defaults.significance_level),
            normalize: file_policy.normalize.unwrap_or(defaults.normalize),
            cost_ceiling_per_request: file_policy
                .cost_ceiling_per_request
                .unwrap_or(defaults.cost_ceiling_per_request),
            latency_ceiling_ms: file_policy
                .latency_ceiling_ms
                .unwrap_or(defaults.latency_ceiling_ms),
            diminishing_ratio: file_policy
                .diminishing_ratio
                .unwrap_or(defaults.diminishing_ratio),
            diminishing_min_groups: file_policy
                .diminishing_min_groups
                .unwrap_or(defaults.diminishing_min_groups),
            cost_per_1k_threshold: file_policy
                .cost_per_1k_threshold
                .unwrap_or(defaults.cost_per_1k_threshold),
            confidence_saturation_records: file_policy
                .confidence_saturation_records
                .unwrap_or(defaults.confidence_saturation_records),
        };

        // Blank endpoints count as unset so an env var can switch a file endpoint off
        let storage = StorageConfig {
            endpoint: non_blank(cli.storage_endpoint.clone().or(file_storage.endpoint)),
            api_key: non_blank(cli.storage_api_key.clone().or(file_storage.api_key)),
            timeout: Duration::from_secs(
                file_storage
                    .timeout_secs
                    .unwrap_or(DEFAULT_STORAGE_TIMEOUT_SECS),
            ),
            retry: RetryPolicy {
                max_attempts: file_storage.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
                base_delay_ms: file_storage.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS),
                max_delay_ms: file_storage.max_delay_ms.unwrap_or(DEFAULT_MAX_DELAY_MS),
                jitter: true,
            },
        };

        let telemetry = TelemetryConfig {
            enabled: cli.telemetry.or(file_telemetry.enabled).unwrap_or(true),
            endpoint: non_blank(cli.telemetry_endpoint.clone().or(file_telemetry.endpoint)),
            api_key: non_blank(file_telemetry.api_key),
            batch_size: file_telemetry
                .batch_size
                .unwrap_or(DEFAULT_TELEMETRY_BATCH_SIZE),
            flush_interval: Duration::from_millis(
                file_telemetry
                    .flush_interval_ms
                    .unwrap_or(DEFAULT_TELEMETRY_FLUSH_INTERVAL_MS),
            ),
            buffer: file_telemetry.buffer.unwrap_or(DEFAULT_TELEMETRY_BUFFER),
        };

        let agent = AgentConfig {
            agent_id: cli
                .agent_id
                .clone()
                .or(file_agent.agent_id)
                .unwrap_or_else(|| DEFAULT_AGENT_ID.to_string()),
            agent_version: file_agent
                .agent_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        };

        Self {
            policy,
            storage,
            telemetry,
            agent,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        let policy = &self.policy;
        if !(policy.significance_level > 0.0 && policy.significance_level < 1.0) {
            anyhow::bail!(
                "Configuration error: policy.significance_level must be in (0, 1), got {}",
                policy.significance_level
            );
        }
        if !(policy.diminishing_ratio > 0.0 && policy.diminishing_ratio < 1.0) {
            anyhow::bail!(
                "Configuration error: policy.diminishing_ratio must be in (0, 1), got {}",
                policy.diminishing_ratio
            );
        }
        if policy.diminishing_min_groups < 3 {
            anyhow::bail!("Configuration error: policy.diminishing_min_groups must be at least 3");
        }
        if !(policy.cost_ceiling_per_request.is_finite() && policy.cost_ceiling_per_request > 0.0)
        {
            anyhow::bail!("Configuration error: policy.cost_ceiling_per_request must be positive");
        }
        if !(policy.latency_ceiling_ms.is_finite() && policy.latency_ceiling_ms > 0.0) {
            anyhow::bail!("Configuration error: policy.latency_ceiling_ms must be positive");
        }
        if policy.cost_per_1k_threshold.is_sign_negative() {
            anyhow::bail!("Configuration error: policy.cost_per_1k_threshold must not be negative");
        }
        if policy.confidence_saturation_records == 0 {
            anyhow::bail!(
                "Configuration error: policy.confidence_saturation_records must be greater than 0"
            );
        }

        if self.storage.retry.max_attempts == 0 {
            anyhow::bail!("Configuration error: storage.max_attempts must be greater than 0");
        }
        if self.storage.retry.base_delay_ms > self.storage.retry.max_delay_ms {
            anyhow::bail!(
                "Configuration error: storage.base_delay_ms ({}) exceeds storage.max_delay_ms ({})",
                self.storage.retry.base_delay_ms,
                self.storage.retry.max_delay_ms
            );
        }

        if self.telemetry.batch_size == 0 {
            anyhow::bail!("Configuration error: telemetry.batch_size must be greater than 0");
        }
        if self.telemetry.buffer == 0 {
            anyhow::bail!("Configuration error: telemetry.buffer must be greater than 0");
        }

        if self.agent.agent_id.trim().is_empty() {
            anyhow::bail!("Configuration error: agent.agent_id must not be empty");
        }
        AgentVersion::parse(&self.agent.agent_version).with_context(|| {
            format!(
                "Configuration error: agent.agent_version '{}' is not a semantic version",
                self.agent.agent_version
            )
        })?;

        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Get the profile config path (~/.costlens/costlens.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
