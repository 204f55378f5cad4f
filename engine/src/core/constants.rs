// =============================================================================
// Application Identity
// =============================================================================

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".costlens";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "costlens.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "COSTLENS_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "COSTLENS_LOG";

/// Environment variable for log output format (`compact` or `json`)
pub const ENV_LOG_FORMAT: &str = "COSTLENS_LOG_FORMAT";

/// Filter used when neither COSTLENS_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info,costlens=info";

// =============================================================================
// Environment Variables - Agent
// =============================================================================

pub const ENV_AGENT_ID: &str = "COSTLENS_AGENT_ID";

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Decision event service base URL. Unset keeps events in memory.
pub const ENV_STORAGE_ENDPOINT: &str = "COSTLENS_STORAGE_ENDPOINT";

pub const ENV_STORAGE_API_KEY: &str = "COSTLENS_STORAGE_API_KEY";

// =============================================================================
// Environment Variables - Telemetry
// =============================================================================

pub const ENV_TELEMETRY_ENABLED: &str = "COSTLENS_TELEMETRY_ENABLED";

/// Telemetry collector base URL. Unset writes telemetry to the log.
pub const ENV_TELEMETRY_ENDPOINT: &str = "COSTLENS_TELEMETRY_ENDPOINT";

// =============================================================================
// Environment Variables - Policy
// =============================================================================

pub const ENV_SIGNIFICANCE_LEVEL: &str = "COSTLENS_SIGNIFICANCE_LEVEL";

// =============================================================================
// Storage Defaults
// =============================================================================

/// HTTP request timeout for the storage adapter
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Telemetry Defaults
// =============================================================================

/// Events per batch before an early flush
pub const DEFAULT_TELEMETRY_BATCH_SIZE: usize = 50;

/// Maximum time an event waits in a partial batch
pub const DEFAULT_TELEMETRY_FLUSH_INTERVAL_MS: u64 = 1_000;

/// Channel capacity between callers and the emitter task
pub const DEFAULT_TELEMETRY_BUFFER: usize = 1_024;

/// HTTP request timeout for the telemetry sink
pub const DEFAULT_TELEMETRY_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Shutdown
// =============================================================================

/// Upper bound on waiting for in-flight persistence and telemetry on exit
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 15;
