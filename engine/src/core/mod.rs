//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;

pub use crate::app::{AnalysisService, CoreApp};
pub use cli::{CliConfig, Commands};
pub use config::{AgentConfig, AppConfig, LogFormat, StorageConfig, TelemetryConfig};
pub use shutdown::ShutdownService;
