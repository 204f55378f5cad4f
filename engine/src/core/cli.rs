use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::LogFormat;
use super::constants::{
    ENV_AGENT_ID, ENV_CONFIG, ENV_LOG_FORMAT, ENV_SIGNIFICANCE_LEVEL, ENV_STORAGE_API_KEY,
    ENV_STORAGE_ENDPOINT, ENV_TELEMETRY_ENABLED, ENV_TELEMETRY_ENDPOINT,
};

#[derive(Parser)]
#[command(name = "costlens")]
#[command(version, about = "Cost-performance tradeoff analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Log output format (compact or json)
    #[arg(long, global = true, env = ENV_LOG_FORMAT, value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// Agent identifier stamped on decision events
    #[arg(long, global = true, env = ENV_AGENT_ID)]
    pub agent_id: Option<String>,

    /// Significance level for correlation p-values
    #[arg(long, global = true, env = ENV_SIGNIFICANCE_LEVEL)]
    pub significance_level: Option<f64>,

    /// Decision event service base URL (in-memory when unset)
    #[arg(long, global = true, env = ENV_STORAGE_ENDPOINT)]
    pub storage_endpoint: Option<String>,

    /// Bearer token for the decision event service
    #[arg(long, global = true, env = ENV_STORAGE_API_KEY, hide_env_values = true)]
    pub storage_api_key: Option<String>,

    /// Enable or disable telemetry emission
    #[arg(long, global = true, env = ENV_TELEMETRY_ENABLED)]
    pub telemetry: Option<bool>,

    /// Telemetry collector base URL (log sink when unset)
    #[arg(long, global = true, env = ENV_TELEMETRY_ENDPOINT)]
    pub telemetry_endpoint: Option<String>,
}

/// Parse log format from CLI/env string
fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    match s.to_lowercase().as_str() {
        "compact" | "text" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        _ => Err(format!(
            "Invalid log format '{}'. Valid options: compact, json",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run one analysis request and print the response
    Analyze {
        /// JSON file holding a tagged analysis request ("-" for stdin)
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Write the response here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// List stored decision events
    Events {
        /// Maximum number of events to return
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,

        /// Only events for this execution reference
        #[arg(long)]
        execution_ref: Option<String>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    pub agent_id: Option<String>,
    pub significance_level: Option<f64>,
    pub storage_endpoint: Option<String>,
    pub storage_api_key: Option<String>,
    pub telemetry: Option<bool>,
    pub telemetry_endpoint: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        log_format: cli.log_format,
        agent_id: cli.agent_id,
        significance_level: cli.significance_level,
        storage_endpoint: cli.storage_endpoint,
        storage_api_key: cli.storage_api_key,
        telemetry: cli.telemetry,
        telemetry_endpoint: cli.telemetry_endpoint,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("json"), Ok(LogFormat::Json));
        assert_eq!(parse_log_format("JSON"), Ok(LogFormat::Json));
        assert_eq!(parse_log_format("compact"), Ok(LogFormat::Compact));
        assert!(parse_log_format("yaml").is_err());
    }

    #[test]
    fn test_analyze_command_parses() {
        let cli = Cli::try_parse_from([
            "costlens",
            "analyze",
            "--input",
            "req.json",
            "--storage-endpoint",
            "http://localhost:9000",
        ])
        .unwrap();

        assert_eq!(
            cli.storage_endpoint.as_deref(),
            Some("http://localhost:9000")
        );
        match cli.command {
            Commands::Analyze { input, output } => {
                assert_eq!(input, PathBuf::from("req.json"));
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_events_default_limit() {
        let cli = Cli::try_parse_from(["costlens", "events"]).unwrap();
        match cli.command {
            Commands::Events {
                limit,
                execution_ref,
            } => {
                assert_eq!(limit, 20);
                assert!(execution_ref.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
