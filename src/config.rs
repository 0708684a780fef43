//! Engine configuration.
//!
//! Configuration is resolved once at startup and read-only thereafter.
//! Precedence: environment variables override file values, which override
//! built-in defaults. The four operator parameters (rate, duration, message
//! size, symbols) additionally come in through the CLI and are applied last
//! by `main`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use streamsim_generator::{MessageProfile, MessageSynthesizer, SynthesisError};
use tracing::info;

/// Fatal configuration errors, detected before any worker starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("target rate must be positive")]
    NonPositiveRate,

    #[error("max_workers must be positive")]
    ZeroWorkers,

    #[error("min_batch_size must be positive")]
    ZeroMinBatch,

    #[error("min_batch_size {0} exceeds max_batch_size {1}")]
    BatchBounds(usize, usize),

    #[error("batch_size_per_1k_rate must be positive")]
    ZeroBatchScale,

    #[error("stats interval must be positive")]
    ZeroStatsInterval,

    #[error("endpoint brokers must not be empty")]
    EmptyBrokers,

    #[error("endpoint topic must not be empty")]
    EmptyTopic,

    /// Unsatisfiable message profile (empty symbol set, impossible size
    /// window, invalid value ranges).
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Pacing, batching and retry knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Global target rate in messages/second.
    pub target_rate: u64,
    /// Run duration in seconds; 0 means run until interrupted.
    pub duration_secs: u64,
    /// Upper bound on the worker pool size.
    pub max_workers: usize,
    /// Lower bound on the per-cycle batch size.
    pub min_batch_size: usize,
    /// Upper bound on the per-cycle batch size (transport ceiling).
    pub max_batch_size: usize,
    /// Batch size scale: messages per batch per 1000 msg/sec of rate share.
    pub batch_size_per_1k_rate: usize,
    /// Transient-failure retries per batch before it is dropped.
    pub retry_attempts: u32,
    /// Fixed spacing between retries, in milliseconds.
    pub retry_delay_ms: u64,
    /// Progress report interval in seconds.
    pub stats_interval_secs: u64,
    /// Base seed for deterministic payload generation.
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            target_rate: 10_000,
            duration_secs: 0,
            max_workers: 50,
            min_batch_size: 1,
            max_batch_size: 1000,
            batch_size_per_1k_rate: 100,
            retry_attempts: 3,
            retry_delay_ms: 500,
            stats_interval_secs: 1,
            seed: 42,
        }
    }
}

/// Downstream endpoint settings, opaque to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Kafka bootstrap servers.
    pub brokers: String,
    /// Topic the payloads are published to.
    pub topic: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: "streamsim".to_string(),
        }
    }
}

/// Resolved engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulator: SimulatorConfig,
    pub message: MessageProfile,
    pub endpoint: EndpointConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolve configuration with the documented precedence: built-in
    /// defaults, overlaid by the file (if present), overlaid by environment
    /// variables.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.is_file() {
            Self::from_file(path)?
        } else {
            info!("config file {:?} not found, using defaults", path);
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply endpoint overrides from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(brokers) = std::env::var("STREAMSIM_BROKERS") {
            self.endpoint.brokers = brokers;
        }
        if let Ok(topic) = std::env::var("STREAMSIM_TOPIC") {
            self.endpoint.topic = topic;
        }
    }

    /// Validate the resolved configuration.
    ///
    /// Any error here is fatal and aborts before workers start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulator;
        if sim.target_rate == 0 {
            return Err(ConfigError::NonPositiveRate);
        }
        if sim.max_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if sim.min_batch_size == 0 {
            return Err(ConfigError::ZeroMinBatch);
        }
        if sim.min_batch_size > sim.max_batch_size {
            return Err(ConfigError::BatchBounds(
                sim.min_batch_size,
                sim.max_batch_size,
            ));
        }
        if sim.batch_size_per_1k_rate == 0 {
            return Err(ConfigError::ZeroBatchScale);
        }
        if sim.stats_interval_secs == 0 {
            return Err(ConfigError::ZeroStatsInterval);
        }
        if self.endpoint.brokers.is_empty() {
            return Err(ConfigError::EmptyBrokers);
        }
        if self.endpoint.topic.is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        MessageSynthesizer::validate(&self.message)?;
        Ok(())
    }

    /// Fixed spacing between delivery retries.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.simulator.retry_delay_ms)
    }

    /// Interval between progress reports.
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.simulator.stats_interval_secs)
    }

    /// Shutdown grace period for in-flight sends.
    pub fn grace_period(&self) -> Duration {
        2 * self.stats_interval()
    }
}

/// Load the symbol set from a comma-separated list, a file with one symbol
/// per line, or a single symbol. Symbols are normalized to uppercase.
pub fn load_symbols(input: &str) -> Result<Vec<String>, ConfigError> {
    if input.contains(',') {
        return Ok(input
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect());
    }

    let path = Path::new(input);
    if path.is_file() {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: input.to_string(),
            source,
        })?;
        return Ok(content
            .lines()
            .map(|line| line.trim().to_uppercase())
            .filter(|line| !line.is_empty())
            .collect());
    }

    Ok(vec![input.trim().to_uppercase()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.simulator.target_rate, 10_000);
        assert_eq!(config.simulator.duration_secs, 0);
        assert_eq!(config.message.message_size_bytes, 500);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let yaml = r#"
simulator:
  target_rate: 25000
  duration_secs: 300
message:
  message_size_bytes: 1024
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.simulator.target_rate, 25_000);
        assert_eq!(config.simulator.duration_secs, 300);
        // Untouched knobs fall back to defaults.
        assert_eq!(config.simulator.max_workers, 50);
        assert_eq!(config.message.message_size_bytes, 1024);
        assert_eq!(config.message.size_tolerance, 50);
        assert_eq!(config.endpoint.brokers, "localhost:9092");
    }

    #[test]
    fn test_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "simulator:\n  target_rate: 777\nendpoint:\n  topic: ticks"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.simulator.target_rate, 777);
        assert_eq!(config.endpoint.topic, "ticks");
    }

    #[test]
    fn test_missing_file_resolves_to_defaults() {
        let config = Config::resolve("/nonexistent/streamsim.yaml").unwrap();
        assert_eq!(config.simulator.target_rate, 10_000);
    }

    #[test]
    fn test_env_overrides_endpoint() {
        std::env::set_var("STREAMSIM_BROKERS", "broker-a:9092,broker-b:9092");
        std::env::set_var("STREAMSIM_TOPIC", "env-topic");

        let mut config = Config::default();
        config.apply_env();

        std::env::remove_var("STREAMSIM_BROKERS");
        std::env::remove_var("STREAMSIM_TOPIC");

        assert_eq!(config.endpoint.brokers, "broker-a:9092,broker-b:9092");
        assert_eq!(config.endpoint.topic, "env-topic");
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let mut config = Config::default();
        config.simulator.target_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveRate)
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_batch_bounds() {
        let mut config = Config::default();
        config.simulator.min_batch_size = 500;
        config.simulator.max_batch_size = 100;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BatchBounds(500, 100))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_symbols() {
        let mut config = Config::default();
        config.message.symbols.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Synthesis(_))));
    }

    #[test]
    fn test_load_symbols_comma_list() {
        let symbols = load_symbols("aapl, googl ,MSFT,").unwrap();
        assert_eq!(symbols, vec!["AAPL", "GOOGL", "MSFT"]);
    }

    #[test]
    fn test_load_symbols_single() {
        let symbols = load_symbols("tsla").unwrap();
        assert_eq!(symbols, vec!["TSLA"]);
    }

    #[test]
    fn test_load_symbols_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "aapl\n\n amzn \nnvda").unwrap();

        let symbols = load_symbols(file.path().to_str().unwrap()).unwrap();
        assert_eq!(symbols, vec!["AAPL", "AMZN", "NVDA"]);
    }
}
