use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::domain::Cluster;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub devnet: ClusterConfig,
    pub mainnet: ClusterConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// JSON-RPC endpoint of the cluster
    pub endpoint: String,
    /// Prediction program id (base58)
    pub program_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between discovery ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Delay before restarting a crashed tick loop
    #[serde(default = "default_restart_delay")]
    pub restart_delay_ms: u64,
    /// Restarts allowed inside one window before cooling down
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,
    /// Time window to count restarts in
    #[serde(default = "default_restart_window")]
    pub restart_window_secs: u64,
    /// Pause applied once the restart budget is exhausted
    #[serde(default = "default_restart_cooldown")]
    pub restart_cooldown_secs: u64,
}

fn default_tick_interval() -> u64 {
    10
}

fn default_restart_delay() -> u64 {
    1000
}

fn default_max_restarts() -> u32 {
    5
}

fn default_restart_window() -> u64 {
    300
}

fn default_restart_cooldown() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            restart_delay_ms: default_restart_delay(),
            max_restarts: default_max_restarts(),
            restart_window_secs: default_restart_window(),
            restart_cooldown_secs: default_restart_cooldown(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Polling interval for subscribed accounts in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Accounts per getMultipleAccounts request (RPC limit is 100)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Batches in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_batch_size() -> usize {
    100
}

fn default_max_concurrency() -> usize {
    5
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Byte offsets of the dependent addresses inside a raw `Game` account
/// (discriminator included).
///
/// These follow the deployed program's `Game` layout and must be recomputed
/// from its IDL (8-byte discriminator plus the Borsh sizes of the fields before
/// each pubkey) whenever that layout changes. The defaults match the layout
/// this service was first deployed against.
#[derive(Debug, Clone, Deserialize)]
pub struct DecoderConfig {
    #[serde(default = "default_round_history_offset")]
    pub game_round_history_offset: usize,
    #[serde(default = "default_user_prediction_history_offset")]
    pub game_user_prediction_history_offset: usize,
}

fn default_round_history_offset() -> usize {
    136
}

fn default_user_prediction_history_offset() -> usize {
    104
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            game_round_history_offset: default_round_history_offset(),
            game_user_prediction_history_offset: default_user_prediction_history_offset(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration for a deployment selector (e.g. `production`)
    pub fn load(selector: &str) -> Result<Self, ConfigError> {
        Self::load_from("config", selector)
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P, selector: &str) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load selector-specific config (e.g., config/production.toml)
            .add_source(File::from(config_dir.join(selector)).required(false))
            // Override with environment variables (MIRROR_DEVNET__ENDPOINT, etc.)
            .add_source(
                Environment::with_prefix("MIRROR")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain endpoint variables win, matching existing deployments
            .set_override_option("devnet.endpoint", std::env::var("DEVNET_ENDPOINT").ok())?
            .set_override_option("mainnet.endpoint", std::env::var("MAINNET_ENDPOINT").ok())?;

        builder.build()?.try_deserialize()
    }

    pub fn cluster(&self, cluster: Cluster) -> &ClusterConfig {
        match cluster {
            Cluster::Devnet => &self.devnet,
            Cluster::Mainnet => &self.mainnet,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for cluster in Cluster::ALL {
            let cfg = self.cluster(cluster);
            if !(cfg.endpoint.starts_with("http://") || cfg.endpoint.starts_with("https://")) {
                errors.push(format!("{cluster}.endpoint must be an http(s) URL"));
            }
            if cfg.program_id.parse::<crate::domain::Address>().is_err() {
                errors.push(format!("{cluster}.program_id is not a valid address"));
            }
        }

        if self.scheduler.tick_interval_secs == 0 {
            errors.push("scheduler.tick_interval_secs must be positive".to_string());
        }

        if self.fetcher.poll_interval_ms == 0 {
            errors.push("fetcher.poll_interval_ms must be positive".to_string());
        }

        if self.fetcher.batch_size == 0 || self.fetcher.batch_size > 100 {
            errors.push("fetcher.batch_size must be between 1 and 100".to_string());
        }

        if self.fetcher.max_concurrency == 0 {
            errors.push("fetcher.max_concurrency must be positive".to_string());
        }

        let rh = self.decoder.game_round_history_offset;
        let uph = self.decoder.game_user_prediction_history_offset;
        if rh < 8 || uph < 8 {
            errors.push("decoder offsets must skip the 8-byte discriminator".to_string());
        }
        if rh.abs_diff(uph) < 32 {
            errors.push("decoder offsets overlap; each reference is 32 bytes".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
