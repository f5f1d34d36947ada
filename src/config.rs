use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Model artifact configuration
    pub model: ModelConfig,

    /// External record store configuration
    pub record_source: RecordSourceConfig,

    /// Call queue simulator defaults
    pub queue: QueueSettings,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: MPS_)
            .add_source(
                config::Environment::with_prefix("MPS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the pre-trained pipeline artifact (JSON)
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSourceConfig {
    /// Record store endpoint (paginated table records API)
    pub base_url: String,

    /// View identifier passed on every fetch
    pub view_id: String,

    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Fetch timeout (seconds), single attempt
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Default number of records fetched when a caller does not supply a batch
    #[serde(default = "default_fetch_limit")]
    pub default_limit: usize,
}

impl RecordSourceConfig {
    /// Resolve the API token from the configured environment variable
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Default queue size for a new session
    #[serde(default = "default_queue_size")]
    pub default_queue_size: usize,

    /// Upper bound on queue size accepted from the operator
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Default upsell bonus unit (currency per fully-uncertain conversion)
    #[serde(default = "default_bonus_unit")]
    pub default_bonus_unit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON-formatted logs
    #[serde(default)]
    pub json_logs: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("data/model_1mvp.json")
}

fn default_token_env() -> String {
    "NOCODB_TOKEN".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_fetch_limit() -> usize {
    100
}

fn default_queue_size() -> usize {
    10
}

fn default_max_queue_size() -> usize {
    50
}

fn default_bonus_unit() -> f64 {
    10.0
}

fn default_log_level() -> String {
    "info".to_string()
}
