use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub tracker: TrackerConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,  // in bytes
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    pub poll_interval_ms: u64,
    // Statuses that end polling. "completed" is always treated as success.
    pub terminal_statuses: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub marker_radius: u32,
    pub marker_hover_radius: u32,
    pub tooltip_fade_ms: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            terminal_statuses: vec!["completed".to_string(), "failed".to_string()],
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            marker_radius: 4,
            marker_hover_radius: 7,
            tooltip_fade_ms: 500,
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                max_body_size: 65536,
            },
            backend: BackendConfig {
                base_url: "http://127.0.0.1:5000/api".to_string(),
                request_timeout_secs: 5,
            },
            tracker: TrackerConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}
