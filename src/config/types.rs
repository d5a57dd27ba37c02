// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            workers: None,
        }
    }
}

/// Framework feature switches
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeatureConfig {
    pub enable_cors: bool,
    pub enable_rate_limit: bool,
    pub enable_logging: bool,
    pub serve_static: bool,
    pub default_response_type: ResponseType,
    pub enable_docs: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enable_cors: false,
            enable_rate_limit: false,
            enable_logging: true,
            serve_static: false,
            default_response_type: ResponseType::Json,
            enable_docs: false,
        }
    }
}

/// How handler payloads are serialized
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Json,
    Text,
}

/// Conventional directories and files
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    pub routes_dir: String,
    pub static_dir: String,
    pub log_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            routes_dir: "routes".to_string(),
            static_dir: "public".to_string(),
            log_file: "logs/server.log".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: false,
            access_log_format: default_access_log_format(),
        }
    }
}

/// Fixed-window rate limit settings
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    /// Upper bound on tracked client addresses
    pub capacity: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
            capacity: 10_000,
        }
    }
}

/// Metadata published by the `/docs` endpoint
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DocsConfig {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            title: "Zing API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Auto-generated API documentation".to_string(),
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10_485_760,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            max_connections: None,
        }
    }
}
