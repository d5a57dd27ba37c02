// Configuration module entry point
// Loads application configuration from file, environment and defaults

mod types;

use std::net::SocketAddr;

pub use types::{
    Config, DocsConfig, FeatureConfig, HttpConfig, LoggingConfig, PathsConfig,
    PerformanceConfig, RateLimitConfig, ResponseType, ServerConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "zing";

impl Config {
    /// Load configuration from `zing.toml` (optional) and `ZING_*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("features.enable_cors", defaults.features.enable_cors)?
            .set_default("features.enable_rate_limit", defaults.features.enable_rate_limit)?
            .set_default("features.enable_logging", defaults.features.enable_logging)?
            .set_default("features.serve_static", defaults.features.serve_static)?
            .set_default("features.default_response_type", "json")?
            .set_default("features.enable_docs", defaults.features.enable_docs)?
            .set_default("paths.routes_dir", defaults.paths.routes_dir)?
            .set_default("paths.static_dir", defaults.paths.static_dir)?
            .set_default("paths.log_file", defaults.paths.log_file)?
            .set_default("logging.access_log", defaults.logging.access_log)?
            .set_default("logging.access_log_format", defaults.logging.access_log_format)?
            .set_default(
                "rate_limit.max_requests",
                i64::from(defaults.rate_limit.max_requests),
            )?
            .set_default("rate_limit.window_secs", 900)?
            .set_default("rate_limit.capacity", 10_000)?
            .set_default("docs.title", defaults.docs.title)?
            .set_default("docs.version", defaults.docs.version)?
            .set_default("docs.description", defaults.docs.description)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("performance.keep_alive", defaults.performance.keep_alive)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("ZING")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
