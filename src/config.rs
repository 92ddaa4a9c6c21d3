use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sourcing: SourcingConfig,
    #[serde(default)]
    pub resolver: ResolverSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcingConfig {
    /// Search API key; empty disables the search provider
    #[serde(default)]
    pub search_api_key: String,
    /// Search API base URL
    #[serde(default = "default_search_url")]
    pub search_api_url: String,
    /// Model used for search and outcome derivation
    #[serde(default = "default_search_model")]
    pub search_model: String,
    /// Search request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,
}

fn default_search_url() -> String {
    "https://api.x.ai/v1".to_string()
}

fn default_search_model() -> String {
    "grok-4-1-fast-reasoning".to_string()
}

fn default_search_timeout() -> u64 {
    30
}

impl SourcingConfig {
    /// Search client settings derived from this section
    pub fn search_config(&self) -> crate::sourcing::SearchConfig {
        crate::sourcing::SearchConfig {
            api_key: self.search_api_key.clone(),
            base_url: self.search_api_url.clone(),
            timeout_secs: self.search_timeout_secs,
            model: self.search_model.clone(),
        }
    }
}

impl Default for SourcingConfig {
    fn default() -> Self {
        Self {
            search_api_key: String::new(),
            search_api_url: default_search_url(),
            search_model: default_search_model(),
            search_timeout_secs: default_search_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverSettings {
    /// Timeout for each outbound sourcing call in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

fn default_call_timeout() -> u64 {
    10
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout(),
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
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("resolver.call_timeout_secs", 10)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SETTLER_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SETTLER_SOURCING__SEARCH_API_KEY, etc.)
            .add_source(
                Environment::with_prefix("SETTLER")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.resolver.call_timeout_secs == 0 {
            errors.push("resolver.call_timeout_secs must be positive".to_string());
        }

        if self.sourcing.search_timeout_secs == 0 {
            errors.push("sourcing.search_timeout_secs must be positive".to_string());
        }

        if self.sourcing.search_api_url.trim().is_empty() {
            errors.push("sourcing.search_api_url must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
