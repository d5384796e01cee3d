//! Service configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "EXPENSE_REPORT";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Font configuration.
    #[serde(default)]
    pub fonts: FontConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Font configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FontConfig {
    /// Directory holding the bundled font files; searched before any other location.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from `config/default`, `config/<RUN_MODE>` and the environment.
    ///
    /// Environment variables use the `EXPENSE_REPORT` prefix with `__` between sections, for
    /// example `EXPENSE_REPORT__SERVER__PORT=8080`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.server.body_limit_bytes, 1024 * 1024);
        assert!(config.fonts.dir.is_none());
    }

    #[test]
    fn partial_sections_fall_back_to_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("server.port", 8080)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.fonts.dir.is_none());
    }
}
