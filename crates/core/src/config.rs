use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::{value::StrDeserializer, IntoDeserializer};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_CANDIDATES: [&str; 2] = ["shop.toml", "config/shop.toml"];

const ENV_BIND_ADDRESS: &str = "SHOP_SERVER_BIND_ADDRESS";
const ENV_PORT: &str = "SHOP_SERVER_PORT";
const ENV_HEALTH_CHECK_PORT: &str = "SHOP_SERVER_HEALTH_CHECK_PORT";
const ENV_GRACEFUL_SHUTDOWN_SECS: &str = "SHOP_SERVER_GRACEFUL_SHUTDOWN_SECS";
const ENV_LOG_LEVEL: &str = "SHOP_LOGGING_LEVEL";
const ENV_LOG_FORMAT: &str = "SHOP_LOGGING_FORMAT";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub health_check_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            health_check_port: 8081,
            graceful_shutdown_secs: 15,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `SHOP_*` variables, then `options.overrides`.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        Self::load_with_env(options, |key| env::var(key).ok())
    }

    pub fn load_with_env<F>(options: LoadOptions, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match locate_file(&options)? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| lookup(key).filter(|value| !value.trim().is_empty()))?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    pub fn health_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.health_check_port)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_BIND_ADDRESS) {
            self.server.bind_address = value;
        }
        if let Some(value) = lookup(ENV_PORT) {
            self.server.port = parse_env(ENV_PORT, &value)?;
        }
        if let Some(value) = lookup(ENV_HEALTH_CHECK_PORT) {
            self.server.health_check_port = parse_env(ENV_HEALTH_CHECK_PORT, &value)?;
        }
        if let Some(value) = lookup(ENV_GRACEFUL_SHUTDOWN_SECS) {
            self.server.graceful_shutdown_secs = parse_env(ENV_GRACEFUL_SHUTDOWN_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = value;
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = parse_log_format(&value)?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides { bind_address, port, health_check_port, log_level } = overrides;
        if let Some(bind_address) = bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(health_check_port) = health_check_port {
            self.server.health_check_port = health_check_port;
        }
        if let Some(log_level) = log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        let problem = if server.bind_address.trim().is_empty() {
            Some("server.bind_address must not be empty".to_string())
        } else if server.port == 0 || server.health_check_port == 0 {
            Some("server.port and server.health_check_port must be greater than zero".to_string())
        } else if server.port == server.health_check_port {
            Some(format!(
                "server.health_check_port must differ from server.port (both are {})",
                server.port
            ))
        } else if server.graceful_shutdown_secs == 0 {
            Some("server.graceful_shutdown_secs must be greater than zero".to_string())
        } else if !matches!(
            self.logging.level.trim().to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            Some("logging.level must be one of trace|debug|info|warn|error".to_string())
        } else {
            None
        };

        problem.map_or(Ok(()), |message| Err(ConfigError::Validation(message)))
    }
}

fn locate_file(options: &LoadOptions) -> Result<Option<PathBuf>, ConfigError> {
    let found = match &options.config_path {
        Some(path) => path.exists().then(|| path.clone()),
        None => CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists()),
    };

    if found.is_none() && options.require_file {
        let expected = options
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
        return Err(ConfigError::MissingConfigFile(expected));
    }
    Ok(found)
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid_env(key, value))
}

// Same spelling rules as the `[logging] format` key in the file.
fn parse_log_format(value: &str) -> Result<LogFormat, ConfigError> {
    let normalized = value.trim().to_ascii_lowercase();
    let deserializer: StrDeserializer<'_, serde::de::value::Error> =
        normalized.as_str().into_deserializer();
    LogFormat::deserialize(deserializer).map_err(|_| invalid_env(ENV_LOG_FORMAT, value))
}

fn invalid_env(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}
