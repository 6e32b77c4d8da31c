use functions::config::{IngestConfig, ReceiptConfig};
use serde::Deserialize;
use shared::env::{Env, EnvError};
use std::fs::File;
use std::str::FromStr;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_STATSD_PORT: u16 = 8125;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected pretty or json, got {other}")),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: LogFormat::default(),
            sentry_dsn: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CommonConfig {
    pub logging: Option<LoggingConfig>,
    pub metrics: Option<MetricsConfig>,
}

impl CommonConfig {
    pub fn from_env(env: &Env) -> Result<Self, EnvError> {
        let level = env.var("LOG_LEVEL");
        let format = env.parse_opt::<LogFormat>("LOG_FORMAT")?;
        let sentry_dsn = env.var("SENTRY_DSN");
        let logging = if level.is_none() && format.is_none() && sentry_dsn.is_none() {
            None
        } else {
            Some(LoggingConfig {
                level: level.unwrap_or_else(default_log_level),
                format: format.unwrap_or_default(),
                sentry_dsn,
            })
        };

        let metrics = match env.var("STATSD_HOST") {
            Some(statsd_host) => Some(MetricsConfig {
                statsd_host,
                statsd_port: env.parse_or("STATSD_PORT", DEFAULT_STATSD_PORT)?,
            }),
            None => None,
        };

        Ok(CommonConfig { logging, metrics })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub gateway: Option<gateway::config::Config>,
    pub projects: Option<projects::config::Config>,
    pub orders: Option<orders::config::Config>,
    pub ingest: Option<IngestConfig>,
    pub receipt: Option<ReceiptConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("could not read config from environment: {0}")]
    EnvError(#[from] EnvError),
    #[error("config file has no {0} section")]
    MissingSection(&'static str),
}
