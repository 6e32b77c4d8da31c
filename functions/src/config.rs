use serde::Deserialize;
use shared::config::{Listener, ValidationError, validate_http_url};
use shared::env::{Env, EnvError};
use url::Url;

pub const DEFAULT_INGEST_PORT: u16 = 8090;
pub const DEFAULT_RECEIPT_PORT: u16 = 8091;

/// Ingest function configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct IngestConfig {
    pub listener: Listener,
    /// Base URL of the projects store
    pub projects_url: Url,
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        validate_http_url("projects_url", &self.projects_url)
    }

    pub fn from_env(env: &Env) -> Result<Self, EnvError> {
        Ok(IngestConfig {
            listener: listener_from_env(env, DEFAULT_INGEST_PORT)?,
            projects_url: env.url("MS_PROJECTS_BASE_URL")?,
        })
    }
}

/// Receipt function configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ReceiptConfig {
    pub listener: Listener,
    /// Base URL of the orders store
    pub orders_url: Url,
}

impl ReceiptConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        validate_http_url("orders_url", &self.orders_url)
    }

    pub fn from_env(env: &Env) -> Result<Self, EnvError> {
        Ok(ReceiptConfig {
            listener: listener_from_env(env, DEFAULT_RECEIPT_PORT)?,
            orders_url: env.url("MS_ORDERS_BASE_URL")?,
        })
    }
}

fn listener_from_env(env: &Env, default_port: u16) -> Result<Listener, EnvError> {
    Ok(Listener::new(
        env.var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
        env.parse_or("PORT", default_port)?,
    ))
}
