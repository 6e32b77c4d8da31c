use serde::Deserialize;
use shared::config::{Listener, ValidationError, validate_http_url};
use shared::env::{Env, EnvError};
use std::time::Duration;
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;

/// Gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for client traffic
    pub listener: Listener,
    /// Where requests are relayed to
    pub upstreams: Upstreams,
    /// Limit for a single upstream exchange, body included. Unset means no limit.
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,
}

/// Downstream locations.
///
/// `projects` and `orders` are base URLs that entity paths are appended to;
/// `ingest` and `receipt` are the full URLs of the function endpoints.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Upstreams {
    pub projects: Url,
    pub orders: Url,
    pub ingest: Url,
    pub receipt: Url,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        validate_http_url("upstreams.projects", &self.upstreams.projects)?;
        validate_http_url("upstreams.orders", &self.upstreams.orders)?;
        validate_http_url("upstreams.ingest", &self.upstreams.ingest)?;
        validate_http_url("upstreams.receipt", &self.upstreams.receipt)?;
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }

    pub fn from_env(env: &Env) -> Result<Self, EnvError> {
        Ok(Config {
            listener: Listener::new(
                env.var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
                env.parse_or("PORT", DEFAULT_PORT)?,
            ),
            upstreams: Upstreams {
                projects: env.url("MS_PROJECTS_BASE_URL")?,
                orders: env.url("MS_ORDERS_BASE_URL")?,
                ingest: env.url("FN_INGEST_URL")?,
                receipt: env.url("FN_RECEIPT_URL")?,
            },
            upstream_timeout_secs: env.parse_opt("UPSTREAM_TIMEOUT_SECS")?,
        })
    }
}
