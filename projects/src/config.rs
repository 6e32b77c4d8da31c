use serde::Deserialize;
use shared::config::{DatabaseConfig, Listener, ValidationError};
use shared::env::{Env, EnvError};

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_DATABASE_PATH: &str = "projects.sqlite";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub listener: Listener,
    pub database: DatabaseConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.database.validate()?;
        Ok(())
    }

    pub fn from_env(env: &Env) -> Result<Self, EnvError> {
        Ok(Config {
            listener: Listener::new(
                env.var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
                env.parse_or("PORT", DEFAULT_PORT)?,
            ),
            database: DatabaseConfig {
                path: env
                    .var("DATABASE_PATH")
                    .unwrap_or_else(|| DEFAULT_DATABASE_PATH.into()),
            },
        })
    }
}
