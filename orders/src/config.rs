use serde::Deserialize;
use shared::config::{DatabaseConfig, Listener, ValidationError};
use shared::env::{Env, EnvError};

pub const DEFAULT_PORT: u16 = 8082;
pub const DEFAULT_DATABASE_PATH: &str = "orders.sqlite";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub listener: Listener,
    pub database: DatabaseConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.database.validate()
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config() {
        let config: Config = serde_yaml::from_str(
            "listener: {host: 0.0.0.0, port: 8082}\ndatabase: {path: orders.sqlite}",
        )
        .unwrap();
        assert!(config.validate().is_ok());

        let config: Config =
            serde_yaml::from_str("listener: {host: 0.0.0.0, port: 0}\ndatabase: {path: x}")
                .unwrap();
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn test_from_env() {
        let config = Config::from_env(&Env::from_map(HashMap::new())).unwrap();
        assert_eq!(config.listener.port, DEFAULT_PORT);
        assert_eq!(config.database.path, DEFAULT_DATABASE_PATH);

        let vars = HashMap::from([
            ("HOST".to_string(), "127.0.0.1".to_string()),
            ("DATABASE_PATH".to_string(), ":memory:".to_string()),
        ]);
        let config = Config::from_env(&Env::from_map(vars)).unwrap();
        assert_eq!(config.listener, Listener::new("127.0.0.1", DEFAULT_PORT));
        assert_eq!(config.database, DatabaseConfig::in_memory());
    }
}
