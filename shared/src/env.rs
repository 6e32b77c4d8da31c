//! Reading component configuration from environment variables.
//!
//! Lookups go through [`Env`] so tests can supply variables without touching
//! the process environment.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum EnvError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for environment variable {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

pub struct Env {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl Env {
    /// Reads from the process environment.
    pub fn process() -> Self {
        Env {
            lookup: Box::new(|name| std::env::var(name).ok()),
        }
    }

    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Env {
            lookup: Box::new(move |name| vars.get(name).cloned()),
        }
    }

    /// Returns the variable if set and not blank.
    pub fn var(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    pub fn required(&self, name: &'static str) -> Result<String, EnvError> {
        self.var(name).ok_or(EnvError::Missing(name))
    }

    pub fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, EnvError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.var(name) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| EnvError::Invalid {
                name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    pub fn parse_opt<T>(&self, name: &'static str) -> Result<Option<T>, EnvError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.var(name)
            .map(|raw| {
                raw.trim().parse().map_err(|e: T::Err| EnvError::Invalid {
                    name,
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn url(&self, name: &'static str) -> Result<Url, EnvError> {
        let raw = self.required(name)?;
        Url::parse(raw.trim()).map_err(|e| EnvError::Invalid {
            name,
            reason: e.to_string(),
        })
    }
}
