use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("{field} must be an http or https URL, got {url}")]
    UnsupportedScheme { field: &'static str, url: String },

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Listener {
            host: host.into(),
            port,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// SQLite database location. `:memory:` opens a private in-memory database.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        DatabaseConfig {
            path: ":memory:".into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.trim().is_empty() {
            return Err(ValidationError::EmptyDatabasePath);
        }
        Ok(())
    }
}

/// Rejects URLs the HTTP clients cannot talk to.
pub fn validate_http_url(field: &'static str, url: &Url) -> Result<(), ValidationError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::UnsupportedScheme {
            field,
            url: url.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_validation() {
        assert!(Listener::new("0.0.0.0", 8080).validate().is_ok());
        assert_eq!(
            Listener::new("0.0.0.0", 0).validate(),
            Err(ValidationError::InvalidPort)
        );
    }

    #[test]
    fn test_listener_deserialization() {
        let listener: Listener = serde_yaml::from_str("{host: 127.0.0.1, port: 3000}").unwrap();
        assert_eq!(listener, Listener::new("127.0.0.1", 3000));
        assert!(serde_yaml::from_str::<Listener>("{host: 127.0.0.1, port: nope}").is_err());
    }

    #[test]
    fn test_database_validation() {
        assert!(DatabaseConfig::in_memory().validate().is_ok());
        let empty = DatabaseConfig { path: " ".into() };
        assert_eq!(empty.validate(), Err(ValidationError::EmptyDatabasePath));
    }

    #[test]
    fn test_url_scheme() {
        let http = Url::parse("http://orders:8082").unwrap();
        assert!(validate_http_url("orders", &http).is_ok());

        let ftp = Url::parse("ftp://orders").unwrap();
        assert!(matches!(
            validate_http_url("orders", &ftp),
            Err(ValidationError::UnsupportedScheme { field: "orders", .. })
        ));
    }
}
