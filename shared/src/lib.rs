pub mod access_log;
pub mod config;
pub mod cors;
pub mod db;
pub mod env;
pub mod http;
pub mod json;
pub mod metrics_defs;
pub mod routing;
pub mod time;
pub mod validation;
