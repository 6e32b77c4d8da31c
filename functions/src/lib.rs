//! Event functions that chain calls to the stores: credit ingestion and the
//! payment receipt hook.

pub mod config;
mod downstream;
mod errors;
mod ingest;
pub mod metrics_defs;
mod receipt;
#[cfg(test)]
mod testutils;

pub use errors::FunctionError;

use axum::Router;
use config::{IngestConfig, ReceiptConfig};
use shared::config::Listener;
use shared::http::shutdown_signal;
use std::future::Future;
use tokio::net::TcpListener;

pub async fn run_ingest(config: IngestConfig) -> Result<(), FunctionError> {
    config.validate()?;
    let listener = bind(&config.listener).await?;
    serve_ingest(listener, config, shutdown_signal()).await
}

pub async fn serve_ingest<F>(
    listener: TcpListener,
    config: IngestConfig,
    shutdown: F,
) -> Result<(), FunctionError>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;
    let app = ingest::router(ingest::IngestState::new(config.projects_url));
    serve(listener, app, "ingest-credit", shutdown).await
}

pub async fn run_receipt(config: ReceiptConfig) -> Result<(), FunctionError> {
    config.validate()?;
    let listener = bind(&config.listener).await?;
    serve_receipt(listener, config, shutdown_signal()).await
}

pub async fn serve_receipt<F>(
    listener: TcpListener,
    config: ReceiptConfig,
    shutdown: F,
) -> Result<(), FunctionError>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;
    let app = receipt::router(receipt::ReceiptState::new(config.orders_url));
    serve(listener, app, "receipt-hook", shutdown).await
}

async fn bind(listener: &Listener) -> std::io::Result<TcpListener> {
    TcpListener::bind((listener.host.as_str(), listener.port)).await
}

async fn serve<F>(
    listener: TcpListener,
    app: Router,
    function: &'static str,
    shutdown: F,
) -> Result<(), FunctionError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(function, addr = ?listener.local_addr().ok(), "function listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
