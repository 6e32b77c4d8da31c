//! Orders store.

mod api;
pub mod config;
mod errors;
pub mod metrics_defs;
mod model;
mod store;

pub use errors::OrdersError;
pub use model::{PAID, PENDING};

use shared::db::Database;
use shared::http::shutdown_signal;
use std::future::Future;
use store::OrderStore;
use tokio::net::TcpListener;

pub async fn run(config: config::Config) -> Result<(), OrdersError> {
    config.validate()?;
    let listener = TcpListener::bind((config.listener.host.as_str(), config.listener.port)).await?;
    serve(listener, config, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    config: config::Config,
    shutdown: F,
) -> Result<(), OrdersError>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;
    let store = OrderStore::open(Database::open(&config.database)?).await?;

    tracing::info!(addr = ?listener.local_addr().ok(), "orders store listening");
    axum::serve(listener, api::router(store))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
