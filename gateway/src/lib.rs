//! Backend-for-frontend in front of the projects and orders stores and the
//! event functions.

mod aggregate;
pub mod config;
mod errors;
mod http;
pub mod metrics_defs;
mod proxy;
mod service;
#[cfg(test)]
mod testutils;

pub use errors::GatewayError;

use service::http_service;
use shared::http::{run_http_service, serve_http};
use std::future::Future;
use tokio::net::TcpListener;

pub async fn run(config: config::Config) -> Result<(), GatewayError> {
    config.validate()?;
    run_http_service(
        &config.listener.host,
        config.listener.port,
        http_service(&config),
    )
    .await
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    config: config::Config,
    shutdown: F,
) -> Result<(), GatewayError>
where
    F: Future<Output = ()>,
{
    config.validate()?;
    tracing::info!(addr = ?listener.local_addr().ok(), "gateway listening");
    serve_http(listener, http_service(&config), shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Upstreams};
    use crate::testutils::FakeUpstream;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::{Request, StatusCode};
    use hyper_util::client::legacy::Client;
    use hyper_util::client::legacy::connect::HttpConnector;
    use hyper_util::rt::TokioExecutor;
    use shared::config::Listener;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_serve_until_shutdown() {
        let upstream = FakeUpstream::start(|_| {
            crate::testutils::Reply::json(StatusCode::OK, r#"{"id":"p1"}"#)
        })
        .await;
        let base = upstream.base_url();
        let config = Config {
            listener: Listener::new("127.0.0.1", 8080),
            upstreams: Upstreams {
                projects: base.clone(),
                orders: base.clone(),
                ingest: base.clone(),
                receipt: base,
            },
            upstream_timeout_secs: None,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, config, async move {
            let _ = stop_rx.await;
        }));

        let client: Client<HttpConnector, Full<Bytes>> =
            Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let request = Request::get(format!("http://{addr}/projects/p1"))
            .header("origin", "http://localhost:3000")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = client.request(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), br#"{"id":"p1"}"#);

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
