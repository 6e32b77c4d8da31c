use axum::Router;
use tokio::net::TcpListener;
use url::Url;

/// Serves `router` on an ephemeral local port for the rest of the test.
pub async fn spawn_downstream(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/").parse().unwrap()
}

/// A URL nothing is listening on.
pub async fn unused_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/").parse().unwrap()
}
