//! Request logging and request metrics for the axum services.

use crate::metrics_defs::{MetricDef, MetricType};
use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

pub const HTTP_REQUEST_DURATION: MetricDef = MetricDef {
    name: "http.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time to answer a request in seconds, by route, method and status",
};

pub const HTTP_REQUESTS: MetricDef = MetricDef {
    name: "http.requests",
    metric_type: MetricType::Counter,
    description: "Number of requests answered, by route, method and status",
};

pub const ALL_METRICS: &[MetricDef] = &[HTTP_REQUEST_DURATION, HTTP_REQUESTS];

const UNMATCHED_ROUTE: &str = "unmatched";

/// Logs every request once it has been answered. Attach with
/// `axum::middleware::from_fn(access_log)`.
pub async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, |matched| matched.as_str())
        .to_string();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = start.elapsed();

    crate::histogram!(
        HTTP_REQUEST_DURATION,
        "route" => route.clone(),
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .record(elapsed.as_secs_f64());
    crate::counter!(
        HTTP_REQUESTS,
        "route" => route.clone(),
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    if status.is_server_error() {
        tracing::warn!(%method, %path, %route, status = status.as_u16(), ?elapsed, "request failed");
    } else {
        tracing::info!(%method, %path, %route, status = status.as_u16(), ?elapsed, "request");
    }

    response
}
