//! `GET /aggregate/project/{id}`: one project with its batches and orders.
//!
//! The three reads run as separate tasks and are joined fail-fast. When a leg
//! fails the request is answered right away; the other tasks keep running and
//! their results are dropped.

use crate::config::Upstreams;
use crate::errors::GatewayError;
use crate::http::UpstreamClient;
use crate::metrics_defs::{AGGREGATE_LEG_DURATION, AGGREGATE_LEG_FAILURES};
use http::header::{ACCEPT, HeaderValue};
use hyper::body::Bytes;
use hyper::{Request, StatusCode};
use serde_json::{Value, json};
use shared::http::{downstream_error_message, upstream_url};
use shared::{counter, histogram};
use std::time::Instant;
use tokio::task::JoinHandle;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Project,
    Batches,
    Orders,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Leg::Project => "project",
            Leg::Batches => "batches",
            Leg::Orders => "orders",
        }
    }

    fn url(&self, upstreams: &Upstreams, project_id: &str) -> Url {
        match self {
            Leg::Project => upstream_url(&upstreams.projects, &["projects", project_id]),
            Leg::Batches => {
                let mut url = upstream_url(&upstreams.projects, &["batches"]);
                url.query_pairs_mut().append_pair("projectId", project_id);
                url
            }
            Leg::Orders => {
                let mut url = upstream_url(&upstreams.orders, &["orders"]);
                url.query_pairs_mut().append_pair("projectId", project_id);
                url
            }
        }
    }
}

/// Fetches the three payloads and combines them into
/// `{"project": .., "batches": .., "lastOrders": ..}`.
pub async fn aggregate_project(
    client: &UpstreamClient,
    upstreams: &Upstreams,
    project_id: &str,
) -> Result<Value, GatewayError> {
    let project = spawn_leg(client, upstreams, Leg::Project, project_id);
    let batches = spawn_leg(client, upstreams, Leg::Batches, project_id);
    let orders = spawn_leg(client, upstreams, Leg::Orders, project_id);

    let (project, batches, orders) =
        tokio::try_join!(join_leg(project), join_leg(batches), join_leg(orders))?;

    Ok(json!({
        "project": project,
        "batches": batches,
        "lastOrders": orders,
    }))
}

fn spawn_leg(
    client: &UpstreamClient,
    upstreams: &Upstreams,
    leg: Leg,
    project_id: &str,
) -> JoinHandle<Result<Value, GatewayError>> {
    let client = client.clone();
    let url = leg.url(upstreams, project_id);

    tokio::spawn(async move {
        let start = Instant::now();
        let result = fetch_json(&client, &url).await;
        histogram!(AGGREGATE_LEG_DURATION, "leg" => leg.as_str())
            .record(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            counter!(AGGREGATE_LEG_FAILURES, "leg" => leg.as_str()).increment(1);
            tracing::warn!(leg = leg.as_str(), %url, error = %e, "aggregate leg failed");
        }
        result
    })
}

async fn join_leg(handle: JoinHandle<Result<Value, GatewayError>>) -> Result<Value, GatewayError> {
    handle
        .await
        .map_err(|e| GatewayError::InternalError(format!("aggregate leg task failed: {e}")))?
}

async fn fetch_json(client: &UpstreamClient, url: &Url) -> Result<Value, GatewayError> {
    let request = Request::get(url.as_str())
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .body(Bytes::new())
        .map_err(|e| GatewayError::InternalError(format!("Failed to build request: {e}")))?;

    let response = client.send(url, request).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::UpstreamStatus {
            status,
            message: downstream_error_message(status, response.body()),
        });
    }

    serde_json::from_slice(response.body()).map_err(|e| {
        GatewayError::InvalidUpstreamJson(url.host_str().unwrap_or("upstream").into(), e.to_string())
    })
}

/// Status and message for a failed aggregate.
pub fn failure(err: &GatewayError) -> (StatusCode, String) {
    let message = err.to_string();
    if message.is_empty() {
        (err.status(), "aggregate failed".to_string())
    } else {
        (err.status(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{FakeUpstream, Reply, unused_url};
    use std::time::Duration;

    fn upstreams(projects: Url, orders: Url) -> Upstreams {
        Upstreams {
            projects,
            orders,
            ingest: Url::parse("http://127.0.0.1:1/api/ingest-credit").unwrap(),
            receipt: Url::parse("http://127.0.0.1:1/api/receipt-hook").unwrap(),
        }
    }

    #[test]
    fn test_leg_urls() {
        let upstreams = upstreams(
            Url::parse("http://projects:8081").unwrap(),
            Url::parse("http://orders:8082/").unwrap(),
        );
        assert_eq!(
            Leg::Project.url(&upstreams, "p 1").as_str(),
            "http://projects:8081/projects/p%201"
        );
        assert_eq!(
            Leg::Batches.url(&upstreams, "p&1").as_str(),
            "http://projects:8081/batches?projectId=p%261"
        );
        assert_eq!(
            Leg::Orders.url(&upstreams, "abc").as_str(),
            "http://orders:8082/orders?projectId=abc"
        );
    }

    #[tokio::test]
    async fn test_aggregate_success() {
        let projects = FakeUpstream::start(|req| {
            if req.path_and_query.starts_with("/projects/") {
                Reply::json(StatusCode::OK, r#"{"id":"p1","name":"Forest"}"#)
            } else {
                Reply::json(StatusCode::OK, r#"{"data":[{"id":"b1"}],"page":1,"pageSize":20,"total":1}"#)
            }
        })
        .await;
        let orders =
            FakeUpstream::start(|_| Reply::json(StatusCode::OK, r#"[{"id":"o2"},{"id":"o1"}]"#))
                .await;

        let upstreams = upstreams(projects.base_url(), orders.base_url());
        let client = UpstreamClient::new(None);
        let body = aggregate_project(&client, &upstreams, "p1").await.unwrap();

        assert_eq!(
            body,
            json!({
                "project": {"id": "p1", "name": "Forest"},
                "batches": {"data": [{"id": "b1"}], "page": 1, "pageSize": 20, "total": 1},
                "lastOrders": [{"id": "o2"}, {"id": "o1"}],
            })
        );

        let mut paths: Vec<String> = projects
            .requests()
            .into_iter()
            .map(|r| r.path_and_query)
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["/batches?projectId=p1", "/projects/p1"]);
        assert_eq!(orders.requests()[0].path_and_query, "/orders?projectId=p1");
    }

    #[tokio::test]
    async fn test_failing_leg_fails_aggregate() {
        let projects = FakeUpstream::start(|req| {
            if req.path_and_query.starts_with("/batches") {
                Reply::text(StatusCode::SERVICE_UNAVAILABLE, "unavailable")
            } else {
                Reply::json(StatusCode::OK, r#"{"id":"p1"}"#)
            }
        })
        .await;
        let orders = FakeUpstream::start(|_| Reply::json(StatusCode::OK, "[]")).await;

        let upstreams = upstreams(projects.base_url(), orders.base_url());
        let err = aggregate_project(&UpstreamClient::new(None), &upstreams, "p1")
            .await
            .unwrap_err();

        assert_eq!(
            failure(&err),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "request failed with status code 503".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_first_failure_does_not_wait_for_slow_legs() {
        let projects = FakeUpstream::start(|req| {
            if req.path_and_query.starts_with("/batches") {
                Reply::json(StatusCode::SERVICE_UNAVAILABLE, r#"{"error":"down"}"#)
            } else {
                Reply::json(StatusCode::OK, r#"{"id":"p1"}"#)
            }
        })
        .await;
        let orders = FakeUpstream::start(|_| {
            Reply::json(StatusCode::OK, "[]").delayed(Duration::from_secs(3))
        })
        .await;

        let upstreams = upstreams(projects.base_url(), orders.base_url());
        let started = Instant::now();
        let err = aggregate_project(&UpstreamClient::new(None), &upstreams, "p1")
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(
            failure(&err),
            (StatusCode::SERVICE_UNAVAILABLE, "down".to_string())
        );
    }

    #[tokio::test]
    async fn test_downstream_error_message_is_used() {
        let projects = FakeUpstream::start(|req| {
            if req.path_and_query.starts_with("/projects/") {
                Reply::json(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#)
            } else {
                Reply::json(StatusCode::OK, "{}")
            }
        })
        .await;
        let orders = FakeUpstream::start(|_| Reply::json(StatusCode::OK, "[]")).await;

        let upstreams = upstreams(projects.base_url(), orders.base_url());
        let err = aggregate_project(&UpstreamClient::new(None), &upstreams, "missing")
            .await
            .unwrap_err();
        assert_eq!(
            failure(&err),
            (StatusCode::NOT_FOUND, "not found".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_leg_is_500() {
        let projects = FakeUpstream::start(|_| Reply::json(StatusCode::OK, "{}")).await;
        let upstreams = upstreams(projects.base_url(), unused_url().await);

        let err = aggregate_project(&UpstreamClient::new(None), &upstreams, "p1")
            .await
            .unwrap_err();
        let (status, message) = failure(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message.starts_with("Upstream request failed for 127.0.0.1"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_500() {
        let projects = FakeUpstream::start(|_| Reply::text(StatusCode::OK, "<html>")).await;
        let orders = FakeUpstream::start(|_| Reply::json(StatusCode::OK, "[]")).await;

        let upstreams = upstreams(projects.base_url(), orders.base_url());
        let err = aggregate_project(&UpstreamClient::new(None), &upstreams, "p1")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUpstreamJson(_, _)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_failure_fallback_message() {
        let err = GatewayError::UpstreamStatus {
            status: StatusCode::BAD_GATEWAY,
            message: String::new(),
        };
        assert_eq!(
            failure(&err),
            (StatusCode::BAD_GATEWAY, "aggregate failed".to_string())
        );
    }
}
