//! One-to-one relays to the stores and the event functions.
//!
//! Non-success answers are passed through untouched. Successful answers keep
//! their body but get the gateway's own status for creates, deletes and events.

use crate::config::Upstreams;
use crate::errors::GatewayError;
use crate::http::UpstreamClient;
use http::header::CONTENT_TYPE;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::upstream_url;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Projects,
    Batches,
    Orders,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Projects => "projects",
            Entity::Batches => "batches",
            Entity::Orders => "orders",
        }
    }

    fn base<'a>(&self, upstreams: &'a Upstreams) -> &'a Url {
        match self {
            Entity::Projects | Entity::Batches => &upstreams.projects,
            Entity::Orders => &upstreams.orders,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Ingest,
    Receipt,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Ingest => "ingest",
            Event::Receipt => "receipt",
        }
    }

    fn url<'a>(&self, upstreams: &'a Upstreams) -> &'a Url {
        match self {
            Event::Ingest => &upstreams.ingest,
            Event::Receipt => &upstreams.receipt,
        }
    }
}

/// Relays `/{entity}` or `/{entity}/{id}` with the raw query string and body.
pub async fn proxy_entity(
    client: &UpstreamClient,
    upstreams: &Upstreams,
    entity: Entity,
    id: Option<&str>,
    request: Request<Bytes>,
) -> Result<Response<Bytes>, GatewayError> {
    let mut url = match id {
        Some(id) => upstream_url(entity.base(upstreams), &[entity.as_str(), id]),
        None => upstream_url(entity.base(upstreams), &[entity.as_str()]),
    };
    url.set_query(request.uri().query());

    let method = request.method().clone();
    let response = client.send(&url, request).await?;
    if !response.status().is_success() {
        return Ok(response);
    }

    let response = match method {
        Method::POST => with_status(response, StatusCode::CREATED),
        Method::DELETE => {
            let (mut parts, _) = response.into_parts();
            parts.status = StatusCode::NO_CONTENT;
            parts.headers.remove(CONTENT_TYPE);
            Response::from_parts(parts, Bytes::new())
        }
        _ => response,
    };
    Ok(response)
}

/// Forwards the body to the function endpoint; success becomes 202.
pub async fn proxy_event(
    client: &UpstreamClient,
    upstreams: &Upstreams,
    event: Event,
    request: Request<Bytes>,
) -> Result<Response<Bytes>, GatewayError> {
    let response = client.send(event.url(upstreams), request).await?;
    if !response.status().is_success() {
        return Ok(response);
    }
    Ok(with_status(response, StatusCode::ACCEPTED))
}

fn with_status(mut response: Response<Bytes>, status: StatusCode) -> Response<Bytes> {
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{FakeUpstream, Reply, unused_url};

    fn upstreams(base: Url) -> Upstreams {
        let mut ingest = base.clone();
        ingest.set_path("/api/ingest-credit");
        let mut receipt = base.clone();
        receipt.set_path("/api/receipt-hook");
        Upstreams {
            projects: base.clone(),
            orders: base,
            ingest,
            receipt,
        }
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_becomes_created() {
        let upstream =
            FakeUpstream::start(|_| Reply::json(StatusCode::OK, r#"{"id":"abc","name":"A"}"#)).await;
        let upstreams = upstreams(upstream.base_url());

        let response = proxy_entity(
            &UpstreamClient::new(None),
            &upstreams,
            Entity::Projects,
            None,
            request(Method::POST, "/projects", r#"{"name":"A"}"#),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body().as_ref(), br#"{"id":"abc","name":"A"}"#);

        let seen = &upstream.requests()[0];
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.path_and_query, "/projects");
        assert_eq!(seen.body, br#"{"name":"A"}"#);
    }

    #[tokio::test]
    async fn test_query_and_id_forwarded() {
        let upstream = FakeUpstream::start(|_| Reply::json(StatusCode::OK, "[]")).await;
        let upstreams = upstreams(upstream.base_url());
        let client = UpstreamClient::new(None);

        proxy_entity(
            &client,
            &upstreams,
            Entity::Orders,
            None,
            request(Method::GET, "/orders?projectId=p1&status=PAID", ""),
        )
        .await
        .unwrap();
        proxy_entity(
            &client,
            &upstreams,
            Entity::Batches,
            Some("b 1"),
            request(Method::PUT, "/batches/b%201", r#"{"status":"SOLD"}"#),
        )
        .await
        .unwrap();

        let seen = upstream.requests();
        assert_eq!(seen[0].path_and_query, "/orders?projectId=p1&status=PAID");
        assert_eq!(seen[1].method, "PUT");
        assert_eq!(seen[1].path_and_query, "/batches/b%201");
    }

    #[tokio::test]
    async fn test_delete_becomes_no_content() {
        let upstream = FakeUpstream::start(|_| Reply::json(StatusCode::OK, r#"{"deleted":1}"#)).await;
        let upstreams = upstreams(upstream.base_url());

        let response = proxy_entity(
            &UpstreamClient::new(None),
            &upstreams,
            Entity::Orders,
            Some("o1"),
            request(Method::DELETE, "/orders/o1", ""),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_failure_relayed_unchanged() {
        let upstream =
            FakeUpstream::start(|_| Reply::json(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#))
                .await;
        let upstreams = upstreams(upstream.base_url());

        for method in [Method::GET, Method::DELETE, Method::POST] {
            let response = proxy_entity(
                &UpstreamClient::new(None),
                &upstreams,
                Entity::Projects,
                Some("65f1a2b3c4d5e6f7a8b9c0d1"),
                request(method, "/projects/65f1a2b3c4d5e6f7a8b9c0d1", ""),
            )
            .await
            .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(response.body().as_ref(), br#"{"error":"not found"}"#);
        }
    }

    #[tokio::test]
    async fn test_event_accepted() {
        let upstream = FakeUpstream::start(|_| Reply::json(StatusCode::OK, r#"{"ok":true}"#)).await;
        let upstreams = upstreams(upstream.base_url());

        let response = proxy_event(
            &UpstreamClient::new(None),
            &upstreams,
            Event::Receipt,
            request(Method::POST, "/events/receipt", r#"{"orderId":"o1"}"#),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
        let seen = &upstream.requests()[0];
        assert_eq!(seen.path_and_query, "/api/receipt-hook");
        assert_eq!(seen.json(), serde_json::json!({"orderId": "o1"}));
    }

    #[tokio::test]
    async fn test_event_transport_failure() {
        let upstreams = upstreams(unused_url().await);
        let err = proxy_event(
            &UpstreamClient::new(None),
            &upstreams,
            Event::Ingest,
            request(Method::POST, "/events/ingest", "{}"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
