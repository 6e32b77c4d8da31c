use crate::errors::GatewayError;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use shared::http::{add_via_header, error_chain, normalize_headers};
use std::time::Duration;
use url::Url;

/// Pooled client for upstream calls.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Option<Duration>,
}

impl UpstreamClient {
    pub fn new(timeout: Option<Duration>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }

    pub async fn send(
        &self,
        upstream_url: &Url,
        request: Request<Bytes>,
    ) -> Result<Response<Bytes>, GatewayError> {
        let (parts, body) = request.into_parts();
        let request = Request::from_parts(parts, Full::new(body));
        send_to_upstream(&self.client, upstream_url, request, self.timeout).await
    }
}

/// Send a request to `upstream_url` and collect the whole response.
///
/// The request's own URI is replaced by `upstream_url`, which must already
/// carry the path and query. Hop-by-hop and framing headers are dropped in
/// both directions and a Via header is added.
///
/// The optional timeout covers the whole exchange, including collecting the
/// response body, so this is not suitable for streaming responses.
pub async fn send_to_upstream<B>(
    client: &Client<HttpConnector, B>,
    upstream_url: &Url,
    request: Request<B>,
    timeout: Option<Duration>,
) -> Result<Response<Bytes>, GatewayError>
where
    B: hyper::body::Body + Send + Unpin + 'static,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    // Use host as identifier for error messages
    let upstream_identifier = upstream_url
        .host_str()
        .unwrap_or(upstream_url.as_str())
        .to_string();

    let upstream_uri: Uri = upstream_url
        .as_str()
        .parse()
        .map_err(|e| GatewayError::InternalError(format!("Invalid upstream URI: {e}")))?;

    let (mut parts, body) = request.into_parts();
    let request_version = parts.version;
    normalize_headers(&mut parts.headers, request_version);
    add_via_header(&mut parts.headers, request_version);

    let mut req_builder = Request::builder().method(parts.method).uri(upstream_uri);
    for (name, value) in parts.headers.iter() {
        req_builder = req_builder.header(name, value);
    }
    let upstream_request = req_builder
        .body(body)
        .map_err(|e| GatewayError::InternalError(format!("Failed to build request: {e}")))?;

    let exchange = async {
        let response = client.request(upstream_request).await.map_err(|e| {
            GatewayError::UpstreamRequestFailed(upstream_identifier.clone(), error_chain(&e))
        })?;

        let (mut parts, body) = response.into_parts();
        let response_version = parts.version;
        normalize_headers(&mut parts.headers, response_version);
        add_via_header(&mut parts.headers, response_version);

        let body_bytes = body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| GatewayError::ResponseBodyError(error_chain(&e)))?;

        Ok::<_, GatewayError>(Response::from_parts(parts, body_bytes))
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, exchange)
            .await
            .map_err(|_| GatewayError::UpstreamTimeout(upstream_identifier.clone()))?,
        None => exchange.await,
    }
}
