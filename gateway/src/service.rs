use crate::aggregate::{self, aggregate_project};
use crate::config::{Config, Upstreams};
use crate::errors::GatewayError;
use crate::http::UpstreamClient;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT, UPSTREAM_FAILURES};
use crate::proxy::{Entity, Event, proxy_entity, proxy_event};
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::service::TowerToHyperService;
use serde_json::json;
use shared::cors::cors_layer;
use shared::http::{json_response, make_error_response};
use shared::routing::{Route, RouteActions};
use shared::{counter, gauge, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Service, ServiceBuilder};
use tower_http::cors::Cors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Health,
    Aggregate,
    Collection(Entity),
    Item(Entity),
    Event(Event),
}

impl Action {
    /// Route label used in logs and metrics.
    fn as_str(&self) -> &'static str {
        match self {
            Action::Health => "healthz",
            Action::Aggregate => "aggregate",
            Action::Collection(Entity::Projects) => "projects",
            Action::Collection(Entity::Batches) => "batches",
            Action::Collection(Entity::Orders) => "orders",
            Action::Item(Entity::Projects) => "projects.item",
            Action::Item(Entity::Batches) => "batches.item",
            Action::Item(Entity::Orders) => "orders.item",
            Action::Event(Event::Ingest) => "events.ingest",
            Action::Event(Event::Receipt) => "events.receipt",
        }
    }
}

fn route_table() -> RouteActions<Action> {
    let mut routes = vec![
        Route::new(Some(Method::GET), "/healthz", Action::Health),
        Route::new(Some(Method::GET), "/aggregate/project/{id}", Action::Aggregate),
        Route::new(
            Some(Method::POST),
            "/events/ingest",
            Action::Event(Event::Ingest),
        ),
        Route::new(
            Some(Method::POST),
            "/events/receipt",
            Action::Event(Event::Receipt),
        ),
    ];

    for entity in [Entity::Projects, Entity::Batches, Entity::Orders] {
        let collection = format!("/{}", entity.as_str());
        let item = format!("/{}/{{id}}", entity.as_str());
        for method in [Method::GET, Method::POST] {
            routes.push(Route::new(
                Some(method),
                &collection,
                Action::Collection(entity),
            ));
        }
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            routes.push(Route::new(Some(method), &item, Action::Item(entity)));
        }
    }

    RouteActions::new(routes)
}

#[derive(Clone)]
pub struct GatewayService {
    inner: Arc<Inner>,
}

struct Inner {
    upstreams: Upstreams,
    client: UpstreamClient,
    routes: RouteActions<Action>,
}

impl GatewayService {
    pub fn new(config: &Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                upstreams: config.upstreams.clone(),
                client: UpstreamClient::new(config.upstream_timeout()),
                routes: route_table(),
            }),
        }
    }
}

/// The gateway as hyper serves it: route handling behind the CORS policy.
pub type HttpService = TowerToHyperService<Cors<GatewayService>>;

pub fn http_service(config: &Config) -> HttpService {
    TowerToHyperService::new(
        ServiceBuilder::new()
            .layer(cors_layer())
            .service(GatewayService::new(config)),
    )
}

impl<B> Service<Request<B>> for GatewayService
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            let response = inner.handle(req).await;
            Ok(response.map(|body| Full::new(body).map_err(|e| match e {}).boxed()))
        })
    }
}

impl Inner {
    async fn handle<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        gauge!(REQUESTS_INFLIGHT).increment(1.0);

        let (route, response) = match self.resolve(&req) {
            Some((action, id)) => {
                let response = match self.dispatch(action, id, req).await {
                    Ok(response) => response,
                    Err(e) => {
                        counter!(UPSTREAM_FAILURES, "route" => action.as_str()).increment(1);
                        tracing::error!(route = action.as_str(), error = %e, "request failed");
                        make_error_response(e.status(), &e.to_string())
                    }
                };
                (action.as_str(), response)
            }
            None => (
                "unmatched",
                make_error_response(StatusCode::NOT_FOUND, "not found"),
            ),
        };

        let status = response.status();
        let elapsed = start.elapsed();
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
        histogram!(
            REQUEST_DURATION,
            "route" => route,
            "status" => status.as_u16().to_string()
        )
        .record(elapsed.as_secs_f64());
        tracing::info!(%method, %path, route, status = status.as_u16(), ?elapsed, "request");

        response
    }

    fn resolve<B>(&self, req: &Request<B>) -> Option<(Action, Option<String>)> {
        let route_match = self.routes.resolve(req)?;
        Some((*route_match.action, route_match.param("id").map(String::from)))
    }

    async fn dispatch<B>(
        &self,
        action: Action,
        id: Option<String>,
        req: Request<B>,
    ) -> Result<Response<Bytes>, GatewayError>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        match action {
            Action::Health => Ok(json_response(
                StatusCode::OK,
                &json!({"status": "ok", "service": "bff"}),
            )),
            Action::Aggregate => {
                let id = id.ok_or_else(|| {
                    GatewayError::InternalError("route matched without an id".into())
                })?;
                match aggregate_project(&self.client, &self.upstreams, &id).await {
                    Ok(body) => Ok(json_response(StatusCode::OK, &body)),
                    Err(e) => {
                        let (status, message) = aggregate::failure(&e);
                        Ok(make_error_response(status, &message))
                    }
                }
            }
            Action::Collection(entity) | Action::Item(entity) => {
                let request = collect_request(req).await?;
                proxy_entity(&self.client, &self.upstreams, entity, id.as_deref(), request).await
            }
            Action::Event(event) => {
                let request = collect_request(req).await?;
                proxy_event(&self.client, &self.upstreams, event, request).await
            }
        }
    }
}

async fn collect_request<B>(req: Request<B>) -> Result<Request<Bytes>, GatewayError>
where
    B: Body<Data = Bytes>,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let (parts, body) = req.into_parts();
    let bytes = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| GatewayError::RequestBodyError(e.to_string()))?;
    Ok(Request::from_parts(parts, bytes))
}
