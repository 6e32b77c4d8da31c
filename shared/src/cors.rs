//! Cross-origin policy shared by every service: browsers on any origin may
//! call us with the usual methods and whatever headers they ask for.

use http::Method;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}
