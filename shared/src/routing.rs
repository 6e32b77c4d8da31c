use http::Method;
use std::collections::HashMap;

#[derive(Debug)]
enum PathSegment {
    Static(String),
    Param(String),
}

#[derive(Debug)]
struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Parses a path pattern string into a Path struct
    /// Supports:
    /// - Static segments: "/projects"
    /// - Dynamic parameters: "/projects/{id}"
    pub fn parse(path_str: &str) -> Self {
        let normalized_path = path_str.trim().trim_matches('/');

        let segments: Vec<PathSegment> = if normalized_path.is_empty() {
            vec![]
        } else {
            normalized_path
                .split('/')
                .map(|s| {
                    if let Some(stripped) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                        PathSegment::Param(stripped.to_string())
                    } else {
                        PathSegment::Static(s.to_string())
                    }
                })
                .collect()
        };

        Path { segments }
    }

    /// Matches a request path against this path pattern.
    /// Returns the percent-decoded parameters if the match succeeds.
    fn matches(&self, request_path: &str) -> Option<HashMap<String, String>> {
        let normalized_path = request_path.trim().trim_matches('/');

        let request_segments: Vec<&str> = if normalized_path.is_empty() {
            vec![]
        } else {
            normalized_path.split('/').collect()
        };

        if request_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (seg, req_segment) in self.segments.iter().zip(request_segments) {
            match seg {
                PathSegment::Static(s) => {
                    if req_segment != s {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    // an empty segment (e.g. "/projects//x") never binds a parameter
                    if req_segment.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), percent_decode(req_segment));
                }
            }
        }

        Some(params)
    }
}

#[derive(Debug, PartialEq)]
pub struct RouteMatch<'a, A> {
    pub params: HashMap<String, String>,
    pub action: &'a A,
}

impl<A> RouteMatch<'_, A> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug)]
pub struct Route<A> {
    method: Option<Method>,
    path: Path,
    action: A,
}

impl<A> Route<A> {
    /// Creates a new Route. A route without a method matches every method.
    pub fn new(method: Option<Method>, path: &str, action: A) -> Self {
        Self {
            method,
            path: Path::parse(path),
            action,
        }
    }

    /// Returns Some(RouteMatch) if the request matches this route, None otherwise.
    /// Trailing slash normalization is applied to incoming requests.
    pub fn matches<'a>(
        &'a self,
        request_method: &Method,
        request_path: &str,
    ) -> Option<RouteMatch<'a, A>> {
        if self
            .method
            .as_ref()
            .is_some_and(|method| method != request_method)
        {
            return None;
        }

        let params = self.path.matches(request_path)?;
        Some(RouteMatch {
            params,
            action: &self.action,
        })
    }
}

pub struct RouteActions<A> {
    routes: Vec<Route<A>>,
}

impl<A> RouteActions<A> {
    pub fn new(routes: Vec<Route<A>>) -> Self {
        Self { routes }
    }

    /// Matches the incoming request to a route, and returns the first matched route if any.
    pub fn resolve<B>(&self, request: &http::Request<B>) -> Option<RouteMatch<'_, A>> {
        let method = request.method();
        let path = request.uri().path();

        self.routes
            .iter()
            .find_map(|route| route.matches(method, path))
    }
}

/// Decodes `%XX` escapes in a path segment. Invalid escapes are kept as-is
/// and invalid UTF-8 is replaced.
pub fn percent_decode(segment: &str) -> String {
    fn hex_value(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            decoded.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
