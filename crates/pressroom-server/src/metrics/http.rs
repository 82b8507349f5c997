//! HTTP metrics middleware.

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use std::time::Instant;

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Middleware que registra metricas HTTP para cada request.
///
/// Requests are labelled by route template (`/content/{group}/{item}`), not
/// by concrete path.
pub async fn http_metrics_middleware(
    matched_path: Option<MatchedPath>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().as_str().to_owned();
    let route = matched_path
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let response = next.run(request).await;

    counter!(
        "pressroom_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);

    histogram!(
        "pressroom_http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Registra las metricas HTTP
pub fn register_http_metrics() {
    metrics::describe_counter!(
        "pressroom_http_requests_total",
        "Total number of HTTP requests by route and status"
    );
    metrics::describe_histogram!(
        "pressroom_http_request_duration_seconds",
        "HTTP request duration in seconds, including upstream fetches on cache misses"
    );
}
