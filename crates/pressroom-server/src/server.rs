use std::net::SocketAddr;

use axum::{Router, middleware, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tracing::{error, info};

use crate::handlers::{
    content::get_content, health::health_check, invalidate::cache_action,
    metrics::metrics_handler,
};
use crate::middleware::{LoggingLayer, RequestIdLayer};
use crate::state::AppState;

fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/cache", get(cache_action).post(cache_action))
        .route("/content/{group}/{item}", get(get_content))
        .with_state(state)
}

fn with_middleware(router: Router) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    router
        .layer(middleware::from_fn(
            crate::metrics::http::http_metrics_middleware,
        ))
        .layer(middleware_stack)
}

/// Creates a router with the given application state and metrics handle.
pub fn create_router_with_state(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    // Router for metrics endpoint (different state)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    with_middleware(Router::new().merge(app_routes(state)).merge(metrics_router))
}

/// Creates a router without the `/metrics` endpoint.
pub fn create_router(state: AppState) -> Router {
    with_middleware(app_routes(state))
}

/// Runs the server until a shutdown signal arrives.
///
/// Background refreshes are drained by the caller after this returns.
pub async fn run_server_with_state(
    addr: SocketAddr,
    state: AppState,
    prometheus_handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = create_router_with_state(state, prometheus_handle);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
