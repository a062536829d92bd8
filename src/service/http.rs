//! HTTP API for the matchmaking service
//!
//! Exposes the pool and engine operations, a health endpoint, and the
//! Prometheus metrics exposition using Axum.

use crate::error::MatchPoolError;
use crate::metrics::MetricsCollector;
use crate::service::app::MatchmakingService;
use crate::types::GamerRecord;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind the API server to
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared state for the API server
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<MatchmakingService>,
    pub metrics: Arc<MetricsCollector>,
}

/// HTTP server exposing the matchmaking API
pub struct ApiServer {
    config: ApiServerConfig,
    state: ApiState,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(
        config: ApiServerConfig,
        service: Arc<MatchmakingService>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: ApiState { service, metrics },
            shutdown_tx,
        }
    }

    /// Start serving requests; returns when shut down
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid API server address")?;

        let app = create_router(self.state.clone());
        let listener = TcpListener::bind(addr).await?;

        info!("API server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API server shutdown signal received");
            })
            .await?;

        info!("API server stopped");
        Ok(())
    }

    /// Stop the API server
    pub fn stop(&self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to API server: {}", e);
        }
    }
}

/// Create the Axum router with all API endpoints
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/gamer", post(create_gamer_handler))
        .route("/gamer/{name}", delete(delete_gamer_handler))
        .route("/groups", get(list_groups_handler))
        .route("/groups/reset", get(reset_groups_handler))
        .route("/groups/{number}", get(group_stats_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Inbound payload for gamer creation; the server stamps the join time
#[derive(Debug, Deserialize)]
struct CreateGamerRequest {
    name: String,
    skill: f64,
    latency: f64,
}

/// Map a service error to an HTTP response
fn error_response(error: anyhow::Error) -> Response {
    let status = match error.downcast_ref::<MatchPoolError>() {
        Some(MatchPoolError::GamerNotFound { .. }) => StatusCode::NOT_FOUND,
        Some(MatchPoolError::MalformedGamer { .. }) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", error);
    }

    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

async fn create_gamer_handler(
    State(state): State<ApiState>,
    Json(request): Json<CreateGamerRequest>,
) -> Response {
    debug!("Create gamer request for '{}'", request.name);

    let record = GamerRecord::new(request.name, request.skill, request.latency);
    match state.service.add_gamer(record.clone()).await {
        Ok(()) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_gamer_handler(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Response {
    debug!("Delete gamer request for '{}'", name);

    match state.service.delete_gamer(&name).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_groups_handler(State(state): State<ApiState>) -> Response {
    debug!("List groups request");

    match state.service.list_groups().await {
        Ok(groups) => Json(groups).into_response(),
        Err(e) => error_response(e),
    }
}

async fn reset_groups_handler(State(state): State<ApiState>) -> Response {
    debug!("Reset groups request");

    match state.service.reset_groups() {
        Ok(groups) => Json(groups).into_response(),
        Err(e) => error_response(e),
    }
}

async fn group_stats_handler(
    State(state): State<ApiState>,
    Path(number): Path<usize>,
) -> Response {
    debug!("Statistics request for group {}", number);

    match state.service.group_stats(number) {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => error_response(e),
    }
}

async fn health_handler(State(state): State<ApiState>) -> Response {
    let pool_size = state.service.pool_size().unwrap_or(0);
    let groups = state
        .service
        .get_groups()
        .map(|groups| groups.len())
        .unwrap_or(0);

    Json(json!({
        "status": "healthy",
        "service": "match-pool",
        "version": env!("CARGO_PKG_VERSION"),
        "pool_size": pool_size,
        "groups": groups,
        "persistence": state.service.persistence_enabled(),
    }))
    .into_response()
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<ApiState>) -> Response {
    let registry = state.metrics.registry();
    let metric_families = registry.gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => Response::builder()
            .status(StatusCode::OK)
            .header("content-type", encoder.format_type())
            .body(metrics_output.into())
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MatchEngine;
    use crate::pool::GamerPool;
    use crate::types::{Group, GroupStatistics};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let pool = Arc::new(GamerPool::new());
        let engine = Arc::new(MatchEngine::new(2));
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let service = Arc::new(MatchmakingService::new(pool, engine, metrics.clone()));
        create_router(ApiState { service, metrics })
    }

    fn post_gamer(name: &str, skill: f64, latency: f64) -> Request<Body> {
        let payload = json!({ "name": name, "skill": skill, "latency": latency });
        Request::builder()
            .method("POST")
            .uri("/gamer")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_gamer_returns_created() {
        let app = test_router();

        let response = app.oneshot(post_gamer("alice", 10.0, 5.0)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["name"], "alice");
        assert!(body["connected_at"].is_string());
    }

    #[tokio::test]
    async fn test_create_gamer_rejects_empty_name() {
        let app = test_router();

        let response = app.oneshot(post_gamer("", 10.0, 5.0)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_unknown_gamer_returns_not_found() {
        let app = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/gamer/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_groups_workflow_over_http() {
        let app = test_router();

        for (name, skill, latency) in
            [("alice", 10.0, 5.0), ("bob", 12.0, 6.0), ("carol", 50.0, 40.0)]
        {
            let response = app
                .clone()
                .oneshot(post_gamer(name, skill, latency))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/groups").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let groups: Vec<Group> =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].number, 0);
        assert_eq!(groups[0].len(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_group_stats_is_zeroed_object() {
        let app = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/groups/42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stats: GroupStatistics =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(stats, GroupStatistics::default());
    }

    #[tokio::test]
    async fn test_non_numeric_group_path_is_bad_request() {
        let app = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/groups/not-a-number")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_prometheus_text() {
        let app = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoint_reports_pool_state() {
        let app = test_router();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["pool_size"], 0);
    }
}
