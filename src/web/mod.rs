pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{
    config::ServerConfig,
    metrics::MetricsTracker,
    models::ModelManager,
    utils::error::ServeError,
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

/// 路由共享状态，进程启动时创建一次
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelManager>,
    pub metrics: Arc<MetricsTracker>,
}

impl AppState {
    pub fn new(models: ModelManager) -> Self {
        Self {
            models: Arc::new(models),
            metrics: Arc::new(MetricsTracker::new()),
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    let models = ModelManager::load(&config)?;
    let state = AppState::new(models);

    let app = create_app(state, &config.server_config);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ServeError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict            - Multipart image classification");
    tracing::info!("  GET  /metrics            - Request metrics (JSON)");
    tracing::info!("  GET  /metrics/prometheus - Request metrics (Prometheus)");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  GET  /api/info          - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ServeError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServeError::Internal(format!("Server failed: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

pub fn create_app(state: AppState, server_config: &ServerConfig) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/metrics/prometheus", get(handlers::prometheus_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        // multipart默认2MB上限，改由RequestBodyLimitLayer统一控制
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.models.health_check()?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "ViT Image Classification Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": state.models.get_stats(),
    }))
}
