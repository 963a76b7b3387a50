use crate::{
    metrics::{MetricsSnapshot, MetricsTracker},
    models::ClassificationResult,
    utils::error::ServeError,
    web::{
        extractors::{ImageUpload, RequestId},
        AppState,
    },
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// POST /predict 成功返回体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub class: String,
    pub confidence: f64,
    pub inference_time: f64,
}

impl From<ClassificationResult> for PredictionResponse {
    fn from(result: ClassificationResult) -> Self {
        Self {
            class: result.label,
            confidence: result.confidence,
            inference_time: result.inference_time,
        }
    }
}

/// 预测失败：无论原因一律500 + {"detail"}
#[derive(Debug)]
pub struct PredictionFailure(pub ServeError);

impl IntoResponse for PredictionFailure {
    fn into_response(self) -> Response {
        tracing::error!("Prediction failed: {} ({})", self.0, self.0.error_code());

        let body = serde_json::json!({ "detail": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// 每个请求恰好记录一次指标；drop时记录，覆盖请求被中途取消的情况
struct TrackedRequest {
    metrics: Arc<MetricsTracker>,
    start_time: Instant,
    success: bool,
}

impl TrackedRequest {
    fn start(metrics: Arc<MetricsTracker>) -> Self {
        Self {
            metrics,
            start_time: Instant::now(),
            success: false,
        }
    }

    fn succeed(&mut self) {
        self.success = true;
    }
}

impl Drop for TrackedRequest {
    fn drop(&mut self) {
        self.metrics
            .track_request(self.start_time.elapsed(), self.success);
    }
}

/// Multipart图像分类处理器
pub async fn predict_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    upload: ImageUpload,
) -> Result<Json<PredictionResponse>, PredictionFailure> {
    let mut tracked = TrackedRequest::start(Arc::clone(&state.metrics));

    tracing::info!(
        "Processing prediction request: request_id={}, file={:?}, bytes={}",
        request_id,
        upload.file_name,
        upload.data.len()
    );

    let classifier = state.models.classifier();
    let data = upload.data;

    // 推理是CPU密集的同步调用，放到阻塞线程池
    let outcome = tokio::task::spawn_blocking(move || classifier.predict(&data))
        .await
        .map_err(|e| ServeError::Internal(format!("Inference task failed: {}", e)))
        .and_then(|result| result);

    match outcome {
        Ok(result) => {
            tracked.succeed();
            drop(tracked);

            tracing::info!(
                "Prediction completed: request_id={}, class={}, confidence={:.4}, time={:.3}s",
                request_id,
                result.label,
                result.confidence,
                result.inference_time
            );

            Ok(Json(PredictionResponse::from(result)))
        }
        Err(e) => {
            drop(tracked);
            Err(PredictionFailure(e))
        }
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub async fn prometheus_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render_prometheus(),
    )
}
