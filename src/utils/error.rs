use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServeError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            // 解码失败与推理失败统一按500返回
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServeError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            ServeError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            ServeError::Inference(_) => "INFERENCE_ERROR",
            ServeError::InvalidInput(_) => "INVALID_INPUT",
            ServeError::Config(_) => "CONFIG_ERROR",
            ServeError::Io(_) => "IO_ERROR",
            ServeError::Json(_) => "JSON_ERROR",
            ServeError::Ort(_) => "ORT_ERROR",
            ServeError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "detail": self.to_string() });

        tracing::error!("Request failed: {} ({}, {})", self, self.error_code(), status);

        (status, axum::Json(body)).into_response()
    }
}
