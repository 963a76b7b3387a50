use crate::dashboard::{MetricsHistory, MetricsHistoryEntry};
use crate::metrics::MetricsSnapshot;
use crate::web::handlers::PredictionResponse;
use image::ImageFormat;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {detail}")]
    Server { status: u16, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 仪表盘客户端：每次分类 = 一次上传 + 一次指标拉取 + 一条历史记录
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
    history: MetricsHistory,
}

impl DashboardClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DashboardError> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            history: MetricsHistory::new(),
        })
    }

    pub fn history(&self) -> &MetricsHistory {
        &self.history
    }

    /// 读取文件并分类
    pub async fn classify_file(&mut self, path: &Path) -> Result<PredictionResponse, DashboardError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        self.classify(&file_name, bytes).await
    }

    /// 上传并拉取指标；任一步失败都不追加历史记录
    pub async fn classify(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<PredictionResponse, DashboardError> {
        let prediction = self.predict(file_name, bytes).await?;
        let metrics = self.fetch_metrics().await?;

        self.history.push(MetricsHistoryEntry {
            timestamp: chrono::Utc::now(),
            inference_time: prediction.inference_time,
            total_requests: metrics.total_requests,
            successful_requests: metrics.successful_requests,
        });

        Ok(prediction)
    }

    pub async fn predict(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<PredictionResponse, DashboardError> {
        let mime = ImageFormat::from_path(file_name)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");

        let part = Part::bytes(bytes).file_name(file_name.to_string()).mime_str(mime)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/predict", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::decode(response).await
    }

    pub async fn fetch_metrics(&self) -> Result<MetricsSnapshot, DashboardError> {
        let response = self
            .http
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DashboardError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or(body);

        Err(DashboardError::Server {
            status: status.as_u16(),
            detail,
        })
    }
}
