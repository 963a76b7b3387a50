use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// multipart 上传中的 `file` 字段
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[async_trait]
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = UploadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| UploadRejection::new(e.status(), e.body_text()))?;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            UploadRejection::new(e.status(), format!("Failed to read multipart field: {}", e.body_text()))
        })? {
            if field.name() != Some("file") {
                tracing::debug!("Ignoring unknown field: {:?}", field.name());
                continue;
            }

            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            // 不校验content-type，交给解码器判断
            let data = field.bytes().await.map_err(|e| {
                UploadRejection::new(e.status(), format!("Failed to read file data: {}", e.body_text()))
            })?;

            tracing::debug!(
                "Received file: name={:?}, content_type={:?}, {} bytes",
                file_name,
                content_type,
                data.len()
            );

            return Ok(ImageUpload { file_name, content_type, data });
        }

        Err(UploadRejection::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Missing multipart field 'file'".to_string(),
        ))
    }
}

/// 上传解析失败，在处理器之前返回，不计入指标
#[derive(Debug)]
pub struct UploadRejection {
    status: StatusCode,
    detail: String,
}

impl UploadRejection {
    pub fn new(status: StatusCode, detail: String) -> Self {
        Self { status, detail }
    }
}

impl IntoResponse for UploadRejection {
    fn into_response(self) -> Response {
        tracing::warn!("Upload rejected: {} ({})", self.detail, self.status);

        let body = serde_json::json!({ "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}

/// 请求ID：优先取中间件写入的扩展，其次取请求头，否则新生成
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<RequestId>() {
            return Ok(id.clone());
        }

        Ok(RequestId::from_headers(&parts.headers))
    }
}

impl RequestId {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        RequestId(id)
    }
}
