use crate::web::extractors::{RequestId, REQUEST_ID_HEADER};
use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// 请求日志中间件，同时分配/透传请求ID
pub async fn request_logging(mut req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = RequestId::from_headers(req.headers());

    let start_time = Instant::now();

    tracing::debug!("Request started: {} {} - request_id={}", method, uri, request_id.0);

    req.extensions_mut().insert(request_id.clone());
    let mut response = next.run(req).await;

    let duration = start_time.elapsed();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    tracing::info!(
        "Request completed: {} {} - {} - {:.3}ms - request_id={}",
        method,
        uri,
        status,
        duration.as_secs_f64() * 1000.0,
        request_id.0
    );

    response
}
