mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::*;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use vit_serve::config::ServerConfig;
use vit_serve::web::create_app;

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn metrics(app: &Router) -> Value {
    let (status, body) = send(app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn valid_jpeg_is_classified() {
    let app = app(state_with(StubBackend));

    let (status, body) = send(&app, predict_request("file", "photo.jpg", "image/jpeg", &jpeg_224())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["class"], "dog");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert!(body["inference_time"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn text_upload_fails_and_is_counted() {
    let app = app(state_with(StubBackend));

    let (status, body) =
        send(&app, predict_request("file", "notes.txt", "text/plain", b"just some text")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().unwrap().is_empty());

    let m = metrics(&app).await;
    assert_eq!(m["failed_requests"], 1);
    assert_eq!(m["total_requests"], 1);
}

#[tokio::test]
async fn metrics_reflect_mixed_outcomes() {
    let app = app(state_with(StubBackend));
    let jpeg = jpeg_224();

    for _ in 0..3 {
        let (status, _) = send(&app, predict_request("file", "a.jpg", "image/jpeg", &jpeg)).await;
        assert_eq!(status, StatusCode::OK);
    }
    for _ in 0..2 {
        let (status, _) = send(&app, predict_request("file", "a.bin", "application/octet-stream", b"\x00\x01\x02")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    let m = metrics(&app).await;
    assert_eq!(m["total_requests"], 5);
    assert_eq!(m["successful_requests"], 3);
    assert_eq!(m["failed_requests"], 2);
    assert!(m["average_inference_time"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn grayscale_png_is_accepted() {
    let app = app(state_with(StubBackend));

    let (status, body) = send(&app, predict_request("file", "gray.png", "image/png", &grayscale_png())).await;

    assert_eq!(status, StatusCode::OK);
    assert!(LABELS.contains(&body["class"].as_str().unwrap()));
}

#[tokio::test]
async fn empty_metrics_report_zero_average() {
    let app = app(state_with(StubBackend));

    let first = metrics(&app).await;
    let second = metrics(&app).await;

    assert_eq!(first, second);
    assert_eq!(first["total_requests"], 0);
    assert_eq!(first["average_inference_time"], 0.0);
}

#[tokio::test]
async fn inference_failure_maps_to_500() {
    let app = app(state_with(FailingBackend));

    let (status, body) = send(&app, predict_request("file", "photo.jpg", "image/jpeg", &jpeg_224())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("out of memory"));
    assert_eq!(metrics(&app).await["failed_requests"], 1);
}

#[tokio::test]
async fn missing_file_field_is_rejected_without_tracking() {
    let app = app(state_with(StubBackend));

    let (status, body) = send(&app, predict_request("image", "photo.jpg", "image/jpeg", &jpeg_224())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("file"));
    assert_eq!(metrics(&app).await["total_requests"], 0);
}

#[tokio::test]
async fn non_multipart_body_is_rejected() {
    let app = app(state_with(StubBackend));

    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(&app, req).await;

    assert!(status.is_client_error());
    assert!(body["detail"].is_string());
    assert_eq!(metrics(&app).await["total_requests"], 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = create_app(state_with(StubBackend), &ServerConfig { max_request_size: 1024 });
    let body = multipart_body("file", "photo.jpg", "image/jpeg", &jpeg_224());

    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(metrics(&app).await["total_requests"], 0);
}

#[tokio::test]
async fn prometheus_exposition_tracks_requests() {
    let app = app(state_with(StubBackend));
    send(&app, predict_request("file", "photo.jpg", "image/jpeg", &jpeg_224())).await;

    let response = app.clone().oneshot(get("/metrics/prometheus")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("model_requests_total 1"));
    assert!(text.contains("model_successful_requests_total 1"));
    assert!(text.contains("model_inference_time_seconds_count 1"));
}

#[tokio::test]
async fn health_and_info_endpoints() {
    let app = app(state_with(StubBackend));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, get("/api/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"]["model_name"], "stub-vit");
    assert_eq!(body["model"]["num_labels"], 3);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = app(state_with(StubBackend));

    let req = Request::builder()
        .uri("/metrics")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert!(!response.headers()["x-request-id"].is_empty());
}

#[tokio::test]
async fn concurrent_requests_keep_counts_consistent() {
    let app = app(state_with(StubBackend));
    let jpeg = jpeg_224();

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let app = app.clone();
            let data = if i % 2 == 0 { jpeg.clone() } else { b"garbage".to_vec() };
            tokio::spawn(async move {
                app.oneshot(predict_request("file", "x", "application/octet-stream", &data))
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let m = metrics(&app).await;
    assert_eq!(m["total_requests"], 10);
    assert_eq!(m["successful_requests"], 5);
    assert_eq!(m["failed_requests"], 5);
}

#[tokio::test]
async fn cancelled_request_is_counted_once_as_failure() {
    let app = app(state_with(SlowBackend(Duration::from_millis(500))));
    let req = predict_request("file", "photo.jpg", "image/jpeg", &jpeg_224());

    let outcome = tokio::time::timeout(Duration::from_millis(150), app.clone().oneshot(req)).await;
    assert!(outcome.is_err(), "request should still be running when cancelled");

    // 等待后台推理结束，确认不会再次记录
    tokio::time::sleep(Duration::from_millis(800)).await;

    let m = metrics(&app).await;
    assert_eq!(m["total_requests"], 1);
    assert_eq!(m["successful_requests"], 0);
    assert_eq!(m["failed_requests"], 1);
}

#[tokio::test]
async fn panicking_inference_returns_500_and_is_counted() {
    let app = app(state_with(PanickingBackend));

    let (status, body) = send(&app, predict_request("file", "photo.jpg", "image/jpeg", &jpeg_224())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().unwrap().is_empty());

    let m = metrics(&app).await;
    assert_eq!(m["total_requests"], 1);
    assert_eq!(m["failed_requests"], 1);
}
