#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use ndarray::{Array2, Array4};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use vit_serve::config::ServerConfig;
use vit_serve::image::{ImagePreprocessor, PreprocessorConfig};
use vit_serve::models::{InferenceBackend, ModelManager, ModelStats, VitClassifier};
use vit_serve::web::{create_app, AppState};
use vit_serve::{Result, ServeError};

pub const LABELS: [&str; 3] = ["cat", "dog", "bird"];
pub const BOUNDARY: &str = "vitservetestboundary";

/// 固定logits，"dog"得分最高
pub struct StubBackend;

impl InferenceBackend for StubBackend {
    fn forward(&self, pixel_values: Array4<f32>) -> Result<Array2<f32>> {
        assert_eq!(pixel_values.shape(), &[1, 3, 224, 224]);
        Ok(Array2::from_shape_vec((1, 3), vec![0.5, 2.5, -1.0]).unwrap())
    }
}

/// 模拟推理阶段失败
pub struct FailingBackend;

impl InferenceBackend for FailingBackend {
    fn forward(&self, _pixel_values: Array4<f32>) -> Result<Array2<f32>> {
        Err(ServeError::Inference("out of memory".to_string()))
    }
}

/// 推理耗时较长，用于请求被取消的场景
pub struct SlowBackend(pub Duration);

impl InferenceBackend for SlowBackend {
    fn forward(&self, pixel_values: Array4<f32>) -> Result<Array2<f32>> {
        std::thread::sleep(self.0);
        StubBackend.forward(pixel_values)
    }
}

/// 推理线程panic
pub struct PanickingBackend;

impl InferenceBackend for PanickingBackend {
    fn forward(&self, _pixel_values: Array4<f32>) -> Result<Array2<f32>> {
        panic!("session crashed");
    }
}

pub fn state_with<B: InferenceBackend + 'static>(backend: B) -> AppState {
    let labels: Vec<String> = LABELS.iter().map(|s| s.to_string()).collect();
    let classifier = VitClassifier::new(
        backend,
        ImagePreprocessor::new(PreprocessorConfig::default()).unwrap(),
        labels,
    )
    .unwrap();

    let stats = ModelStats {
        model_name: "stub-vit".to_string(),
        num_labels: LABELS.len(),
        input_height: 224,
        input_width: 224,
        intra_threads: 1,
        optimization_level: 3,
    };

    AppState::new(ModelManager::from_classifier(Arc::new(classifier), stats))
}

pub fn app(state: AppState) -> Router {
    create_app(state, &ServerConfig { max_request_size: 10 * 1024 * 1024 })
}

pub fn jpeg_224() -> Vec<u8> {
    let img = RgbImage::from_fn(224, 224, |x, y| Rgb([x as u8, y as u8, 128]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

pub fn grayscale_png() -> Vec<u8> {
    let img = GrayImage::from_fn(64, 48, |x, _| Luma([(x * 4) as u8]));
    encode(DynamicImage::ImageLuma8(img), ImageFormat::Png)
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn predict_request(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, file_name, content_type, data)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
