use crate::image::{ImageLoader, ImagePreprocessor};
use crate::utils::error::ServeError;
use crate::Result;
use ndarray::{Array2, Array4};
use serde::Serialize;
use std::time::Instant;

/// 单次分类结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: String,
    /// softmax概率 [0, 1]
    pub confidence: f64,
    /// 解码+推理耗时（秒）
    pub inference_time: f64,
}

/// 模型前向计算：输入 [1, 3, H, W]，输出 logits [1, num_labels]
pub trait InferenceBackend: Send + Sync {
    fn forward(&self, pixel_values: Array4<f32>) -> Result<Array2<f32>>;
}

/// 处理器依赖的分类器抽象
pub trait ImageClassifier: Send + Sync {
    fn predict(&self, image_bytes: &[u8]) -> Result<ClassificationResult>;

    fn labels(&self) -> &[String];
}

pub struct VitClassifier<B> {
    backend: B,
    preprocessor: ImagePreprocessor,
    labels: Vec<String>,
}

impl<B: InferenceBackend> VitClassifier<B> {
    pub fn new(backend: B, preprocessor: ImagePreprocessor, labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(ServeError::ModelLoad("Label vocabulary is empty".to_string()));
        }

        Ok(Self { backend, preprocessor, labels })
    }

    /// 从logits中选出类别及其概率
    fn select(&self, logits: &Array2<f32>) -> Result<(usize, f64)> {
        let (batch_size, num_classes) = logits.dim();

        if batch_size != 1 {
            return Err(ServeError::Inference(format!(
                "Expected batch size 1, got {}",
                batch_size
            )));
        }
        if num_classes != self.labels.len() {
            return Err(ServeError::Inference(format!(
                "Model produced {} logits but the label vocabulary has {} entries",
                num_classes,
                self.labels.len()
            )));
        }

        let row: Vec<f32> = logits.row(0).to_vec();
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ServeError::Inference("Model produced non-finite logits".to_string()));
        }

        let index = argmax(&row)
            .ok_or_else(|| ServeError::Inference("Model produced no logits".to_string()))?;
        let probs = softmax(&row);

        Ok((index, probs[index]))
    }
}

impl<B: InferenceBackend> ImageClassifier for VitClassifier<B> {
    fn predict(&self, image_bytes: &[u8]) -> Result<ClassificationResult> {
        let start_time = Instant::now();

        let image = ImageLoader::from_bytes(image_bytes)?;
        let pixel_values = self.preprocessor.preprocess(image)?;

        let logits = self.backend.forward(pixel_values)?;
        let (index, confidence) = self.select(&logits)?;

        let inference_time = start_time.elapsed().as_secs_f64();

        tracing::debug!(
            "Classified image: label={}, index={}, confidence={:.4}, time={:.3}s",
            self.labels[index],
            index,
            confidence,
            inference_time
        );

        Ok(ClassificationResult {
            label: self.labels[index].clone(),
            confidence,
            inference_time,
        })
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// 最大值下标，相同值取第一个
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, max)) if v <= max => {}
            _ => best = Some((i, v)),
        }
    }

    best.map(|(i, _)| i)
}

/// 数值稳定的softmax
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&v| (v as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}
