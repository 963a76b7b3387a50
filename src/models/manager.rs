use crate::image::{ImagePreprocessor, PreprocessorConfig};
use crate::models::{ImageClassifier, ModelConfig, OnnxBackend, VitClassifier};
use crate::utils::error::ServeError;
use crate::{Config, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

/// 模型管理器：启动时创建一次，随路由状态共享
pub struct ModelManager {
    classifier: Arc<dyn ImageClassifier>,
    stats: ModelStats,
}

impl ModelManager {
    /// 从模型目录加载 ONNX 模型、标签表和预处理参数
    pub fn load(config: &Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let model_config = ModelConfig::load(&config.model_config_path())?;
        let labels = model_config.labels()?;
        tracing::info!("Loaded {} labels", labels.len());

        let preprocessor_config = PreprocessorConfig::load(&config.preprocessor_config_path())?;
        let preprocessor = ImagePreprocessor::new(preprocessor_config)?;
        let (input_height, input_width) = preprocessor.input_size();

        if let Some(image_size) = model_config.image_size {
            if image_size != input_height || image_size != input_width {
                tracing::warn!(
                    "Model image_size {} differs from preprocessor size {}x{}",
                    image_size,
                    input_width,
                    input_height
                );
            }
        }

        let backend = OnnxBackend::load(&config.model_path(), &config.onnx_config)?;
        let classifier = VitClassifier::new(backend, preprocessor, labels)?;

        let model_name = model_config.name_or_path.clone().unwrap_or_else(|| {
            config
                .models_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "vit".to_string())
        });

        let stats = ModelStats {
            model_name,
            num_labels: classifier.labels().len(),
            input_height,
            input_width,
            intra_threads: config.onnx_config.intra_threads,
            optimization_level: config.onnx_config.optimization_level,
        };

        let manager = Self::from_classifier(Arc::new(classifier), stats);
        manager.warm_up()?;

        tracing::info!("Model manager initialized successfully");
        Ok(manager)
    }

    pub fn from_classifier(classifier: Arc<dyn ImageClassifier>, stats: ModelStats) -> Self {
        Self { classifier, stats }
    }

    pub fn classifier(&self) -> Arc<dyn ImageClassifier> {
        Arc::clone(&self.classifier)
    }

    /// 模型健康检查
    pub fn health_check(&self) -> Result<()> {
        if self.classifier.labels().is_empty() {
            return Err(ServeError::ModelLoad("Classifier has no labels".to_string()));
        }

        tracing::debug!("Model health check passed");
        Ok(())
    }

    pub fn get_stats(&self) -> ModelStats {
        self.stats.clone()
    }

    /// 用一张空白图跑一次推理，尽早暴露模型与标签表不匹配的问题
    fn warm_up(&self) -> Result<()> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(self.stats.input_width, self.stats.input_height))
            .write_to(&mut buf, ImageFormat::Png)?;

        let result = self
            .classifier
            .predict(buf.get_ref())
            .map_err(|e| ServeError::ModelLoad(format!("Warm-up inference failed: {}", e)))?;

        tracing::info!("Warm-up inference took {:.3}s", result.inference_time);
        Ok(())
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model_name: String,
    pub num_labels: usize,
    pub input_height: u32,
    pub input_width: u32,
    pub intra_threads: usize,
    pub optimization_level: u8,
}
