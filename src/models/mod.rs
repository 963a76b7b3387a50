pub mod classifier;
pub mod config;
pub mod manager;
pub mod onnx;

pub use classifier::{ClassificationResult, ImageClassifier, InferenceBackend, VitClassifier};
pub use config::ModelConfig;
pub use manager::{ModelManager, ModelStats};
pub use onnx::OnnxBackend;
