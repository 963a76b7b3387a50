pub mod config;
pub mod dashboard;
pub mod image;
pub mod metrics;
pub mod models;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use metrics::{MetricsSnapshot, MetricsTracker};
pub use models::{ClassificationResult, ImageClassifier};
pub use utils::error::ServeError;

pub type Result<T> = std::result::Result<T, ServeError>;
