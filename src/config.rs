use anyhow::{ensure, Result};
use std::path::PathBuf;

/// 默认请求体上限：50MB
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型目录（model.onnx / config.json / preprocessor_config.json）
    pub models_dir: PathBuf,

    /// tokio工作线程数量
    pub workers: usize,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 图优化级别 (0-3)
    pub optimization_level: u8,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        workers: Option<usize>,
        intra_threads: Option<usize>,
        max_request_size: Option<usize>,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        ensure!(workers > 0, "workers must be at least 1");

        let onnx_config = OnnxConfig {
            intra_threads: intra_threads.unwrap_or((cpu_cores * 3 / 4).max(1)), // 默认使用75%的CPU核心
            optimization_level: 3,
        };
        ensure!(onnx_config.intra_threads > 0, "intra-threads must be at least 1");

        let server_config = ServerConfig {
            max_request_size: max_request_size.unwrap_or(DEFAULT_MAX_REQUEST_SIZE),
        };
        ensure!(server_config.max_request_size > 0, "max request size must be positive");

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            workers,
            onnx_config,
            server_config,
        })
    }

    /// ONNX模型文件路径
    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join("model.onnx")
    }

    /// 模型配置（id2label）路径
    pub fn model_config_path(&self) -> PathBuf {
        self.models_dir.join("config.json")
    }

    /// 预处理配置路径
    pub fn preprocessor_config_path(&self) -> PathBuf {
        self.models_dir.join("preprocessor_config.json")
    }
}
