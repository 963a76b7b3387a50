use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vit_serve::{config::Config, web::serve};

#[derive(Parser)]
#[command(name = "vit-serve")]
#[command(about = "ViT image classification service with request metrics")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Model directory (model.onnx, config.json, preprocessor_config.json)
    #[arg(long, default_value = "models/vit")]
    models_dir: String,

    /// Number of tokio worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// ONNX Runtime intra-op threads
    #[arg(long)]
    intra_threads: Option<usize>,

    /// Maximum request body size in bytes
    #[arg(long)]
    max_request_size: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting ViT classification service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Models directory: {}", args.models_dir);

    let config = Config::new(
        args.bind,
        args.models_dir,
        args.workers,
        args.intra_threads,
        args.max_request_size,
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))?;

    Ok(())
}
