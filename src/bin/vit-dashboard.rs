use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use vit_serve::dashboard::{report, throughput_window, DashboardClient, THROUGHPUT_WINDOW_SECS};

#[derive(Parser)]
#[command(name = "vit-dashboard")]
#[command(about = "Classify images against a vit-serve instance and track its metrics")]
struct Args {
    /// Base URL of the classification service
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Sliding window for the throughput series, in seconds
    #[arg(long, default_value_t = THROUGHPUT_WINDOW_SECS)]
    window: i64,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Images to classify; read one path per line from stdin when omitted
    images: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let window = throughput_window(args.window)
        .ok_or_else(|| anyhow!("--window {} is out of range", args.window))?;
    let mut client = DashboardClient::new(&args.server)?;

    if !args.images.is_empty() {
        for path in &args.images {
            classify(&mut client, path, window).await;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        classify(&mut client, Path::new(line), window).await;
    }

    Ok(())
}

/// 单次分类；失败只提示，不中断会话
async fn classify(client: &mut DashboardClient, path: &Path, window: chrono::Duration) {
    match client.classify_file(path).await {
        Ok(prediction) => {
            println!("{}", path.display());
            println!("  Predicted Class: {}", prediction.class);
            println!("  Confidence:      {:.2}%", prediction.confidence * 100.0);
            println!("  Inference Time:  {:.3} seconds", prediction.inference_time);
        }
        Err(e) => {
            tracing::error!("Classification of {} failed: {}", path.display(), e);
            eprintln!("Error during prediction for {}: {}", path.display(), e);
        }
    }

    println!();
    print!("{}", report::render(client.history(), window));
    println!();
}
