use crate::metrics::LatencyHistogram;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;

/// GET /metrics 的返回体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_inference_time: f64,
}

#[derive(Debug, Default)]
struct MetricsState {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    inference_time: LatencyHistogram,
}

/// 进程内请求指标。一次 `track_request` 在同一把锁内完成，
/// 快照总是满足 total == successful + failed == histogram count。
#[derive(Debug, Default)]
pub struct MetricsTracker {
    state: Mutex<MetricsState>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_request(&self, duration: Duration, success: bool) {
        let mut state = self.state.lock();

        state.inference_time.observe(duration);
        state.total_requests += 1;
        if success {
            state.successful_requests += 1;
        } else {
            state.failed_requests += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.lock();

        MetricsSnapshot {
            total_requests: state.total_requests,
            successful_requests: state.successful_requests,
            failed_requests: state.failed_requests,
            average_inference_time: state.inference_time.mean(),
        }
    }

    /// Prometheus文本格式
    pub fn render_prometheus(&self) -> String {
        let state = self.state.lock();
        let hist = &state.inference_time;
        let mut out = String::new();

        let _ = writeln!(out, "# HELP model_inference_time_seconds Time spent processing each request");
        let _ = writeln!(out, "# TYPE model_inference_time_seconds histogram");
        for (le, count) in hist.buckets() {
            let _ = writeln!(out, "model_inference_time_seconds_bucket{{le=\"{}\"}} {}", le, count);
        }
        let _ = writeln!(out, "model_inference_time_seconds_bucket{{le=\"+Inf\"}} {}", hist.count());
        let _ = writeln!(out, "model_inference_time_seconds_sum {}", hist.sum());
        let _ = writeln!(out, "model_inference_time_seconds_count {}", hist.count());

        render_counter(&mut out, "model_requests_total", "Total number of requests processed", state.total_requests);
        render_counter(&mut out, "model_successful_requests_total", "Number of successful requests", state.successful_requests);
        render_counter(&mut out, "model_failed_requests_total", "Number of failed requests", state.failed_requests);

        out
    }
}

fn render_counter(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} counter", name);
    let _ = writeln!(out, "{} {}", name, value);
}
