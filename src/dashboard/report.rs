use crate::dashboard::MetricsHistory;
use chrono::Duration;
use std::fmt::Write;

/// 文本形式输出延迟序列、吞吐量序列和汇总
pub fn render(history: &MetricsHistory, window: Duration) -> String {
    let mut out = String::new();

    let Some(summary) = history.summary() else {
        let _ = writeln!(out, "No requests recorded yet.");
        return out;
    };

    let latencies = history.latency_series();
    let throughput = history.throughput_series(window);

    let _ = writeln!(
        out,
        "{:>4}  {:<20}  {:>12}  {:>16}",
        "#", "timestamp", "latency (s)", "requests/window"
    );
    for (i, entry) in history.entries().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<20}  {:>12.3}  {:>16}",
            i,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            latencies[i],
            throughput[i]
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total requests:      {}", summary.total_requests);
    let _ = writeln!(out, "Successful requests: {}", summary.successful_requests);
    let _ = writeln!(out, "Average latency:     {:.3}s", summary.average_latency);

    out
}
