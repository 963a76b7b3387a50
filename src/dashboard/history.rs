use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// 吞吐量滑动窗口
pub const THROUGHPUT_WINDOW_SECS: i64 = 60;

/// 秒数转窗口长度，最小1秒；超出chrono范围时返回None
pub fn throughput_window(secs: i64) -> Option<Duration> {
    Duration::try_seconds(secs.max(1))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub inference_time: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    /// 历史记录中 inference_time 的平均值
    pub average_latency: f64,
}

/// 仅在会话内保存的历史记录，只追加
#[derive(Debug, Clone, Default)]
pub struct MetricsHistory {
    entries: Vec<MetricsHistoryEntry>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: MetricsHistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MetricsHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按请求序号排列的延迟序列
    pub fn latency_series(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.inference_time).collect()
    }

    /// 第i项 = 时间戳落在 [t_i - window, t_i] 内的记录数
    pub fn throughput_series(&self, window: Duration) -> Vec<usize> {
        self.entries
            .iter()
            .map(|current| {
                let window_start = current
                    .timestamp
                    .checked_sub_signed(window)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                self.entries
                    .iter()
                    .filter(|e| e.timestamp >= window_start && e.timestamp <= current.timestamp)
                    .count()
            })
            .collect()
    }

    pub fn summary(&self) -> Option<HistorySummary> {
        let last = self.entries.last()?;
        let latencies = self.latency_series();

        Some(HistorySummary {
            total_requests: last.total_requests,
            successful_requests: last.successful_requests,
            average_latency: latencies.iter().sum::<f64>() / latencies.len() as f64,
        })
    }
}
