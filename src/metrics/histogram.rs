use std::time::Duration;

/// Prometheus默认桶上限（秒）
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// 耗时累加器：直接维护 sum / count 和累积桶计数
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyHistogram {
    bounds: Vec<f64>,
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::with_buckets(&DEFAULT_BUCKETS)
    }
}

impl LatencyHistogram {
    /// `bounds` 需升序
    pub fn with_buckets(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.to_vec(),
            buckets: vec![0; bounds.len()],
            sum: 0.0,
            count: 0,
        }
    }

    pub fn observe(&mut self, duration: Duration) {
        let secs = duration.as_secs_f64();

        self.sum += secs;
        self.count += 1;

        for (bound, bucket) in self.bounds.iter().zip(self.buckets.iter_mut()) {
            if secs <= *bound {
                *bucket += 1;
            }
        }
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// 平均值；无样本时为0
    pub fn mean(&self) -> f64 {
        self.sum / self.count.max(1) as f64
    }

    /// (上限, 累积计数)
    pub fn buckets(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.bounds.iter().copied().zip(self.buckets.iter().copied())
    }
}
