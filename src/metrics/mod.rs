pub mod histogram;
pub mod tracker;

pub use histogram::LatencyHistogram;
pub use tracker::{MetricsSnapshot, MetricsTracker};
