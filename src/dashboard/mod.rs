pub mod client;
pub mod history;
pub mod report;

pub use client::{DashboardClient, DashboardError};
pub use history::{
    throughput_window, HistorySummary, MetricsHistory, MetricsHistoryEntry, THROUGHPUT_WINDOW_SECS,
};
