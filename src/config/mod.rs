pub mod dashboard;

pub use dashboard::{DashboardConfig, FinancialsConfig, NewsConfig, ScoreField, TelemetryConfig};
