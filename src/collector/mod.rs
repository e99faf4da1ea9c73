pub mod metrics;
pub mod sampler;
pub mod server;
pub mod window;

pub use metrics::PrometheusMetrics;
pub use sampler::{Baseline, Delta, Sampler};
pub use server::{AppState, MetricsServer};
pub use window::{RollingWindow, Sample, WindowSnapshot};
