use crate::collector::PrometheusMetrics;
use crate::collector::window::{RollingWindow, Sample};
use crate::error::Result;
use crate::source::StatusSource;
use crate::status::StatusSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pause after a successful cycle.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
/// Pause after a failed cycle.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// How a new counter reading relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// No earlier reading to difference against.
    First,
    Counted(u64),
    /// The counter went backwards, most likely an upstream restart.
    CounterReset { previous: u64 },
}

impl Delta {
    pub fn rate(self) -> u64 {
        match self {
            Delta::Counted(n) => n,
            Delta::First | Delta::CounterReset { .. } => 0,
        }
    }
}

/// Last cumulative request count seen by a successful fetch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    previous: Option<u64>,
}

impl Baseline {
    pub fn get(&self) -> Option<u64> {
        self.previous
    }

    /// Differences `current` against the stored reading and always
    /// re-baselines on `current`.
    pub fn advance(&mut self, current: u64) -> Delta {
        let delta = match self.previous {
            None => Delta::First,
            Some(previous) if current < previous => Delta::CounterReset { previous },
            Some(previous) => Delta::Counted(current - previous),
        };
        self.previous = Some(current);
        delta
    }
}

pub struct Sampler<S> {
    source: S,
    window: RollingWindow,
    metrics: Arc<PrometheusMetrics>,
    baseline: Baseline,
}

impl<S: StatusSource> Sampler<S> {
    pub fn new(source: S, window: RollingWindow, metrics: Arc<PrometheusMetrics>) -> Self {
        Self {
            source,
            window,
            metrics,
            baseline: Baseline::default(),
        }
    }

    pub fn baseline(&self) -> Option<u64> {
        self.baseline.get()
    }

    /// One fetch, parse, derive and append cycle.
    ///
    /// On error neither the window nor the baseline is touched.
    pub async fn poll_once(&mut self) -> Result<Sample> {
        let body = self.source.fetch().await?;
        let status = StatusSnapshot::parse(&body)?;

        let delta = self.baseline.advance(status.cumulative_requests);
        if let Delta::CounterReset { previous } = delta {
            tracing::warn!(
                "Request counter went backwards ({} -> {}), re-baselining",
                previous,
                status.cumulative_requests
            );
            self.metrics.counter_resets.inc();
        }

        let sample = Sample {
            rate: delta.rate(),
            connections: status.active_connections,
        };
        self.window.push(sample);
        self.metrics.update(&status, &sample, self.window.len());

        Ok(sample)
    }

    /// Samples until `cancel` fires. Failures are logged and retried after
    /// [`RETRY_BACKOFF`]; there is no retry limit.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let pause = match self.poll_once().await {
                Ok(sample) => {
                    tracing::debug!(
                        "Sampled {} requests, {} connections",
                        sample.rate,
                        sample.connections
                    );
                    SAMPLE_INTERVAL
                }
                Err(e) => {
                    self.metrics.record_failure(&e);
                    tracing::warn!(
                        "Failed to sample status: {}. Retrying in {:?}",
                        e,
                        RETRY_BACKOFF
                    );
                    RETRY_BACKOFF
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = cancel.cancelled() => {
                    tracing::info!("Sampler stopping");
                    return;
                }
            }
        }
    }
}
