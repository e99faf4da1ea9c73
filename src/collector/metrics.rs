use crate::collector::window::Sample;
use crate::error::StatusError;
use crate::status::{ConnectionStates, StatusSnapshot};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

fn as_gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: String,
}

impl OutcomeLabels {
    fn new(outcome: &str) -> Self {
        Self {
            outcome: outcome.to_string(),
        }
    }
}

#[derive(Default)]
pub struct PrometheusMetrics {
    pub active_connections: Gauge,
    pub requests_per_interval: Gauge,
    pub reading: Gauge,
    pub writing: Gauge,
    pub waiting: Gauge,
    pub window_samples: Gauge,
    pub fetches: Family<OutcomeLabels, Counter>,
    pub counter_resets: Counter,
}

impl PrometheusMetrics {
    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "nginx_active_connections",
            "Active client connections at the last successful fetch",
            self.active_connections.clone(),
        );
        registry.register(
            "nginx_requests_per_interval",
            "Requests served between the last two successful fetches",
            self.requests_per_interval.clone(),
        );
        registry.register(
            "nginx_connections_reading",
            "Connections reading the request header",
            self.reading.clone(),
        );
        registry.register(
            "nginx_connections_writing",
            "Connections writing the response",
            self.writing.clone(),
        );
        registry.register(
            "nginx_connections_waiting",
            "Idle keep-alive connections",
            self.waiting.clone(),
        );
        registry.register(
            "nginx_window_samples",
            "Samples currently held in the rolling window",
            self.window_samples.clone(),
        );
        registry.register(
            "nginx_status_fetches",
            "Status fetch attempts by outcome",
            self.fetches.clone(),
        );
        registry.register(
            "nginx_counter_resets",
            "Times the upstream request counter went backwards",
            self.counter_resets.clone(),
        );
    }

    pub fn update(&self, status: &StatusSnapshot, sample: &Sample, retained: usize) {
        self.fetches.get_or_create(&OutcomeLabels::new("ok")).inc();
        self.active_connections.set(as_gauge(status.active_connections));
        self.requests_per_interval.set(as_gauge(sample.rate));
        // No fourth line means no breakdown for this report.
        let states = status.states.unwrap_or(ConnectionStates {
            reading: 0,
            writing: 0,
            waiting: 0,
        });
        self.reading.set(as_gauge(states.reading));
        self.writing.set(as_gauge(states.writing));
        self.waiting.set(as_gauge(states.waiting));
        self.window_samples.set(as_gauge(retained as u64));
    }

    pub fn record_failure(&self, err: &StatusError) {
        let outcome = if err.is_transient() {
            "unreachable"
        } else {
            "malformed"
        };
        self.fetches.get_or_create(&OutcomeLabels::new(outcome)).inc();
    }
}
