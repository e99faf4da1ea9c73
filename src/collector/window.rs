use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// 15 minutes of one-second samples.
pub const WINDOW_CAPACITY: usize = 900;

/// One successful sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Requests seen since the previous successful fetch.
    pub rate: u64,
    pub connections: u64,
}

/// Both series of the window, oldest first, always the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowSnapshot {
    #[serde(rename = "rps_last_15min")]
    pub rates: Vec<u64>,
    #[serde(rename = "cps_last_15min")]
    pub connections: Vec<u64>,
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Bounded FIFO of samples shared between the sampler and HTTP handlers.
///
/// Cloning yields another handle to the same window.
#[derive(Clone)]
pub struct RollingWindow {
    inner: Arc<RwLock<WindowInner>>,
    eviction_logged: Arc<AtomicBool>,
}

struct WindowInner {
    samples: VecDeque<Sample>,
    max_samples: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(WINDOW_CAPACITY)
    }
}

impl RollingWindow {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            inner: Arc::new(RwLock::new(WindowInner {
                samples: VecDeque::with_capacity(max_samples),
                max_samples,
            })),
            eviction_logged: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn push(&self, sample: Sample) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.samples.len() >= inner.max_samples {
            inner.samples.pop_front();
            if !self.eviction_logged.swap(true, Ordering::Relaxed) {
                tracing::info!(
                    "Window full, evicting oldest samples (max: {})",
                    inner.max_samples
                );
            }
        }
        inner.samples.push_back(sample);
    }

    /// Copies both series out under a single read lock.
    pub fn snapshot(&self) -> WindowSnapshot {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let (rates, connections) = inner
            .samples
            .iter()
            .map(|s| (s.rate, s.connections))
            .unzip();
        WindowSnapshot { rates, connections }
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .samples
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .max_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sample(n: u64) -> Sample {
        Sample {
            rate: n,
            connections: n * 10,
        }
    }

    #[test]
    fn default_window_holds_fifteen_minutes() {
        let window = RollingWindow::default();
        assert_eq!(window.capacity(), 900);
        assert!(window.is_empty());
        assert!(window.snapshot().is_empty());
    }

    #[test]
    fn keeps_last_900_in_order() {
        let window = RollingWindow::default();
        for n in 0..2000 {
            window.push(sample(n));
        }

        let snapshot = window.snapshot();
        assert_eq!(snapshot.len(), 900);
        assert_eq!(snapshot.connections.len(), 900);
        let expected: Vec<u64> = (1100..2000).collect();
        assert_eq!(snapshot.rates, expected);
        assert_eq!(
            snapshot.connections,
            expected.iter().map(|n| n * 10).collect::<Vec<_>>()
        );
    }

    #[test]
    fn append_at_capacity_drops_only_the_oldest() {
        let window = RollingWindow::default();
        for n in 0..900 {
            window.push(sample(n));
        }
        let before = window.snapshot();

        window.push(sample(5000));

        let after = window.snapshot();
        assert_eq!(after.len(), 900);
        assert_eq!(after.rates[..899], before.rates[1..]);
        assert_eq!(after.rates.last(), Some(&5000));
        assert_eq!(after.connections.last(), Some(&50000));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let window = RollingWindow::new(0);
        window.push(sample(1));
        window.push(sample(2));
        assert_eq!(window.snapshot().rates, vec![2]);
    }

    #[test]
    fn clones_share_storage() {
        let window = RollingWindow::new(4);
        let reader = window.clone();
        window.push(sample(1));
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn readers_never_see_uneven_series() {
        let window = RollingWindow::new(50);
        let writer = window.clone();

        let handle = thread::spawn(move || {
            for n in 0..5000 {
                writer.push(sample(n));
            }
        });

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let window = window.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snapshot = window.snapshot();
                        assert_eq!(snapshot.rates.len(), snapshot.connections.len());
                        assert!(snapshot.len() <= 50);
                        for (rate, conns) in snapshot.rates.iter().zip(&snapshot.connections) {
                            assert_eq!(rate * 10, *conns);
                        }
                        assert!(snapshot.rates.windows(2).all(|w| w[0] + 1 == w[1]));
                    }
                })
            })
            .collect();

        handle.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(window.len(), 50);
    }

    #[test]
    fn snapshot_serializes_with_dashboard_keys() {
        let window = RollingWindow::new(4);
        window.push(Sample {
            rate: 0,
            connections: 3,
        });
        window.push(Sample {
            rate: 40,
            connections: 5,
        });

        let json = serde_json::to_value(window.snapshot()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "rps_last_15min": [0, 40],
                "cps_last_15min": [3, 5],
            })
        );
    }
}
