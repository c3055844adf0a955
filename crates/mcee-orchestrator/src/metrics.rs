//! Per-tick processing-time ring buffer.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;

const CAPACITY: usize = 1000;

#[derive(Default)]
struct Inner {
    samples_ms: VecDeque<f64>,
}

#[derive(Clone)]
pub struct Metrics {
    inner: Arc<RwLock<Inner>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics { inner: Arc::new(RwLock::new(Inner::default())) }
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, elapsed_ms: f64) {
        let mut inner = self.inner.write().await;
        if inner.samples_ms.len() >= CAPACITY {
            inner.samples_ms.pop_front();
        }
        inner.samples_ms.push_back(elapsed_ms);
    }

    pub async fn average_ms(&self) -> f64 {
        let inner = self.inner.read().await;
        if inner.samples_ms.is_empty() {
            return 0.0;
        }
        inner.samples_ms.iter().sum::<f64>() / inner.samples_ms.len() as f64
    }

    pub async fn sample_count(&self) -> usize {
        self.inner.read().await.samples_ms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn average_is_exposed_on_query() {
        let metrics = Metrics::new();
        metrics.record(10.0).await;
        metrics.record(20.0).await;
        assert!((metrics.average_ms().await - 15.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn ring_buffer_drops_oldest_beyond_capacity() {
        let metrics = Metrics::new();
        for i in 0..1100 {
            metrics.record(i as f64).await;
        }
        assert_eq!(metrics.sample_count().await, 1000);
    }
}
