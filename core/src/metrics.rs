use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/**
    A single named counter a [`MetricsSink`] hands back for mutation.
*/
pub trait Counter {
    fn inc(&self, delta: u64);
}

/**
    Observability seam for the primitive operations the envelope performs
    on the expensive path: `rsa.sign`, `rsa.encrypt`, `rsa.decrypt`,
    `rsa.verify`. The core never assumes a particular metrics backend;
    callers that don't care can use [`NullMetricsSink`].
*/
pub trait MetricsSink: Send + Sync {
    fn counter(&self, name: &str) -> Box<dyn Counter + '_>;
}

/**
    A sink that discards every increment.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricsSink;

struct NullCounter;

impl Counter for NullCounter {
    fn inc(&self, _delta: u64) {}
}

impl MetricsSink for NullMetricsSink {
    fn counter(&self, _name: &str) -> Box<dyn Counter + '_> {
        Box::new(NullCounter)
    }
}

/**
    An in-memory sink backed by atomic counters, useful for tests and for
    callers that want to inspect operation counts directly rather than
    exporting to an external metrics system.
*/
#[derive(Default)]
pub struct AtomicMetricsSink {
    counters: Mutex<HashMap<String, AtomicU64>>,
}

impl AtomicMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the named counter (0 if it was never incremented).
    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

struct AtomicCounterHandle<'a> {
    name: String,
    sink: &'a AtomicMetricsSink,
}

impl Counter for AtomicCounterHandle<'_> {
    fn inc(&self, delta: u64) {
        let mut counters = self.sink.counters.lock().unwrap();
        counters
            .entry(self.name.clone())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(delta, Ordering::Relaxed);
    }
}

impl MetricsSink for AtomicMetricsSink {
    fn counter(&self, name: &str) -> Box<dyn Counter + '_> {
        Box::new(AtomicCounterHandle {
            name: name.to_owned(),
            sink: self,
        })
    }
}
