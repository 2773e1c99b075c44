//! Downstream notification sinks.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

/// Receiver for accepted changes, notified synchronously in apply order.
///
/// The store calls the sink inside its write critical section, so
/// delivery order is exactly apply order. The flip side is documented:
/// a sink that blocks indefinitely stalls the writer. Sinks that need
/// buffering should hand off internally.
pub trait EventSink: Send + Sync {
    fn handle_put(&self, key: &str, value: &[u8]);
    fn handle_delete(&self, key: &str);
}

/// Ordered fan-out over registered sinks.
///
/// Listener registration as an explicit contract: every notification is
/// delivered to each registered sink in registration order. `SinkSet`
/// is itself an [`EventSink`], so it plugs into the store's single sink
/// slot.
#[derive(Default)]
pub struct SinkSet {
    sinks: RwLock<Vec<Box<dyn EventSink>>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink. Later registrations are notified later.
    pub fn register(&self, sink: Box<dyn EventSink>) {
        self.sinks.write().push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }
}

impl EventSink for SinkSet {
    fn handle_put(&self, key: &str, value: &[u8]) {
        for sink in self.sinks.read().iter() {
            sink.handle_put(key, value);
        }
    }

    fn handle_delete(&self, key: &str) {
        for sink in self.sinks.read().iter() {
            sink.handle_delete(key);
        }
    }
}

/// A plain key-value mirror of everything the store accepts.
///
/// Useful as a downstream replica in demos and as an order-insensitive
/// assertion target in tests.
#[derive(Default)]
pub struct MirrorSink {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MirrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl EventSink for MirrorSink {
    fn handle_put(&self, key: &str, value: &[u8]) {
        self.entries.lock().insert(key.to_string(), value.to_vec());
    }

    fn handle_delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}
