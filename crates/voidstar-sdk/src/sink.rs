//! Record sinks: where emitted records go.
//!
//! A [`Sink`] delivers one tagged JSON record at a time and reports
//! whether delivery is currently possible.  The SDK ships four:
//!
//! | Sink | Used when |
//! |------|-----------|
//! | [`VoidstarSink`](crate::native::VoidstarSink) | the platform's native library loads |
//! | [`LocalSink`](crate::local::LocalSink) | a local output file is configured |
//! | [`NoopSink`] | neither is available |
//! | [`MemorySink`] | tests and embedders that want to inspect records |
//!
//! Sinks swallow their own delivery failures.  Nothing here returns an
//! error to an assertion call site.

use crate::lock;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Capability to deliver tagged records to the outside world.
pub trait Sink: Send + Sync {
    /// `true` if records would currently be dropped.
    fn is_emit_disabled(&self) -> bool;

    /// Deliver one record under `tag`.  Best effort.
    fn emit_json(&self, tag: &str, value: &Value);

    fn flush(&self) {}

    /// A platform-chosen random value, if this sink can supply one.
    fn random_u64(&self) -> Option<u64> {
        None
    }

    /// Label subsequent records with `name`.
    fn set_source_name(&self, _name: &str) {}
}

// ═══════════════════════════════════════════════════════════════════════
//  Serialized access
// ═══════════════════════════════════════════════════════════════════════

/// A sink plus the lock that serializes every call into it.
///
/// Sinks are not assumed to be reentrant; one call completes before the
/// next begins.
pub struct SinkHandle {
    sink: Arc<dyn Sink>,
    serial: Mutex<()>,
}

impl SinkHandle {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            serial: Mutex::new(()),
        }
    }

    pub fn is_emit_disabled(&self) -> bool {
        let _serial = lock(&self.serial);
        self.sink.is_emit_disabled()
    }

    /// Deliver `value` under `tag` unless the sink is disabled.
    ///
    /// Returns `true` if the record was handed to the sink.
    pub fn emit(&self, tag: &str, value: &Value) -> bool {
        let _serial = lock(&self.serial);
        if self.sink.is_emit_disabled() {
            return false;
        }
        self.sink.emit_json(tag, value);
        true
    }

    /// Serialize `record` and [`emit`](Self::emit) it.
    ///
    /// A record that fails to serialize is logged and dropped.
    pub fn emit_serialized<T: Serialize>(&self, tag: &str, record: &T) -> bool {
        match serde_json::to_value(record) {
            Ok(value) => self.emit(tag, &value),
            Err(e) => {
                log::error!("voidstar-sdk: dropping {tag} record: {e}");
                false
            }
        }
    }

    pub fn flush(&self) {
        let _serial = lock(&self.serial);
        self.sink.flush();
    }

    pub fn random_u64(&self) -> Option<u64> {
        let _serial = lock(&self.serial);
        self.sink.random_u64()
    }

    pub fn set_source_name(&self, name: &str) {
        let _serial = lock(&self.serial);
        self.sink.set_source_name(name);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  No-op
// ═══════════════════════════════════════════════════════════════════════

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn is_emit_disabled(&self) -> bool {
        true
    }

    fn emit_json(&self, _tag: &str, _value: &Value) {}
}

// ═══════════════════════════════════════════════════════════════════════
//  In-memory capture
// ═══════════════════════════════════════════════════════════════════════

/// Keeps every delivered record in memory.
///
/// Delivery can be switched off and on at runtime with
/// [`set_enabled`](Self::set_enabled).
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, Value)>>,
    disabled: AtomicBool,
    source_name: Mutex<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.disabled.store(!enabled, Ordering::SeqCst);
    }

    /// All delivered records, oldest first.
    pub fn records(&self) -> Vec<(String, Value)> {
        lock(&self.records).clone()
    }

    /// Payloads delivered under `tag`, oldest first.
    pub fn tagged(&self, tag: &str) -> Vec<Value> {
        lock(&self.records)
            .iter()
            .filter(|(t, _)| t == tag)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn source_name(&self) -> String {
        lock(&self.source_name).clone()
    }
}

impl Sink for MemorySink {
    fn is_emit_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    fn emit_json(&self, tag: &str, value: &Value) {
        lock(&self.records).push((tag.to_owned(), value.clone()));
    }

    fn set_source_name(&self, name: &str) {
        *lock(&self.source_name) = name.to_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handle_delivers_when_enabled() {
        let sink = Arc::new(MemorySink::new());
        let handle = SinkHandle::new(sink.clone());
        assert!(handle.emit("event", &json!({"n": 1})));
        assert_eq!(sink.records(), vec![("event".to_string(), json!({"n": 1}))]);
    }

    #[test]
    fn handle_skips_disabled_sink() {
        let sink = Arc::new(MemorySink::new());
        sink.set_enabled(false);
        let handle = SinkHandle::new(sink.clone());
        assert!(handle.is_emit_disabled());
        assert!(!handle.emit("event", &json!(null)));
        assert!(sink.is_empty());
    }

    #[test]
    fn noop_is_always_disabled() {
        let handle = SinkHandle::new(Arc::new(NoopSink));
        assert!(handle.is_emit_disabled());
        assert!(!handle.emit("event", &json!(1)));
        assert_eq!(handle.random_u64(), None);
    }

    #[test]
    fn emit_serialized_uses_serde() {
        #[derive(Serialize)]
        struct Ping {
            seq: u32,
        }

        let sink = Arc::new(MemorySink::new());
        let handle = SinkHandle::new(sink.clone());
        assert!(handle.emit_serialized("ping", &Ping { seq: 7 }));
        assert_eq!(sink.tagged("ping"), vec![json!({"seq": 7})]);
    }

    #[test]
    fn source_name_reaches_sink() {
        let sink = Arc::new(MemorySink::new());
        let handle = SinkHandle::new(sink.clone());
        handle.set_source_name("worker-3");
        assert_eq!(sink.source_name(), "worker-3");
    }
}
