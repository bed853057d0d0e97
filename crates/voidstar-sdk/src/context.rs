//! The SDK context: one sink, one assertion catalog.
//!
//! The process-wide context comes from [`global`](crate::global).  Tests
//! and embedders create isolated contexts with [`Sdk::with_sink`] or
//! [`Sdk::from_config`]; each has its own catalog, so first-occurrence
//! tracking in one never affects another.

use crate::assert::AssertKind;
use crate::config::SdkConfig;
use crate::internal::{select_sink, TransportMode};
use crate::location::resolve_caller;
use crate::sink::{Sink, SinkHandle};
use crate::tracker::AssertTracker;
use serde_json::{json, Value};
use std::sync::Arc;
use voidstar_protocol::{
    AssertType, AssertionRecord, CallSiteLocation, COLUMN_UNKNOWN, SETUP_COMPLETE, SETUP_TAG,
};

/// A sink plus the assertion catalog that reports through it.
///
/// Only constructed through [`Sdk::with_sink`], [`Sdk::from_config`], or
/// [`global`](crate::global), all of which hand out an `Arc`.
pub struct Sdk {
    sink: Arc<SinkHandle>,
    tracker: AssertTracker,
    mode: TransportMode,
}

impl Sdk {
    /// Isolated context that reports to `sink`.
    pub fn with_sink(sink: Arc<dyn Sink>) -> Arc<Self> {
        Self::build(sink, TransportMode::Custom)
    }

    /// Isolated context using the transport `config` selects.
    pub fn from_config(config: &SdkConfig) -> Arc<Self> {
        let (sink, mode) = select_sink(config);
        if let Some(name) = &config.source_name {
            sink.set_source_name(name);
        }
        Self::build(sink, mode)
    }

    fn build(sink: Arc<dyn Sink>, mode: TransportMode) -> Arc<Self> {
        let sink = Arc::new(SinkHandle::new(sink));
        Arc::new(Self {
            tracker: AssertTracker::new(Arc::clone(&sink)),
            sink,
            mode,
        })
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn tracker(&self) -> &AssertTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &SinkHandle {
        &self.sink
    }

    // ── Assertions ──────────────────────────────────────────────

    /// See [`assert::always`](crate::assert::always).
    #[track_caller]
    pub fn always(&self, condition: bool, message: &str, details: &Value) {
        self.assert_at(resolve_caller(), AssertKind::Always, condition, message, details);
    }

    /// See [`assert::always_or_unreachable`](crate::assert::always_or_unreachable).
    #[track_caller]
    pub fn always_or_unreachable(&self, condition: bool, message: &str, details: &Value) {
        self.assert_at(
            resolve_caller(),
            AssertKind::AlwaysOrUnreachable,
            condition,
            message,
            details,
        );
    }

    /// See [`assert::sometimes`](crate::assert::sometimes).
    #[track_caller]
    pub fn sometimes(&self, condition: bool, message: &str, details: &Value) {
        self.assert_at(resolve_caller(), AssertKind::Sometimes, condition, message, details);
    }

    /// See [`assert::reachable`](crate::assert::reachable).
    #[track_caller]
    pub fn reachable(&self, message: &str, details: &Value) {
        self.assert_at(resolve_caller(), AssertKind::Reachable, true, message, details);
    }

    /// See [`assert::unreachable`](crate::assert::unreachable).
    #[track_caller]
    pub fn unreachable(&self, message: &str, details: &Value) {
        self.assert_at(resolve_caller(), AssertKind::Unreachable, true, message, details);
    }

    /// Evaluate an assertion of `kind` at an explicit location.
    ///
    /// Returns `true` if a record was emitted.
    pub fn assert_at(
        &self,
        location: CallSiteLocation,
        kind: AssertKind,
        condition: bool,
        message: &str,
        details: &Value,
    ) -> bool {
        self.evaluate(
            location,
            condition,
            message,
            details,
            true,
            kind.must_hit(),
            kind.expecting(),
            kind.assert_type(),
        )
    }

    /// Unwrapped assertion entry point for tooling that already knows the
    /// location and flags.  The column is always [`COLUMN_UNKNOWN`].
    #[allow(clippy::too_many_arguments)]
    pub fn assert_raw(
        &self,
        condition: bool,
        message: &str,
        details: &Value,
        classname: &str,
        function: &str,
        filename: &str,
        line: u32,
        hit: bool,
        must_hit: bool,
        expecting: bool,
        assert_type: AssertType,
    ) -> bool {
        let location = CallSiteLocation::new(classname, function, filename, line, COLUMN_UNKNOWN);
        self.evaluate(
            location,
            condition,
            message,
            details,
            hit,
            must_hit,
            expecting,
            assert_type,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        location: CallSiteLocation,
        condition: bool,
        message: &str,
        details: &Value,
        hit: bool,
        must_hit: bool,
        expecting: bool,
        assert_type: AssertType,
    ) -> bool {
        let id = location.key();
        let entry = self.tracker.get_or_create_entry(&id);
        let record = AssertionRecord {
            hit,
            must_hit,
            assert_type,
            expecting,
            category: String::new(),
            message: message.to_owned(),
            condition,
            id,
            location,
            details: details.clone(),
        };
        self.tracker.record_evaluation(&entry, &record)
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// See [`lifecycle::setup_complete`](crate::lifecycle::setup_complete).
    pub fn setup_complete(&self) {
        self.sink.emit(SETUP_TAG, &json!(SETUP_COMPLETE));
    }

    /// See [`lifecycle::send_event`](crate::lifecycle::send_event).
    pub fn send_event(&self, name: &str, details: &Value) {
        self.sink.emit(name, details);
    }

    pub fn set_source_name(&self, name: &str) {
        self.sink.set_source_name(name);
    }

    // ── Randomness ──────────────────────────────────────────────

    /// See [`random::get_random`](crate::random::get_random).
    pub fn get_random(&self) -> u64 {
        self.sink.random_u64().unwrap_or_else(rand::random)
    }

    /// See [`random::random_choice`](crate::random::random_choice).
    pub fn random_choice<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = (self.get_random() % items.len() as u64) as usize;
        items.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::tracker::TrackerEntry;
    use voidstar_protocol::ASSERT_TAG;

    fn sdk() -> (Arc<MemorySink>, Arc<Sdk>) {
        let sink = Arc::new(MemorySink::new());
        (sink.clone(), Sdk::with_sink(sink))
    }

    fn entry_of(sdk: &Sdk, record: &Value) -> Arc<TrackerEntry> {
        let location: CallSiteLocation =
            serde_json::from_value(record["location"].clone()).unwrap();
        sdk.tracker().entry(&location.key()).unwrap()
    }

    #[test]
    fn always_three_times_emits_once() {
        let (sink, sdk) = sdk();
        let x = 6;
        for _ in 0..3 {
            sdk.always(x > 5, "x>5", &json!({"x": x}));
        }

        let records = sink.tagged(ASSERT_TAG);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["message"], json!("x>5"));
        assert_eq!(record["condition"], json!(true));
        assert_eq!(record["hit"], json!(true));
        assert_eq!(record["must_hit"], json!(true));
        assert_eq!(record["expecting"], json!(true));
        assert_eq!(record["assert_type"], json!("every"));
        assert_eq!(record["category"], json!(""));
        assert_eq!(record["details"], json!({"x": 6}));
        assert!(record["location"]["filename"]
            .as_str()
            .unwrap()
            .ends_with("context.rs"));

        let entry = entry_of(&sdk, record);
        assert_eq!(entry.pass_count(), 3);
        assert_eq!(entry.fail_count(), 0);
        assert_eq!(sdk.tracker().len(), 1);
    }

    #[test]
    fn sometimes_false_false_true() {
        let (sink, sdk) = sdk();
        for saw_y in [false, false, true] {
            sdk.sometimes(saw_y, "saw y", &json!({}));
        }

        let records = sink.tagged(ASSERT_TAG);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["condition"], json!(false));
        assert_eq!(records[1]["condition"], json!(true));
        assert_eq!(records[0]["assert_type"], json!("some"));
        assert_eq!(records[0]["id"], records[1]["id"]);

        let entry = entry_of(&sdk, &records[0]);
        assert_eq!(entry.pass_count(), 1);
        assert_eq!(entry.fail_count(), 2);
    }

    #[test]
    fn unreachable_never_called_leaves_no_entry() {
        let (sink, sdk) = sdk();
        let dead = false;
        if dead {
            sdk.unreachable("dead code", &Value::Null);
        }
        assert!(sdk.tracker().is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn kind_flags() {
        let (sink, sdk) = sdk();
        sdk.always_or_unreachable(false, "bounded", &Value::Null);
        sdk.reachable("error path", &Value::Null);
        sdk.unreachable("impossible", &Value::Null);

        let records = sink.tagged(ASSERT_TAG);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0]["assert_type"], json!("every"));
        assert_eq!(records[0]["must_hit"], json!(false));
        assert_eq!(records[0]["condition"], json!(false));

        assert_eq!(records[1]["assert_type"], json!("none"));
        assert_eq!(records[1]["must_hit"], json!(true));
        assert_eq!(records[1]["condition"], json!(true));

        assert_eq!(records[2]["assert_type"], json!("none"));
        assert_eq!(records[2]["must_hit"], json!(false));
        assert_eq!(records[2]["condition"], json!(true));

        for record in &records {
            assert_eq!(record["expecting"], json!(true));
            assert_eq!(record["hit"], json!(true));
        }
    }

    #[test]
    fn separate_lines_are_separate_sites() {
        let (sink, sdk) = sdk();
        sdk.always(true, "first", &Value::Null);
        sdk.always(true, "second", &Value::Null);
        assert_eq!(sdk.tracker().len(), 2);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn assert_raw_passes_flags_through() {
        let (sink, sdk) = sdk();
        let emitted = sdk.assert_raw(
            false,
            "raw",
            &json!([1, 2]),
            "Cluster",
            "rebalance",
            "cluster.rs",
            88,
            false,
            false,
            false,
            AssertType::Some,
        );
        assert!(emitted);

        let record = &sink.tagged(ASSERT_TAG)[0];
        assert_eq!(record["id"], json!("cluster.rs|88|0"));
        assert_eq!(record["hit"], json!(false));
        assert_eq!(record["must_hit"], json!(false));
        assert_eq!(record["expecting"], json!(false));
        assert_eq!(record["assert_type"], json!("some"));
        assert_eq!(record["location"]["classname"], json!("Cluster"));
        assert_eq!(record["location"]["function"], json!("rebalance"));
        assert_eq!(record["location"]["column"], json!(0));
    }

    #[test]
    fn key_ignores_class_and_function() {
        let (sink, sdk) = sdk();
        let raw = |class: &str, func: &str| {
            sdk.assert_raw(
                true, "m", &Value::Null, class, func, "x.rs", 1, true, true, true, AssertType::Every,
            )
        };
        assert!(raw("A", "f"));
        assert!(!raw("B", "g"));
        assert_eq!(sdk.tracker().len(), 1);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn disabling_mid_run_keeps_counting() {
        let (sink, sdk) = sdk();
        let step = |enabled: bool, cond: bool| {
            sink.set_enabled(enabled);
            sdk.assert_at(
                CallSiteLocation::new("", "", "toggle.rs", 4, 2),
                AssertKind::Always,
                cond,
                "toggle",
                &Value::Null,
            )
        };

        assert!(!step(false, true));
        assert!(!step(false, true));
        assert!(!step(true, true));
        assert!(step(true, false));
        assert!(!step(true, false));

        let entry = sdk
            .tracker()
            .entry(&CallSiteLocation::new("", "", "toggle.rs", 4, 2).key())
            .unwrap();
        assert_eq!(entry.pass_count(), 3);
        assert_eq!(entry.fail_count(), 2);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn concurrent_always_emits_once() {
        const THREADS: u64 = 8;
        let (sink, sdk) = sdk();

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| sdk.always(true, "shared", &Value::Null));
            }
        });

        let records = sink.tagged(ASSERT_TAG);
        assert_eq!(records.len(), 1);
        assert_eq!(entry_of(&sdk, &records[0]).pass_count(), THREADS);
    }

    #[test]
    fn contexts_are_isolated() {
        let (sink_a, a) = sdk();
        let (sink_b, b) = sdk();
        let location = CallSiteLocation::new("", "", "iso.rs", 1, 1);
        a.assert_at(location.clone(), AssertKind::Always, true, "m", &Value::Null);
        b.assert_at(location, AssertKind::Always, true, "m", &Value::Null);
        assert_eq!(sink_a.len(), 1);
        assert_eq!(sink_b.len(), 1);
    }

    #[test]
    fn setup_complete_record() {
        let (sink, sdk) = sdk();
        sdk.setup_complete();
        assert_eq!(sink.records(), vec![("setup_status".to_owned(), json!("complete"))]);
        assert!(sdk.tracker().is_empty());
    }

    #[test]
    fn events_are_not_deduplicated() {
        let (sink, sdk) = sdk();
        for term in 0..3 {
            sdk.send_event("leader_elected", &json!({"term": term}));
        }
        assert_eq!(sink.tagged("leader_elected").len(), 3);
    }

    #[test]
    fn random_falls_back_without_platform() {
        let (_, sdk) = sdk();
        let empty: [u8; 0] = [];
        assert_eq!(sdk.random_choice(&empty), None);
        assert_eq!(sdk.random_choice(&["only"]), Some(&"only"));
        let options = [1, 2, 3];
        assert!(options.contains(sdk.random_choice(&options).unwrap()));
    }

    #[test]
    fn custom_sink_mode() {
        let (_, sdk) = sdk();
        assert_eq!(sdk.mode(), TransportMode::Custom);
    }
}
