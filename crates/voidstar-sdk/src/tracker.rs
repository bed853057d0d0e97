//! Assertion catalog and first-occurrence tracking.
//!
//! Every assertion call site gets one [`TrackerEntry`] holding how many
//! times its condition was seen true and false.  Only the *first* true and
//! the *first* false evaluation at a site are forwarded to the sink; later
//! repeats of an outcome already seen are counted and suppressed.
//!
//! That is enough for the platform: from the records of many runs it can
//! tell whether a site was always true, always false, both, or (by the
//! absence of any record) never reached.
//!
//! # Atomicity
//!
//! - The catalog map is behind one mutex, so get-or-create yields exactly
//!   one entry per key.
//! - Each entry has its own mutex held across check → emit → increment, so
//!   concurrent evaluations produce at most one first-pass and one
//!   first-fail record.
//! - Emission goes through [`SinkHandle`], which serializes sink calls.
//!   Lock order is entry → sink; the catalog lock is never held while
//!   emitting.

use crate::lock;
use crate::sink::SinkHandle;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use voidstar_protocol::{AssertionRecord, CallSiteKey, ASSERT_TAG};

/// Pass/fail counters for one call site.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub pass_count: u64,
    pub fail_count: u64,
}

/// Running state for one call site.  Counters only ever increase.
#[derive(Debug, Default)]
pub struct TrackerEntry {
    counts: Mutex<Counts>,
}

impl TrackerEntry {
    pub fn counts(&self) -> Counts {
        *lock(&self.counts)
    }

    pub fn pass_count(&self) -> u64 {
        self.counts().pass_count
    }

    pub fn fail_count(&self) -> u64 {
        self.counts().fail_count
    }
}

/// The catalog: call-site key → [`TrackerEntry`].
///
/// Owned by an [`Sdk`](crate::Sdk) context; nothing else mutates entries.
pub struct AssertTracker {
    entries: Mutex<HashMap<CallSiteKey, Arc<TrackerEntry>>>,
    sink: Arc<SinkHandle>,
}

impl AssertTracker {
    pub(crate) fn new(sink: Arc<SinkHandle>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            sink,
        }
    }

    /// Look up the entry for `key`, creating a zeroed one on first sight.
    pub fn get_or_create_entry(&self, key: &CallSiteKey) -> Arc<TrackerEntry> {
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.get(key) {
            return Arc::clone(entry);
        }
        let entry = Arc::new(TrackerEntry::default());
        entries.insert(key.clone(), Arc::clone(&entry));
        entry
    }

    /// Count one evaluation and forward `record` if it is the first of its
    /// outcome at this site.
    ///
    /// Returns `true` if the record was handed to the sink.  A disabled sink
    /// drops the record but the counters still advance, so re-enabling it
    /// later never replays an old first occurrence.
    pub fn record_evaluation(&self, entry: &TrackerEntry, record: &AssertionRecord) -> bool {
        let mut counts = lock(&entry.counts);
        let seen = if record.condition {
            &mut counts.pass_count
        } else {
            &mut counts.fail_count
        };

        let emitted = *seen == 0 && self.emit(record);
        *seen = seen.saturating_add(1);
        emitted
    }

    fn emit(&self, record: &AssertionRecord) -> bool {
        let emitted = self.sink.emit_serialized(ASSERT_TAG, record);
        if emitted {
            log::debug!(
                "voidstar-sdk: first {} at {} ({:?})",
                if record.condition { "pass" } else { "fail" },
                record.id,
                record.message
            );
        }
        emitted
    }

    /// The entry for `key`, if that site has been evaluated.
    pub fn entry(&self, key: &CallSiteKey) -> Option<Arc<TrackerEntry>> {
        lock(&self.entries).get(key).cloned()
    }

    /// Number of distinct call sites seen.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
