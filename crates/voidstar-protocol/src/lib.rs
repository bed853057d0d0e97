//! Record formats shared between the voidstar SDK and its transports.
//!
//! This crate defines the tag names, environment variables, native symbol
//! names, and the JSON shapes of every record the SDK can emit.  It holds
//! no state and performs no I/O.
//!
//! # Records
//!
//! Every emission is a *tagged* JSON value.  Through the native library the
//! wire form is `{"<tag>": payload}`.  In local mode the same payload is
//! wrapped in a [`LocalLogRecord`] and written as one JSON object per line:
//!
//! ```text
//! {"ticks":1234,"time":"2024-05-01T12:00:00.000Z","source":"","stream":"sdk",
//!  "antithesis_assert":{"hit":true,"must_hit":true,"assert_type":"every",...}}
//! ```

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
//  Tags and names
// ═══════════════════════════════════════════════════════════════════════

/// Tag under which assertion records are emitted.
pub const ASSERT_TAG: &str = "antithesis_assert";

/// Tag under which the setup-complete lifecycle record is emitted.
pub const SETUP_TAG: &str = "setup_status";

/// Payload of the setup-complete record.
pub const SETUP_COMPLETE: &str = "complete";

/// Value of the `stream` field in every local record.
pub const SDK_STREAM: &str = "sdk";

/// Environment variable naming the local JSON output file.
///
/// When the native library is unavailable and this is set to a writable
/// path, records are appended there one JSON object per line.
pub const LOCAL_OUTPUT_ENV: &str = "ANTITHESIS_SDK_LOCAL_OUTPUT";

/// Where the platform installs its native library.
pub const DEFAULT_NATIVE_LIBRARY_PATH: &str = "/usr/lib/libvoidstar.so";

/// `void fuzz_json_data(const char *data, size_t size)`
pub const SYM_JSON_DATA: &[u8] = b"fuzz_json_data\0";
/// `uint64_t fuzz_get_random(void)`
pub const SYM_GET_RANDOM: &[u8] = b"fuzz_get_random\0";
/// `void fuzz_flush(void)`
pub const SYM_FLUSH: &[u8] = b"fuzz_flush\0";
/// `void fuzz_set_source_name(const char *name)`
pub const SYM_SET_SOURCE_NAME: &[u8] = b"fuzz_set_source_name\0";

/// Column value meaning "not known".
pub const COLUMN_UNKNOWN: u32 = 0;

// ═══════════════════════════════════════════════════════════════════════
//  Call-site identity
// ═══════════════════════════════════════════════════════════════════════

/// Attributes known about where an assertion is declared.
///
/// Line and column use `0` for "unknown".  A location is plain data: it can
/// be rebuilt on every call and two equal locations are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CallSiteLocation {
    pub classname: String,
    pub function: String,
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl CallSiteLocation {
    /// Build a location from its parts.
    pub fn new(
        classname: impl Into<String>,
        function: impl Into<String>,
        filename: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            classname: classname.into(),
            function: function.into(),
            filename: filename.into(),
            line,
            column,
        }
    }

    /// The degenerate location used when nothing about the caller is known.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Deduplication key for this location.  See [`make_key`].
    pub fn key(&self) -> CallSiteKey {
        make_key(self)
    }
}

/// Deduplication key for a call site: `filename|line|column`.
///
/// Locations that agree on those three fields share a key even when their
/// class or function names differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSiteKey(String);

impl CallSiteKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallSiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the deduplication key for a location.
///
/// Pure and total: an empty filename still yields a usable key (`|0|0`).
pub fn make_key(location: &CallSiteLocation) -> CallSiteKey {
    CallSiteKey(format!(
        "{}|{}|{}",
        location.filename, location.line, location.column
    ))
}

// ═══════════════════════════════════════════════════════════════════════
//  Assertion records
// ═══════════════════════════════════════════════════════════════════════

/// Which cross-run property an assertion expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertType {
    /// Universal: the condition holds on every evaluation.
    Every,
    /// Existential: the condition holds on at least one evaluation.
    Some,
    /// Reachability: whether the line executes at all.
    None,
}

impl AssertType {
    pub const fn as_str(self) -> &'static str {
        match self {
            AssertType::Every => "every",
            AssertType::Some => "some",
            AssertType::None => "none",
        }
    }
}

impl fmt::Display for AssertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One assertion evaluation as delivered under [`ASSERT_TAG`].
///
/// `must_hit` only changes how the platform judges a site that was never
/// evaluated; the SDK stores and forwards it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionRecord {
    pub hit: bool,
    pub must_hit: bool,
    pub assert_type: AssertType,
    pub expecting: bool,
    /// Reserved; always empty.
    pub category: String,
    pub message: String,
    pub condition: bool,
    pub id: CallSiteKey,
    pub location: CallSiteLocation,
    pub details: serde_json::Value,
}

// ═══════════════════════════════════════════════════════════════════════
//  Local output envelope
// ═══════════════════════════════════════════════════════════════════════

/// Envelope fields of a [`LocalLogRecord`], in output order.
pub const ENVELOPE_FIELDS: [&str; 4] = ["ticks", "time", "source", "stream"];

/// One line of local JSON output.
///
/// The tagged payload is flattened next to the envelope fields, so a
/// record tagged `antithesis_assert` appears as a sibling of `ticks`.  A
/// tag named like an envelope field replaces that field's value in place;
/// every key appears once.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalLogRecord {
    /// Nanoseconds since the local sink was created.
    pub ticks: u64,
    /// ISO-8601 UTC timestamp.
    pub time: String,
    pub source: String,
    pub stream: String,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl Serialize for LocalLogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = self
            .payload
            .keys()
            .filter(|k| !ENVELOPE_FIELDS.contains(&k.as_str()))
            .count();
        let mut map = serializer.serialize_map(Some(ENVELOPE_FIELDS.len() + extra))?;
        envelope_entry(&mut map, &self.payload, "ticks", &self.ticks)?;
        envelope_entry(&mut map, &self.payload, "time", &self.time)?;
        envelope_entry(&mut map, &self.payload, "source", &self.source)?;
        envelope_entry(&mut map, &self.payload, "stream", &self.stream)?;
        for (key, value) in &self.payload {
            if !ENVELOPE_FIELDS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

fn envelope_entry<M: SerializeMap, T: Serialize>(
    map: &mut M,
    payload: &serde_json::Map<String, serde_json::Value>,
    key: &str,
    own: &T,
) -> Result<(), M::Error> {
    match payload.get(key) {
        Some(tagged) => map.serialize_entry(key, tagged),
        None => map.serialize_entry(key, own),
    }
}

impl LocalLogRecord {
    pub fn new(
        ticks: u64,
        time: String,
        source: String,
        tag: &str,
        value: serde_json::Value,
    ) -> Self {
        let mut payload = serde_json::Map::with_capacity(1);
        payload.insert(tag.to_owned(), value);
        Self {
            ticks,
            time,
            source,
            stream: SDK_STREAM.to_owned(),
            payload,
        }
    }

    /// The tagged payload, if this record carries `tag`.
    pub fn tagged(&self, tag: &str) -> Option<&serde_json::Value> {
        self.payload.get(tag)
    }
}

/// Native wire form of a tagged record: `{"<tag>": value}`.
pub fn tagged_json(tag: &str, value: &serde_json::Value) -> serde_json::Value {
    let mut map = serde_json::Map::with_capacity(1);
    map.insert(tag.to_owned(), value.clone());
    serde_json::Value::Object(map)
}
