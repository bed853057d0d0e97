//! Workload-side SDK for an external autonomous testing platform.
//!
//! Software under test is annotated with **assertions**, **lifecycle
//! events** and **guided randomness**.  Inside the platform, records go to
//! its native library (`libvoidstar.so`); outside it they can be written to
//! a local JSON-lines file for inspection, or dropped.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use voidstar_sdk::prelude::*;
//! use serde_json::json;
//!
//! voidstar_init();
//!
//! // Signal that setup is done and faults may begin
//! setup_complete();
//!
//! // Property: leader must always be valid when checked
//! vs_assert_always!(leader_id < num_nodes, "valid leader", json!({"leader": leader_id}));
//!
//! // Property: eventually at least one write succeeds
//! vs_assert_sometimes!(write_ok, "write succeeded");
//!
//! // Guided random: the platform controls this for exploration
//! let action = random_choice(&["read", "write", "delete"]);
//! ```
//!
//! # Deduplication
//!
//! Each call site reports at most one passing and one failing evaluation
//! per process.  See [`tracker`].
//!
//! # Transport
//!
//! Chosen once, on first use: the native library at
//! [`DEFAULT_NATIVE_LIBRARY_PATH`](voidstar_protocol::DEFAULT_NATIVE_LIBRARY_PATH),
//! else the file named by `ANTITHESIS_SDK_LOCAL_OUTPUT`, else nothing.
//! Build an [`Sdk`] directly for an isolated catalog with its own sink.

pub mod assert;
pub mod config;
pub mod context;
pub mod error;
mod internal;
pub mod lifecycle;
pub mod local;
pub mod location;
#[cfg(feature = "native")]
pub mod native;
pub mod prelude;
pub mod random;
pub mod sink;
pub mod tracker;

pub use config::SdkConfig;
pub use context::Sdk;
pub use error::SinkError;
pub use internal::{global, init, is_local_output, is_native, select_sink, TransportMode};
pub use voidstar_protocol::{AssertType, AssertionRecord, CallSiteKey, CallSiteLocation};

#[doc(hidden)]
pub use serde_json;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Alias for [`init`], for prelude users.
pub fn voidstar_init() {
    init();
}

/// Lock `mutex`, recovering the data if a holder panicked.  Counters and
/// buffers stay usable after a panic in an unrelated assertion.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
