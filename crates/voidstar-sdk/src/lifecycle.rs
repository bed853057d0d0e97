//! Lifecycle events for coordinating test phases.
//!
//! These signals tell the platform where the workload is, so it can start
//! injecting faults at the right time and line up events across runs.

use crate::internal::global_ref;
use serde_json::Value;

/// Signal that workload setup is complete and testing may begin.
///
/// The platform holds off fault injection until this arrives.  Call it
/// once all services are up and ready for requests.
///
/// Only the first call by any process counts; later calls are harmless.
/// Attach context with a [`send_event`] just before, if needed.
///
/// # Example
///
/// ```rust,ignore
/// start_raft_cluster(&config);
/// wait_for_leader_election();
/// voidstar_sdk::lifecycle::setup_complete();
/// // Faults may now be injected
/// ```
pub fn setup_complete() {
    global_ref().setup_complete();
}

/// Emit a named structured event.
///
/// `name` becomes the record's tag; `details` is its body.
///
/// # Example
///
/// ```rust,ignore
/// use serde_json::json;
/// voidstar_sdk::lifecycle::send_event("leader_elected", &json!({
///     "node_id": 2,
///     "term": 5,
/// }));
/// ```
pub fn send_event(name: &str, details: &Value) {
    global_ref().send_event(name, details);
}

/// Name this process in emitted records.
pub fn set_source_name(name: &str) {
    global_ref().set_source_name(name);
}
