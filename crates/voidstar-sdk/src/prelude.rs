//! Prelude: the common SDK surface in one import.
//!
//! ```rust,ignore
//! use voidstar_sdk::prelude::*;
//! use serde_json::json;
//!
//! voidstar_init();
//! setup_complete();
//!
//! vs_assert_always!(leader_id < 3, "valid leader");
//! vs_assert_sometimes!(write_ok, "write succeeded");
//!
//! let choice = random_choice(&[1, 2, 3]);
//! ```

// ── Init ─────────────────────────────────────────────────────────────
pub use crate::{is_local_output, is_native, voidstar_init};

// ── Assertion functions ──────────────────────────────────────────────
pub use crate::assert::{always, always_or_unreachable, reachable, sometimes, unreachable};

// ── Assertion macros ─────────────────────────────────────────────────
pub use crate::{
    // Core
    vs_assert_always,
    // Always comparisons
    vs_assert_always_eq,
    vs_assert_always_ge,
    vs_assert_always_gt,
    vs_assert_always_le,
    vs_assert_always_lt,
    vs_assert_always_ne,
    vs_assert_always_or_unreachable,
    vs_assert_reachable,
    vs_assert_sometimes,
    // Sometimes comparisons
    vs_assert_sometimes_eq,
    vs_assert_sometimes_ge,
    vs_assert_sometimes_gt,
    vs_assert_sometimes_le,
    vs_assert_sometimes_lt,
    vs_assert_sometimes_ne,
    vs_assert_unreachable,
};

// ── Lifecycle ────────────────────────────────────────────────────────
pub use crate::lifecycle::{send_event, set_source_name, setup_complete};

// ── Random ───────────────────────────────────────────────────────────
pub use crate::random::{fill_bytes, get_random, random_choice, VoidstarRng};
