//! Test property assertions.
//!
//! Assertions describe properties the platform checks across many runs.
//! Within one process the SDK only reports the *first* true and the *first*
//! false evaluation of each call site (see [`tracker`](crate::tracker)); the
//! platform does the cross-run judging.
//!
//! # Assertion semantics
//!
//! | Function                   | Kind   | must_hit | Fails when                                   |
//! |----------------------------|--------|----------|----------------------------------------------|
//! | [`always`]                 | every  | yes      | `cond` is ever false, or never evaluated      |
//! | [`always_or_unreachable`]  | every  | no       | `cond` is ever false                          |
//! | [`sometimes`]              | some   | yes      | `cond` is never true, or never evaluated      |
//! | [`reachable`]              | none   | yes      | the line never executes                       |
//! | [`unreachable`]            | none   | no       | the line executes                             |
//!
//! Every assertion reports `expecting = true` and, except through
//! [`assert_raw`], `hit = true`.
//!
//! # Call sites
//!
//! The functions identify their caller with `#[track_caller]`.  The
//! `vs_assert_*` macros also record the module and enclosing function.
//! Two calls on the same file, line and column are the same assertion.

use crate::internal::global_ref;
use crate::location::resolve_caller;
use serde::Serialize;
use serde_json::Value;
use voidstar_protocol::{AssertType, CallSiteLocation};

// ═══════════════════════════════════════════════════════════════════════
//  Assertion kinds
// ═══════════════════════════════════════════════════════════════════════

/// The fixed flag set behind each assertion function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssertKind {
    Always,
    AlwaysOrUnreachable,
    Sometimes,
    Reachable,
    Unreachable,
}

impl AssertKind {
    /// Whether never evaluating this assertion counts as a failure.
    pub const fn must_hit(self) -> bool {
        match self {
            AssertKind::Always | AssertKind::Sometimes | AssertKind::Reachable => true,
            AssertKind::AlwaysOrUnreachable | AssertKind::Unreachable => false,
        }
    }

    pub const fn expecting(self) -> bool {
        true
    }

    pub const fn assert_type(self) -> AssertType {
        match self {
            AssertKind::Always | AssertKind::AlwaysOrUnreachable => AssertType::Every,
            AssertKind::Sometimes => AssertType::Some,
            AssertKind::Reachable | AssertKind::Unreachable => AssertType::None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Core assertions
// ═══════════════════════════════════════════════════════════════════════

/// Assert that `cond` is true **every** time this point is reached, and
/// that it is reached at least once.
///
/// `details` is free-form context shown with the assertion, such as the
/// values that produced `cond`.
///
/// # Example
///
/// ```rust,ignore
/// voidstar_sdk::assert::always(
///     leader_id < cluster_size,
///     "leader ID is valid",
///     &json!({"leader": leader_id, "cluster_size": cluster_size}),
/// );
/// ```
#[track_caller]
pub fn always(cond: bool, message: &str, details: &Value) {
    global_ref().assert_at(resolve_caller(), AssertKind::Always, cond, message, details);
}

/// Assert that `cond` is true every time this point is reached.  Never
/// reaching it is fine.
#[track_caller]
pub fn always_or_unreachable(cond: bool, message: &str, details: &Value) {
    global_ref().assert_at(
        resolve_caller(),
        AssertKind::AlwaysOrUnreachable,
        cond,
        message,
        details,
    );
}

/// Assert that `cond` is true **at least once** across all evaluations.
///
/// Use this for liveness properties and to confirm that interesting
/// states actually occur under fault injection.
///
/// # Example
///
/// ```rust,ignore
/// voidstar_sdk::assert::sometimes(
///     retries > 0,
///     "a write needed a retry",
///     &json!({"retries": retries}),
/// );
/// ```
#[track_caller]
pub fn sometimes(cond: bool, message: &str, details: &Value) {
    global_ref().assert_at(resolve_caller(), AssertKind::Sometimes, cond, message, details);
}

/// Assert that this code point is **reached at least once**.
///
/// # Example
///
/// ```rust,ignore
/// if let Err(e) = disk.write(offset, &data) {
///     voidstar_sdk::assert::reachable(
///         "disk write error path exercised",
///         &json!({"error": e.to_string()}),
///     );
/// }
/// ```
#[track_caller]
pub fn reachable(message: &str, details: &Value) {
    global_ref().assert_at(resolve_caller(), AssertKind::Reachable, true, message, details);
}

/// Assert that this code point is **never reached**.
///
/// Reaching it emits a record; the platform treats that record itself as
/// the failure.
#[track_caller]
pub fn unreachable(message: &str, details: &Value) {
    global_ref().assert_at(resolve_caller(), AssertKind::Unreachable, true, message, details);
}

/// Evaluate an assertion of `kind` at an explicit location.
///
/// This is what the `vs_assert_*` macros expand to.
pub fn assert_at(
    location: CallSiteLocation,
    kind: AssertKind,
    cond: bool,
    message: &str,
    details: &Value,
) {
    global_ref().assert_at(location, kind, cond, message, details);
}

/// Unwrapped assertion access for custom tooling.
///
/// Takes the location and every flag explicitly; the column is unknown.
#[allow(clippy::too_many_arguments)]
pub fn assert_raw(
    cond: bool,
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
) {
    global_ref().assert_raw(
        cond,
        message,
        details,
        classname,
        function,
        filename,
        line,
        hit,
        must_hit,
        expecting,
        assert_type,
    );
}

/// Details for a comparison assertion: `{"left": .., "right": ..}` merged
/// over `extra` when `extra` is an object.
///
/// Operands that cannot be serialized are reported as `null`.
#[doc(hidden)]
pub fn comparison_details<L: Serialize + ?Sized, R: Serialize + ?Sized>(
    left: &L,
    right: &R,
    extra: Value,
) -> Value {
    let mut map = match extra {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("details".to_owned(), other);
            map
        }
    };
    map.insert(
        "left".to_owned(),
        serde_json::to_value(left).unwrap_or(Value::Null),
    );
    map.insert(
        "right".to_owned(),
        serde_json::to_value(right).unwrap_or(Value::Null),
    );
    Value::Object(map)
}

// ═══════════════════════════════════════════════════════════════════════
//  Assertion macros (call-site location)
// ═══════════════════════════════════════════════════════════════════════

#[doc(hidden)]
#[macro_export]
macro_rules! __vs_assert {
    ($kind:ident, $cond:expr, $msg:expr) => {
        $crate::assert::assert_at(
            $crate::vs_location!(),
            $crate::assert::AssertKind::$kind,
            $cond,
            $msg,
            &$crate::serde_json::Value::Null,
        )
    };
    ($kind:ident, $cond:expr, $msg:expr, $details:expr) => {
        $crate::assert::assert_at(
            $crate::vs_location!(),
            $crate::assert::AssertKind::$kind,
            $cond,
            $msg,
            &$details,
        )
    };
}

/// Assert-always with the invocation's module, function and line.
///
/// ```rust,ignore
/// vs_assert_always!(leader_id < 3, "valid leader");
/// vs_assert_always!(leader_id < 3, "valid leader", json!({"leader": leader_id}));
/// ```
#[macro_export]
macro_rules! vs_assert_always {
    ($cond:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert!(Always, $cond, $msg)
    };
    ($cond:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert!(Always, $cond, $msg, $details)
    };
}

/// Assert-always-or-unreachable with the invocation's location.
#[macro_export]
macro_rules! vs_assert_always_or_unreachable {
    ($cond:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert!(AlwaysOrUnreachable, $cond, $msg)
    };
    ($cond:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert!(AlwaysOrUnreachable, $cond, $msg, $details)
    };
}

/// Assert-sometimes with the invocation's location.
#[macro_export]
macro_rules! vs_assert_sometimes {
    ($cond:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert!(Sometimes, $cond, $msg)
    };
    ($cond:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert!(Sometimes, $cond, $msg, $details)
    };
}

/// Assert-reachable with the invocation's location.
#[macro_export]
macro_rules! vs_assert_reachable {
    ($msg:expr $(,)?) => {
        $crate::__vs_assert!(Reachable, true, $msg)
    };
    ($msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert!(Reachable, true, $msg, $details)
    };
}

/// Assert-unreachable with the invocation's location.
#[macro_export]
macro_rules! vs_assert_unreachable {
    ($msg:expr $(,)?) => {
        $crate::__vs_assert!(Unreachable, true, $msg)
    };
    ($msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert!(Unreachable, true, $msg, $details)
    };
}

// ═══════════════════════════════════════════════════════════════════════
//  Numeric comparison macros
// ═══════════════════════════════════════════════════════════════════════
//
// These put both operands into the details under `left` and `right`,
// which says more about a failure than a bare `always(a < b)`.

#[doc(hidden)]
#[macro_export]
macro_rules! __vs_assert_cmp {
    ($kind:ident, $op:tt, $left:expr, $right:expr, $msg:expr, $extra:expr) => {
        match (&$left, &$right) {
            (left, right) => $crate::assert::assert_at(
                $crate::vs_location!(),
                $crate::assert::AssertKind::$kind,
                *left $op *right,
                $msg,
                &$crate::assert::comparison_details(left, right, $extra),
            ),
        }
    };
}

/// Assert `left < right` always holds.
///
/// ```rust,ignore
/// vs_assert_always_lt!(used, capacity, "within capacity");
/// ```
#[macro_export]
macro_rules! vs_assert_always_lt {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, <, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, <, $left, $right, $msg, $details)
    };
}

/// Assert `left <= right` always holds.
#[macro_export]
macro_rules! vs_assert_always_le {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, <=, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, <=, $left, $right, $msg, $details)
    };
}

/// Assert `left > right` always holds.
#[macro_export]
macro_rules! vs_assert_always_gt {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, >, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, >, $left, $right, $msg, $details)
    };
}

/// Assert `left >= right` always holds.
#[macro_export]
macro_rules! vs_assert_always_ge {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, >=, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, >=, $left, $right, $msg, $details)
    };
}

/// Assert `left == right` always holds.
#[macro_export]
macro_rules! vs_assert_always_eq {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, ==, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, ==, $left, $right, $msg, $details)
    };
}

/// Assert `left != right` always holds.
#[macro_export]
macro_rules! vs_assert_always_ne {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, !=, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Always, !=, $left, $right, $msg, $details)
    };
}

/// Assert `left < right` holds at least once.
#[macro_export]
macro_rules! vs_assert_sometimes_lt {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, <, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, <, $left, $right, $msg, $details)
    };
}

/// Assert `left <= right` holds at least once.
#[macro_export]
macro_rules! vs_assert_sometimes_le {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, <=, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, <=, $left, $right, $msg, $details)
    };
}

/// Assert `left > right` holds at least once.
#[macro_export]
macro_rules! vs_assert_sometimes_gt {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, >, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, >, $left, $right, $msg, $details)
    };
}

/// Assert `left >= right` holds at least once.
#[macro_export]
macro_rules! vs_assert_sometimes_ge {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, >=, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, >=, $left, $right, $msg, $details)
    };
}

/// Assert `left == right` holds at least once.
#[macro_export]
macro_rules! vs_assert_sometimes_eq {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, ==, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, ==, $left, $right, $msg, $details)
    };
}

/// Assert `left != right` holds at least once.
#[macro_export]
macro_rules! vs_assert_sometimes_ne {
    ($left:expr, $right:expr, $msg:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, !=, $left, $right, $msg, $crate::serde_json::Value::Null)
    };
    ($left:expr, $right:expr, $msg:expr, $details:expr $(,)?) => {
        $crate::__vs_assert_cmp!(Sometimes, !=, $left, $right, $msg, $details)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_table() {
        let table = [
            (AssertKind::Always, true, AssertType::Every),
            (AssertKind::AlwaysOrUnreachable, false, AssertType::Every),
            (AssertKind::Sometimes, true, AssertType::Some),
            (AssertKind::Reachable, true, AssertType::None),
            (AssertKind::Unreachable, false, AssertType::None),
        ];
        for (kind, must_hit, assert_type) in table {
            assert_eq!(kind.must_hit(), must_hit, "{kind:?}");
            assert_eq!(kind.assert_type(), assert_type, "{kind:?}");
            assert!(kind.expecting());
        }
    }

    #[test]
    fn comparison_details_merges_extra() {
        assert_eq!(
            comparison_details(&1, &2, Value::Null),
            json!({"left": 1, "right": 2})
        );
        assert_eq!(
            comparison_details(&"a", &"b", json!({"node": 3})),
            json!({"left": "a", "right": "b", "node": 3})
        );
        assert_eq!(
            comparison_details(&1.5, &0.5, json!("note")),
            json!({"left": 1.5, "right": 0.5, "details": "note"})
        );
    }

    #[test]
    fn comparison_details_nulls_unserializable_operands() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);
        let details = comparison_details(&map, &0, Value::Null);
        assert_eq!(details["left"], Value::Null);
        assert_eq!(details["right"], json!(0));
    }

    // ── Macro expansion ──────────────────────────────────────────
    // These route through the process-wide context, which is a no-op
    // outside the platform unless local output is configured.

    #[test]
    fn basic_macros_compile() {
        vs_assert_always!(true, "test always");
        vs_assert_sometimes!(true, "test sometimes");
        vs_assert_reachable!("test reachable");
        vs_assert_always_or_unreachable!(true, "test always_or_unreachable");
        if false {
            vs_assert_unreachable!("test unreachable");
        }
    }

    #[test]
    fn macros_with_details() {
        vs_assert_always!(true, "msg", json!({"k1": "v1", "k2": 2}));
        vs_assert_sometimes!(false, "msg", json!([1, 2, 3]));
        vs_assert_reachable!("msg", json!({"ctx": "test"}));
    }

    #[test]
    fn comparison_macros_compile() {
        let a = 5;
        let b = 10;

        vs_assert_always_lt!(a, b, "a < b");
        vs_assert_always_le!(a, b, "a <= b");
        vs_assert_always_gt!(b, a, "b > a");
        vs_assert_always_ge!(b, a, "b >= a");
        vs_assert_always_eq!(a, a, "a == a");
        vs_assert_always_ne!(a, b, "a != b", json!({"why": "distinct"}));

        vs_assert_sometimes_lt!(a, b, "sometimes a < b");
        vs_assert_sometimes_le!(a, b, "sometimes a <= b");
        vs_assert_sometimes_gt!(b, a, "sometimes b > a");
        vs_assert_sometimes_ge!(b, a, "sometimes b >= a");
        vs_assert_sometimes_eq!(a, a, "sometimes a == a");
        vs_assert_sometimes_ne!(a, b, "sometimes a != b");
    }

    #[test]
    fn comparison_operands_evaluated_once() {
        let mut calls = 0;
        let mut next = || {
            calls += 1;
            calls
        };
        vs_assert_always_lt!(next(), 100, "counted");
        assert_eq!(calls, 1);
    }

    #[test]
    fn global_functions_are_tracked() {
        let before = crate::global().tracker().len();
        always(true, "global always", &Value::Null);
        sometimes(false, "global sometimes", &Value::Null);
        assert!(crate::global().tracker().len() >= before + 2);
    }
}
