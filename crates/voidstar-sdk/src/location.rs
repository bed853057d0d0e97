//! Call-site discovery.
//!
//! Function-style assertions find their caller through `#[track_caller]`,
//! which yields file, line and column.  The `vs_assert_*` macros capture
//! the same three plus the module path (reported as `classname`) and the
//! enclosing function name.

use voidstar_protocol::CallSiteLocation;

/// Location of the nearest caller not marked `#[track_caller]`.
///
/// Never fails; class and function names are left empty.
#[track_caller]
pub fn resolve_caller() -> CallSiteLocation {
    let caller = std::panic::Location::caller();
    CallSiteLocation::new("", "", caller.file(), caller.line(), caller.column())
}

/// Strip the helper suffix and closure segments from a `type_name` of a
/// nested fn item, leaving the enclosing function's bare name.
#[doc(hidden)]
pub fn function_from_type_name(name: &str) -> &str {
    let name = name.strip_suffix("::__f").unwrap_or(name);
    name.rsplit("::")
        .find(|segment| *segment != "{{closure}}")
        .unwrap_or(name)
}

/// Name of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! __vs_function_name {
    () => {{
        fn __f() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        $crate::location::function_from_type_name(__type_name_of(__f))
    }};
}

/// [`CallSiteLocation`] of the macro invocation.
#[macro_export]
macro_rules! vs_location {
    () => {
        $crate::CallSiteLocation::new(
            ::core::module_path!(),
            $crate::__vs_function_name!(),
            ::core::file!(),
            ::core::line!(),
            ::core::column!(),
        )
    };
}
