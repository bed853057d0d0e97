//! Transport through the platform's native library.
//!
//! Inside the platform, `libvoidstar.so` is installed and exports four C
//! functions.  Records are handed over as JSON bytes (`{"<tag>": value}`)
//! and flushed immediately.  Random values come from the platform too, which
//! is what lets it steer and replay those choices.
//!
//! This module is only compiled with the `native` feature.

use crate::error::SinkError;
use crate::sink::Sink;
use libloading::Library;
use serde_json::Value;
use std::ffi::{c_char, CString};
use std::path::{Path, PathBuf};
use voidstar_protocol::{
    tagged_json, SYM_FLUSH, SYM_GET_RANDOM, SYM_JSON_DATA, SYM_SET_SOURCE_NAME,
};

type JsonDataFn = unsafe extern "C" fn(data: *const c_char, size: usize);
type GetRandomFn = unsafe extern "C" fn() -> u64;
type FlushFn = unsafe extern "C" fn();
type SetSourceNameFn = unsafe extern "C" fn(name: *const c_char);

/// Sink backed by the platform's native library.
pub struct VoidstarSink {
    json_data: JsonDataFn,
    get_random: GetRandomFn,
    flush: FlushFn,
    set_source_name: SetSourceNameFn,
    path: PathBuf,
    // Keeps the function pointers above valid.
    _library: Library,
}

impl VoidstarSink {
    /// Load the library at `path` and resolve all four entry points.
    pub fn load(path: &Path) -> Result<Self, SinkError> {
        // Safety: loading runs the library's initializers.  The path is the
        // platform's own library, which has no initialization preconditions.
        let library = unsafe { Library::new(path) }.map_err(|source| SinkError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;

        // Safety: each signature matches the C declaration documented in
        // voidstar_protocol next to the symbol name.
        unsafe {
            Ok(Self {
                json_data: symbol::<JsonDataFn>(&library, path, SYM_JSON_DATA)?,
                get_random: symbol::<GetRandomFn>(&library, path, SYM_GET_RANDOM)?,
                flush: symbol::<FlushFn>(&library, path, SYM_FLUSH)?,
                set_source_name: symbol::<SetSourceNameFn>(&library, path, SYM_SET_SOURCE_NAME)?,
                path: path.to_path_buf(),
                _library: library,
            })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Resolve `name` (NUL-terminated) from `library` as a `T`.
///
/// # Safety
///
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn symbol<T: Copy>(library: &Library, path: &Path, name: &[u8]) -> Result<T, SinkError> {
    library
        .get::<T>(name)
        .map(|sym| *sym)
        .map_err(|source| SinkError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name)).into_owned(),
            source,
        })
}

impl Sink for VoidstarSink {
    fn is_emit_disabled(&self) -> bool {
        false
    }

    fn emit_json(&self, tag: &str, value: &Value) {
        let payload = match serde_json::to_string(&tagged_json(tag, value)) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("voidstar-sdk: dropping {tag} record: {e}");
                return;
            }
        };
        // Safety: the pointer and length describe `payload`, which outlives
        // the call.  The library copies the bytes before returning.
        unsafe { (self.json_data)(payload.as_ptr().cast(), payload.len()) };
        self.flush();
    }

    fn flush(&self) {
        // Safety: takes no arguments.
        unsafe { (self.flush)() };
    }

    fn random_u64(&self) -> Option<u64> {
        // Safety: takes no arguments.
        Some(unsafe { (self.get_random)() })
    }

    fn set_source_name(&self, name: &str) {
        let Ok(name) = CString::new(name) else {
            log::warn!("voidstar-sdk: source name contains a NUL byte, ignoring");
            return;
        };
        // Safety: `name` is a valid NUL-terminated string for the call.
        unsafe { (self.set_source_name)(name.as_ptr()) };
    }
}
