//! Transport selection and the process-wide context.
//!
//! Determines whether the SDK is running inside the platform (native
//! library transport) or outside (local JSON output or no-op).  The
//! richer channel is tried first; each failure downgrades to the next.

use crate::config::SdkConfig;
use crate::context::Sdk;
use crate::local::LocalSink;
use crate::sink::{NoopSink, Sink};
use std::sync::{Arc, OnceLock};
use voidstar_protocol::LOCAL_OUTPUT_ENV;

// ═══════════════════════════════════════════════════════════════════════
//  Transport mode
// ═══════════════════════════════════════════════════════════════════════

/// How a context delivers its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Inside the platform, through its native library.
    Native,
    /// Outside the platform, appending JSON lines to a local file.
    LocalOutput,
    /// No output; records are dropped.
    Noop,
    /// A caller-supplied sink.
    Custom,
}

/// Pick the sink for `config`: native library, then local output, then
/// no-op.
///
/// Falling through to no-op is logged once at `warn` with the reason.
pub fn select_sink(config: &SdkConfig) -> (Arc<dyn Sink>, TransportMode) {
    #[cfg(feature = "native")]
    let native_unavailable = match crate::native::VoidstarSink::load(&config.native_library) {
        Ok(sink) => {
            log::debug!(
                "voidstar-sdk: using native library {}",
                config.native_library.display()
            );
            return (Arc::new(sink), TransportMode::Native);
        }
        Err(e) => {
            log::debug!("voidstar-sdk: {e}");
            e.to_string()
        }
    };
    #[cfg(not(feature = "native"))]
    let native_unavailable = String::from("native transport not compiled in");

    if let Some(path) = &config.local_output {
        match LocalSink::open(path) {
            Ok(sink) => {
                log::debug!("voidstar-sdk: writing local output to {}", path.display());
                return (Arc::new(sink), TransportMode::LocalOutput);
            }
            Err(e) => log::warn!(
                "voidstar-sdk: could not open {LOCAL_OUTPUT_ENV}={}, falling back to no-op: {e}",
                path.display()
            ),
        }
    }

    log::warn!(
        "voidstar-sdk: {native_unavailable}; {LOCAL_OUTPUT_ENV} not usable, records will be dropped"
    );
    (Arc::new(NoopSink), TransportMode::Noop)
}

// ═══════════════════════════════════════════════════════════════════════
//  Process-wide context
// ═══════════════════════════════════════════════════════════════════════

static GLOBAL: OnceLock<Arc<Sdk>> = OnceLock::new();

fn global_arc() -> &'static Arc<Sdk> {
    GLOBAL.get_or_init(|| Sdk::from_config(&SdkConfig::from_env()))
}

pub(crate) fn global_ref() -> &'static Sdk {
    global_arc()
}

/// The process-wide context, created from the environment on first use.
pub fn global() -> Arc<Sdk> {
    Arc::clone(global_arc())
}

/// Initialize the SDK.
///
/// Detects the transport and creates the process-wide catalog.  Safe to
/// call more than once.  If never called, initialization happens on first
/// SDK use.
pub fn init() {
    let _ = global_ref();
}

/// Returns `true` if the process-wide context uses the native library.
pub fn is_native() -> bool {
    global_ref().mode() == TransportMode::Native
}

/// Returns `true` if the process-wide context writes local output.
pub fn is_local_output() -> bool {
    global_ref().mode() == TransportMode::LocalOutput
}
