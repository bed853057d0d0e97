//! Errors raised while setting up a record sink.
//!
//! These never reach assertion call sites: transport selection logs them
//! and falls back to the next transport.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from opening or loading a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No local output path provided")]
    EmptyOutputPath,

    #[cfg(feature = "native")]
    #[error("Unable to load native library {}: {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[cfg(feature = "native")]
    #[error("Native library {} is missing symbol {symbol}", path.display())]
    MissingSymbol {
        path: PathBuf,
        symbol: String,
        #[source]
        source: libloading::Error,
    },
}
