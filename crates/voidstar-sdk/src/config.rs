//! SDK configuration.
//!
//! The process-wide context is built from [`SdkConfig::from_env`].  Tests
//! and embedders can build a config by hand and pass it to
//! [`Sdk::from_config`](crate::Sdk::from_config).

use std::path::PathBuf;
use voidstar_protocol::{DEFAULT_NATIVE_LIBRARY_PATH, LOCAL_OUTPUT_ENV};

/// Transport and labelling settings for an SDK context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkConfig {
    /// Path of the platform's native library.
    pub native_library: PathBuf,
    /// Local JSON output file, used when the native library is unavailable.
    pub local_output: Option<PathBuf>,
    /// Source label for emitted records.
    pub source_name: Option<String>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            native_library: PathBuf::from(DEFAULT_NATIVE_LIBRARY_PATH),
            local_output: None,
            source_name: None,
        }
    }
}

impl SdkConfig {
    /// Read the configuration from the process environment.
    ///
    /// [`LOCAL_OUTPUT_ENV`] is trimmed; an empty value means no local output.
    pub fn from_env() -> Self {
        Self {
            local_output: parse_output_path(std::env::var(LOCAL_OUTPUT_ENV).ok().as_deref()),
            ..Self::default()
        }
    }

    pub fn with_local_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_output = Some(path.into());
        self
    }

    pub fn with_native_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.native_library = path.into();
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

fn parse_output_path(raw: Option<&str>) -> Option<PathBuf> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}
