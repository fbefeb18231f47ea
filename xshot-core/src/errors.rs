//! Error types for `xshot_core`.
//!
//! All failures are funnelled through [`XshotError`], which uses
//! `thiserror` for `Display` and `Error` derives.  Every variant renders as a
//! single `Kind: message` line so the binary can print it verbatim.

use std::path::PathBuf;

use thiserror::Error;

use crate::process::ExitKind;

/// Top-level error type for the `xshot_core` library.
///
/// No variant is retried anywhere; each one propagates to the binary and
/// terminates the run.
#[derive(Debug, Error)]
pub enum XshotError {
    /// A setting rejected a new value.  The setting keeps its old value.
    #[error("InvalidValue: {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// The resolved output path is already taken.
    #[error("FileExists: {}", .0.display())]
    FileExists(PathBuf),

    /// An external tool exited non-zero or was killed by a signal.
    ///
    /// `stderr` holds whatever the tool wrote before it died.
    #[error("CommandFailed: command {command:?} failed ({status})")]
    CommandFailed {
        command: String,
        status: ExitKind,
        stderr: String,
    },

    /// An external tool could not be started at all.
    #[error("SpawnFailed: {command:?}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The window-introspection tool did not report a window id.
    #[error("WindowNotFound: {0}")]
    WindowNotFound(String),

    /// Output directory missing, not a directory, or not traversable.
    #[error("InvalidDirectory: {0}")]
    InvalidDirectory(String),

    /// Date format that is unparseable or encodes no date/time component.
    #[error("InvalidDateFormat: {0}")]
    InvalidDateFormat(String),

    /// File extension outside the supported set.
    #[error("InvalidExtension: {0}")]
    InvalidExtension(String),

    /// Filesystem failure while scanning the output directory.
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, XshotError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
