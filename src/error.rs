//! Error types for the md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`] — **Fatal**: the run cannot proceed at all (no input,
//!   unreadable input file, unopenable output file, converter executable
//!   missing). Returned as `Err(Md2PdfError)` from the top-level `convert*`
//!   functions.
//!
//! * [`EngineFailure`] — **Non-fatal**: the converter ran but reported that
//!   the conversion failed. Stored inside [`crate::output::ConversionStats`];
//!   whether the output is still written is decided by
//!   [`crate::config::FailurePolicy`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Neither a Markdown nor an HTML input was supplied.
    #[error("No input file specified")]
    NoInput,

    /// Input file was not found at the given path.
    #[error("Unable to open input file '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part-way.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Unable to open output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The wkhtmltopdf executable could not be found or started.
    #[error(
        "wkhtmltopdf is not available: {0}\n\n\
Install it from https://wkhtmltopdf.org/downloads.html, or point to an\n\
existing copy with --wkhtmltopdf <PATH> / WKHTMLTOPDF_PATH=<PATH>.\n"
    )]
    EngineUnavailable(String),

    /// Talking to the running converter process failed.
    #[error("I/O error while driving the converter: {0}")]
    EngineIo(#[source] std::io::Error),

    /// A path handed to the converter is not valid UTF-8.
    #[error("Path '{path}' is not valid UTF-8 and cannot be passed to the converter")]
    NonUtf8Path { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal conversion failure reported by the converter.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineFailure {
    /// The converter exited with a non-zero status code.
    #[error("converter exited with code {code}")]
    Exited { code: i32 },

    /// The converter was terminated without an exit code (e.g. by a signal).
    #[error("converter was terminated before finishing")]
    Terminated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_display_matches_cli_message() {
        assert_eq!(Md2PdfError::NoInput.to_string(), "No input file specified");
    }

    #[test]
    fn input_not_found_mentions_path() {
        let e = Md2PdfError::InputNotFound {
            path: PathBuf::from("notes/missing.md"),
        };
        assert!(e.to_string().contains("notes/missing.md"), "got: {e}");
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = Md2PdfError::OutputWriteFailed {
            path: PathBuf::from("/nope/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such dir"),
        };
        assert!(e.to_string().contains("/nope/out.pdf"));
        assert!(e.source().is_some());
    }

    #[test]
    fn engine_failure_display() {
        assert_eq!(
            EngineFailure::Exited { code: 2 }.to_string(),
            "converter exited with code 2"
        );
        assert!(EngineFailure::Terminated.to_string().contains("terminated"));
    }

    #[test]
    fn engine_unavailable_has_install_hint() {
        let e = Md2PdfError::EngineUnavailable("not found on PATH".into());
        let msg = e.to_string();
        assert!(msg.contains("not found on PATH"));
        assert!(msg.contains("WKHTMLTOPDF_PATH"));
    }
}
