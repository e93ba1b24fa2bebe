//! Pipeline stages for Markdown/HTML-to-PDF conversion.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ markdown ──▶ settings ──▶ engine ──▶ write
//! (.md/.html) (HTML)     (named opts)  (PDF)      (file)
//! ```
//!
//! 1. [`input`]    — decide Markdown vs HTML, load the bytes
//! 2. [`markdown`] — render Markdown to HTML (skipped for HTML input)
//! 3. [`settings`] — map the run configuration onto converter settings
//! 4. [`engine`]   — run the converter; [`diagnostics`] turns its stderr
//!    into progress/phase/error/warning events
//! 5. [`write`]    — write the PDF (and, in debug mode, the HTML)

pub mod diagnostics;
pub mod engine;
pub mod input;
pub mod markdown;
pub mod settings;
pub mod write;
