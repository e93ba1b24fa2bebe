//! # md2pdf
//!
//! Convert Markdown (or ready-made HTML) documents to PDF.
//!
//! The crate is thin glue around two external collaborators: Markdown is
//! rendered to HTML with `pulldown-cmark`, and the HTML is laid out and
//! printed to PDF by `wkhtmltopdf`. Neither is re-implemented here.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .md / .html
//!  │
//!  ├─ 1. Input     Markdown or HTML, decided by extension
//!  ├─ 2. Render    Markdown → HTML (tables, hard wraps, no intra-word emphasis)
//!  ├─ 3. Settings  header/footer/stylesheet/page options → converter settings
//!  ├─ 4. Convert   wkhtmltopdf, with progress/phase/error/warning callbacks
//!  └─ 5. Write     PDF to <input>.pdf or the chosen output path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert_to_file, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .input("README.md")
//!         .css("print.css")
//!         .build()?;
//!     let stats = convert_to_file(&config).await?;
//!     eprintln!("{} bytes → {}", stats.pdf_bytes, stats.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! The converter executable is looked up on `PATH`, or taken from
//! `WKHTMLTOPDF_PATH`, or from [`RunConfig::wkhtmltopdf_path`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod args;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ColorMode, FailurePolicy, GlobalSettings, Orientation, RunConfig, RunConfigBuilder,
    DEFAULT_FOOTER_TEXT,
};
pub use convert::{
    convert, convert_prepared, convert_sync, convert_to_file, convert_to_file_with, convert_with,
    prepare, write_output, PreparedDocument,
};
pub use error::{EngineFailure, Md2PdfError};
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::engine::{ConversionJob, EngineOutput, EngineStatus, PdfEngine, WkhtmltopdfEngine};
pub use pipeline::markdown::{CmarkRenderer, MarkdownRenderer, RendererOptions};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, Phase, ProgressCallback};
