//! Run configuration for Markdown/HTML-to-PDF conversion.
//!
//! Everything one run needs is collected in [`RunConfig`], built through
//! [`RunConfigBuilder`]. The builder resolves the derived paths once
//! (`<input>.pdf`, `<input>.htm`) and decides whether the input is Markdown
//! or pre-rendered HTML; the resulting config is read-only.

use crate::error::Md2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Footer text used when no footer HTML is supplied.
///
/// `[page]` and `[topage]` are substituted by the converter.
pub const DEFAULT_FOOTER_TEXT: &str = "Page: [page] of [topage]";

/// Configuration for a single conversion run.
///
/// # Example
/// ```rust
/// use md2pdf::RunConfig;
///
/// let config = RunConfig::builder()
///     .input("notes.md")
///     .css("style.css")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.output_path.to_str(), Some("notes.md.pdf"));
/// assert_eq!(config.debug_html_path.as_deref().and_then(|p| p.to_str()), Some("notes.md.htm"));
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Markdown source. `None` when the input is already HTML.
    pub markdown_path: Option<PathBuf>,

    /// Pre-rendered HTML source, set when the input has an `htm`/`html` extension.
    pub html_path: Option<PathBuf>,

    /// Destination PDF. Defaults to `<input>.pdf`.
    pub output_path: PathBuf,

    /// Where the intermediate HTML is dumped in debug mode (`<input>.htm`).
    /// Only set for Markdown inputs.
    pub debug_html_path: Option<PathBuf>,

    /// User stylesheet applied to the document.
    pub css_path: Option<PathBuf>,

    /// HTML document used as the page header.
    pub header_path: Option<PathBuf>,

    /// HTML document used as the page footer. When absent the footer is
    /// [`DEFAULT_FOOTER_TEXT`].
    pub footer_path: Option<PathBuf>,

    /// Dump the intermediate HTML next to the input.
    pub debug: bool,

    /// Converter-wide page options. All unset by default, which leaves the
    /// converter's own defaults in place.
    pub global: GlobalSettings,

    /// What to do with the output buffer when the converter reports failure.
    pub failure_policy: FailurePolicy,

    /// Explicit path to the `wkhtmltopdf` executable.
    pub wkhtmltopdf_path: Option<PathBuf>,

    /// Receives progress/phase/error/warning events from the converter.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("markdown_path", &self.markdown_path)
            .field("html_path", &self.html_path)
            .field("output_path", &self.output_path)
            .field("debug_html_path", &self.debug_html_path)
            .field("css_path", &self.css_path)
            .field("header_path", &self.header_path)
            .field("footer_path", &self.footer_path)
            .field("debug", &self.debug)
            .field("global", &self.global)
            .field("failure_policy", &self.failure_policy)
            .field("wkhtmltopdf_path", &self.wkhtmltopdf_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// The file the run reads from, whichever kind it is.
    pub fn input_path(&self) -> Option<&Path> {
        self.markdown_path
            .as_deref()
            .or(self.html_path.as_deref())
    }
}

/// Builder for [`RunConfig`].
#[derive(Default)]
pub struct RunConfigBuilder {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    css: Option<PathBuf>,
    header: Option<PathBuf>,
    footer: Option<PathBuf>,
    debug: bool,
    global: GlobalSettings,
    failure_policy: FailurePolicy,
    wkhtmltopdf_path: Option<PathBuf>,
    progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for RunConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfigBuilder")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl RunConfigBuilder {
    /// Markdown or HTML input. HTML is recognised by an `htm`/`html` extension.
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn css(mut self, path: impl Into<PathBuf>) -> Self {
        self.css = Some(path.into());
        self
    }

    pub fn header(mut self, path: impl Into<PathBuf>) -> Self {
        self.header = Some(path.into());
        self
    }

    pub fn footer(mut self, path: impl Into<PathBuf>) -> Self {
        self.footer = Some(path.into());
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.debug = v;
        self
    }

    pub fn global(mut self, global: GlobalSettings) -> Self {
        self.global = global;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn wkhtmltopdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.wkhtmltopdf_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Resolve derived paths and validate.
    ///
    /// # Errors
    /// * [`Md2PdfError::NoInput`] when no input was given.
    /// * [`Md2PdfError::InvalidConfig`] when a global setting is out of range.
    ///
    /// Paths are taken as given; an output equal to the input is allowed.
    pub fn build(self) -> Result<RunConfig, Md2PdfError> {
        let input = match self.input {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Err(Md2PdfError::NoInput),
        };

        let output_path = self
            .output
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| append_extension(&input, "pdf"));

        self.global.validate()?;

        let (markdown_path, html_path, debug_html_path) = if is_html_path(&input) {
            (None, Some(input), None)
        } else {
            let htm = append_extension(&input, "htm");
            (Some(input), None, Some(htm))
        };

        Ok(RunConfig {
            markdown_path,
            html_path,
            output_path,
            debug_html_path,
            css_path: self.css,
            header_path: self.header,
            footer_path: self.footer,
            debug: self.debug,
            global: self.global,
            failure_policy: self.failure_policy,
            wkhtmltopdf_path: self.wkhtmltopdf_path,
            progress_callback: self.progress_callback,
        })
    }
}

/// True when the path's extension is `htm` or `html`, ignoring case.
pub fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("htm") || e.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}

/// `doc.md` + `pdf` → `doc.md.pdf`. The existing extension is kept.
pub fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

// ── Global settings ──────────────────────────────────────────────────────

/// Converter-wide options applying to the whole output document.
///
/// `None` everywhere means "leave the converter's default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Paper size, e.g. `A4`, `Letter`.
    pub paper_size: Option<String>,
    pub orientation: Option<Orientation>,
    /// Margins as CSS-like lengths, e.g. `2cm`, `0.5in`.
    pub margin_top: Option<String>,
    pub margin_bottom: Option<String>,
    pub margin_left: Option<String>,
    pub margin_right: Option<String>,
    /// PDF document title.
    pub document_title: Option<String>,
    pub color_mode: Option<ColorMode>,
    pub dpi: Option<u32>,
    /// Generate a sidebar outline.
    pub outline: Option<bool>,
    pub outline_depth: Option<u32>,
    /// Lossless compression of the PDF streams.
    pub use_compression: Option<bool>,
    pub image_dpi: Option<u32>,
    /// JPEG quality, 0–100.
    pub image_quality: Option<u8>,
    /// Added to all page numbers in headers and footers.
    pub page_offset: Option<i32>,
}

impl GlobalSettings {
    fn validate(&self) -> Result<(), Md2PdfError> {
        if self.dpi == Some(0) {
            return Err(Md2PdfError::InvalidConfig("DPI must be ≥ 1".into()));
        }
        if self.image_dpi == Some(0) {
            return Err(Md2PdfError::InvalidConfig("image DPI must be ≥ 1".into()));
        }
        if let Some(q) = self.image_quality {
            if q > 100 {
                return Err(Md2PdfError::InvalidConfig(format!(
                    "image quality must be 0–100, got {q}"
                )));
            }
        }
        Ok(())
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

/// Colour or grayscale output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    Color,
    Grayscale,
}

impl ColorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::Color => "Color",
            ColorMode::Grayscale => "Grayscale",
        }
    }
}

/// Whether output is still written after the converter reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Write whatever bytes the converter produced, even after a failure.
    /// A converter that hit a missing resource usually still emits a usable
    /// document. (default)
    #[default]
    BestEffort,
    /// Leave the output path untouched when the conversion failed.
    SkipWrite,
}
