//! Conversion entry points.
//!
//! A run is a fixed sequence: resolve input → render (Markdown only) or load
//! (HTML) → build converter settings → convert → write. There are no retries
//! and no branching back.
//!
//! Every entry point has a `_with` form that takes the renderer and the
//! converter explicitly, so a run can be driven by test doubles; the plain
//! forms use [`CmarkRenderer`] and a located [`WkhtmltopdfEngine`].
//!
//! The same stages are available one by one: [`prepare`] (steps 1–2),
//! [`convert_prepared`] (3–4) and [`write_output`] (5).

use crate::config::{FailurePolicy, RunConfig};
use crate::error::Md2PdfError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::engine::{ConversionJob, EngineStatus, PdfEngine, WkhtmltopdfEngine};
use crate::pipeline::input::{self, DocumentBuffer, DocumentOrigin, InputKind, InputSource};
use crate::pipeline::markdown::{CmarkRenderer, MarkdownRenderer};
use crate::pipeline::{settings, write};
use crate::progress::{ConversionProgressCallback, NoopProgressCallback};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The input read (and, for Markdown, rendered), ready for the converter.
///
/// Produced by [`prepare`]; no converter is involved yet.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub source: InputSource,
    pub document: DocumentBuffer,
    /// Intermediate HTML written in debug mode.
    pub debug_html_path: Option<PathBuf>,
    pub render_duration_ms: u64,
    started: Instant,
}

/// Convert the configured input to PDF bytes without writing them.
///
/// The input is read before the converter is located, so a missing input
/// is reported as such even when the converter is missing too.
///
/// # Errors
/// Returns `Err(Md2PdfError)` only for fatal errors: the input cannot be
/// read, the converter cannot be found or started. A conversion the
/// converter reports as failed still returns `Ok`; check
/// `output.stats.engine_failure`.
pub async fn convert(config: &RunConfig) -> Result<ConversionOutput, Md2PdfError> {
    let prepared = prepare(config, &CmarkRenderer::default()).await?;
    let engine = WkhtmltopdfEngine::locate(config.wkhtmltopdf_path.as_deref())?;
    convert_prepared(config, prepared, &engine).await
}

/// [`convert`] with an explicit renderer and converter.
pub async fn convert_with<R, E>(
    config: &RunConfig,
    renderer: &R,
    engine: &E,
) -> Result<ConversionOutput, Md2PdfError>
where
    R: MarkdownRenderer + ?Sized,
    E: PdfEngine + ?Sized,
{
    let prepared = prepare(config, renderer).await?;
    convert_prepared(config, prepared, engine).await
}

/// Resolve, read and (for Markdown) render the input.
pub async fn prepare<R>(config: &RunConfig, renderer: &R) -> Result<PreparedDocument, Md2PdfError>
where
    R: MarkdownRenderer + ?Sized,
{
    let started = Instant::now();

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let source = input::resolve_input(config)?;
    info!("Starting conversion: {}", source.path.display());
    debug!("Output PDF: {}", config.output_path.display());

    // ── Step 2: Render or load ───────────────────────────────────────────
    let render_start = Instant::now();
    let (document, debug_html_path) = load_document(config, &source, renderer).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "{} {} bytes of HTML in {}ms",
        match document.origin() {
            DocumentOrigin::Rendered => "Rendered",
            DocumentOrigin::Loaded => "Loaded",
        },
        document.len(),
        render_duration_ms
    );

    Ok(PreparedDocument {
        source,
        document,
        debug_html_path,
        render_duration_ms,
        started,
    })
}

/// Run the converter on a [`PreparedDocument`].
pub async fn convert_prepared<E>(
    config: &RunConfig,
    prepared: PreparedDocument,
    engine: &E,
) -> Result<ConversionOutput, Md2PdfError>
where
    E: PdfEngine + ?Sized,
{
    let PreparedDocument {
        source,
        document,
        debug_html_path,
        render_duration_ms,
        started,
    } = prepared;
    let html_bytes = document.len();

    // ── Step 3: Converter settings ───────────────────────────────────────
    let settings = settings::build_settings(config)?;
    debug!("Converter settings: {:?}", settings);

    // ── Step 4: Convert ──────────────────────────────────────────────────
    let noop = NoopProgressCallback;
    let callback: &dyn ConversionProgressCallback = match config.progress_callback.as_deref() {
        Some(cb) => cb,
        None => &noop,
    };

    let convert_start = Instant::now();
    callback.on_conversion_start();
    let output = engine.convert(ConversionJob { settings, document }, callback).await?;
    callback.on_conversion_complete(output.status.is_success());
    let convert_duration_ms = convert_start.elapsed().as_millis() as u64;

    if let EngineStatus::Failed(ref failure) = output.status {
        warn!("Conversion failed! ({})", failure);
    }

    let stats = ConversionStats {
        input_kind: Some(source.kind),
        input_path: source.path,
        output_path: config.output_path.clone(),
        debug_html_path,
        html_bytes,
        pdf_bytes: output.pdf.len(),
        engine_failure: output.status.failure().cloned(),
        written: false,
        warnings: output.diagnostics.warnings,
        errors: output.diagnostics.errors,
        render_duration_ms,
        convert_duration_ms,
        total_duration_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} bytes of PDF, {}ms total",
        stats.pdf_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        pdf: output.pdf,
        stats,
    })
}

/// Convert and write the PDF to `config.output_path`.
///
/// When the converter reports failure the write follows
/// `config.failure_policy`: [`FailurePolicy::BestEffort`] writes whatever
/// was produced, [`FailurePolicy::SkipWrite`] leaves the output untouched.
pub async fn convert_to_file(config: &RunConfig) -> Result<ConversionStats, Md2PdfError> {
    let output = convert(config).await?;
    write_output(config, output).await
}

/// [`convert_to_file`] with an explicit renderer and converter.
pub async fn convert_to_file_with<R, E>(
    config: &RunConfig,
    renderer: &R,
    engine: &E,
) -> Result<ConversionStats, Md2PdfError>
where
    R: MarkdownRenderer + ?Sized,
    E: PdfEngine + ?Sized,
{
    let output = convert_with(config, renderer, engine).await?;
    write_output(config, output).await
}

/// Step 5: write the converter output per `config.failure_policy`.
pub async fn write_output(
    config: &RunConfig,
    output: ConversionOutput,
) -> Result<ConversionStats, Md2PdfError> {
    let mut stats = output.stats;

    let should_write = match (&stats.engine_failure, config.failure_policy) {
        (None, _) => true,
        (Some(_), FailurePolicy::BestEffort) => {
            warn!(
                "Writing {} bytes of converter output despite the failure",
                stats.pdf_bytes
            );
            true
        }
        (Some(_), FailurePolicy::SkipWrite) => {
            warn!(
                "Not writing '{}' because the conversion failed",
                config.output_path.display()
            );
            false
        }
    };

    if should_write {
        write::write_pdf(&config.output_path, output.pdf).await?;
        stats.written = true;
        info!("Wrote {}", config.output_path.display());
    }

    Ok(stats)
}

/// Synchronous wrapper around [`convert_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(config: &RunConfig) -> Result<ConversionStats, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_to_file(config))
}

/// Read the input and produce the HTML document handed to the converter.
///
/// Markdown is rendered (and, in debug mode, dumped to
/// `config.debug_html_path`); HTML is used as-is. Returns the document and
/// the debug dump path if one was written.
pub async fn load_document<R>(
    config: &RunConfig,
    source: &InputSource,
    renderer: &R,
) -> Result<(DocumentBuffer, Option<PathBuf>), Md2PdfError>
where
    R: MarkdownRenderer + ?Sized,
{
    let bytes = input::read_input(&source.path).await?;

    match source.kind {
        InputKind::Html => Ok((DocumentBuffer::new(bytes, DocumentOrigin::Loaded), None)),
        InputKind::Markdown => {
            let html = renderer.render(&bytes)?;
            let mut dumped = None;
            if config.debug {
                if let Some(ref path) = config.debug_html_path {
                    if write::write_debug_html(path, &html).await {
                        dumped = Some(path.clone());
                    }
                }
            }
            Ok((DocumentBuffer::new(html, DocumentOrigin::Rendered), dumped))
        }
    }
}
