//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate: legacy `-in/-out/-d/-css/-head/-foot`
//! flags are normalised by [`md2pdf::args`], parsed with clap, mapped to a
//! `RunConfig`, and the run's events are printed to the terminal.
//!
//! Unknown flags are ignored and a repeated flag keeps its last value.
//! Failures are printed; the exit status is success unless clap itself
//! rejects a value (e.g. `--dpi abc`).

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use md2pdf::args::normalize_legacy_args;
use md2pdf::{
    convert_prepared, prepare, write_output, CmarkRenderer, ColorMode, ConversionProgressCallback,
    FailurePolicy, GlobalSettings, MarkdownRenderer, Md2PdfError, Orientation, PdfEngine, Phase,
    ProgressCallback, RunConfig, WkhtmltopdfEngine,
};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Prints converter events: a percentage bar redrawn in place, one line per
/// phase, and every error/warning.
struct CliProgressCallback {
    /// `None` when the bar is disabled; events are still printed.
    bar: Option<ProgressBar>,
}

impl CliProgressCallback {
    fn new(show_bar: bool) -> Arc<Self> {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(100);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Starting");
            bar
        });
        Arc::new(Self { bar })
    }

    fn println(&self, line: String) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_progress(&self, percent: u8) {
        match self.bar {
            Some(ref bar) => bar.set_position(u64::from(percent)),
            None => eprint!("{percent:3}%\r"),
        }
    }

    fn on_phase_changed(&self, phase: &Phase) {
        if let Some(ref bar) = self.bar {
            bar.set_prefix(phase.description.clone());
            bar.set_position(0);
        }
        self.println(format!("{}", phase));
    }

    fn on_error(&self, message: &str) {
        self.println(format!("{} {}", red("Error:"), message));
    }

    fn on_warning(&self, message: &str) {
        self.println(format!("{} {}", yellow("Warning:"), message));
    }

    fn on_conversion_complete(&self, success: bool) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        if !success {
            eprintln!("{}", red("Conversion failed!"));
        }
    }
}

const USAGE: &str = "md2pdf -in inputfile.md -out outputfile.pdf [-css format.css] [-d] \
[-head header.htm] [-foot footer.htm]";

const AFTER_HELP: &str = r#"LEGACY FLAGS:
  The single-dash flags below are matched case-insensitively by prefix
  (-IN, -input and -in are the same flag). Unknown flags are ignored and a
  repeated flag keeps its last value.

  -in <path>     Markdown or HTML input (.htm/.html is used as-is)
  -out <path>    Output PDF                       [default: <in>.pdf]
  -d             Debug: also write the intermediate HTML to <in>.htm
  -css <path>    User stylesheet
  -head <path>   Header HTML
  -foot <path>   Footer HTML                      [default: "Page: [page] of [topage]"]

EXAMPLES:
  # Markdown to PDF next to the source (notes.md.pdf)
  md2pdf -in notes.md

  # Styled, with header and footer
  md2pdf -in doc.md -out report.pdf -css print.css -head header.htm -foot footer.htm

  # Already-rendered HTML, A4 landscape
  md2pdf -in page.html --page-size A4 --orientation landscape

ENVIRONMENT VARIABLES:
  WKHTMLTOPDF_PATH   Path to the wkhtmltopdf executable (default: looked up on PATH)
  RUST_LOG           Override the log filter, e.g. RUST_LOG=md2pdf=debug
"#;

/// Convert Markdown or HTML documents to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown or HTML documents to PDF",
    long_about = "Convert a Markdown document (or ready-made HTML) to PDF. Markdown is rendered \
with pulldown-cmark (tables, hard line wraps, no intra-word emphasis); the HTML is printed to PDF \
by wkhtmltopdf.",
    color = clap::ColorChoice::Auto,
    args_override_self = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown or HTML input file (legacy: -in).
    #[arg(long = "in", value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output PDF file [default: <in>.pdf] (legacy: -out).
    #[arg(long = "out", value_name = "PATH", env = "MD2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Write the intermediate HTML to <in>.htm (legacy: -d).
    #[arg(long, env = "MD2PDF_DEBUG")]
    debug: bool,

    /// User stylesheet (legacy: -css).
    #[arg(long, value_name = "PATH")]
    css: Option<PathBuf>,

    /// Header HTML document (legacy: -head).
    #[arg(long = "head", value_name = "PATH")]
    header: Option<PathBuf>,

    /// Footer HTML document (legacy: -foot).
    #[arg(long = "foot", value_name = "PATH")]
    footer: Option<PathBuf>,

    /// Paper size, e.g. A4, Letter.
    #[arg(long, env = "MD2PDF_PAGE_SIZE")]
    page_size: Option<String>,

    /// Page orientation.
    #[arg(long, env = "MD2PDF_ORIENTATION", value_enum)]
    orientation: Option<OrientationArg>,

    /// Top margin, e.g. 2cm.
    #[arg(long, value_name = "LENGTH")]
    margin_top: Option<String>,

    /// Bottom margin.
    #[arg(long, value_name = "LENGTH")]
    margin_bottom: Option<String>,

    /// Left margin.
    #[arg(long, value_name = "LENGTH")]
    margin_left: Option<String>,

    /// Right margin.
    #[arg(long, value_name = "LENGTH")]
    margin_right: Option<String>,

    /// PDF document title.
    #[arg(long, env = "MD2PDF_TITLE")]
    title: Option<String>,

    /// Print in grayscale.
    #[arg(long)]
    grayscale: bool,

    /// Printing DPI.
    #[arg(long, env = "MD2PDF_DPI",
          value_parser = clap::value_parser!(u32).range(1..=2400))]
    dpi: Option<u32>,

    /// Generate a PDF outline from the headings.
    #[arg(long)]
    outline: bool,

    /// Maximum outline depth.
    #[arg(long, requires = "outline")]
    outline_depth: Option<u32>,

    /// Disable lossless PDF compression.
    #[arg(long)]
    no_compression: bool,

    /// Path to the wkhtmltopdf executable.
    #[arg(long, value_name = "PATH", env = "WKHTMLTOPDF_PATH")]
    wkhtmltopdf: Option<PathBuf>,

    /// Do not write the PDF when the converter reports failure.
    #[arg(long, env = "MD2PDF_SKIP_ON_FAILURE")]
    skip_on_failure: bool,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(long, env = "MD2PDF_QUIET")]
    quiet: bool,

    /// Stray words on the command line are ignored.
    #[arg(hide = true)]
    stray: Vec<OsString>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", red("Error:"), e);
    }
}

async fn run() -> Result<()> {
    let (cli, ignored) = parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());

    // ── Logging setup ────────────────────────────────────────────────────
    // Converter events are printed by the progress callback; library logs
    // only show up on request.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    for token in &ignored {
        debug!("Ignoring unrecognised argument {:?}", token);
    }
    for token in &cli.stray {
        debug!("Ignoring stray argument {:?}", token);
    }

    let chatty = !cli.quiet && !cli.json;
    let renderer = CmarkRenderer::default();
    let engine = WkhtmltopdfEngine::locate(cli.wkhtmltopdf.as_deref());

    if chatty {
        let version = match engine {
            Ok(ref e) => e.version().await,
            Err(_) => None,
        };
        print_banner(renderer.name(), version.as_deref());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let callback: Option<ProgressCallback> = chatty.then(|| {
        CliProgressCallback::new(!cli.no_progress) as Arc<dyn ConversionProgressCallback>
    });

    let config = match build_config(&cli, callback) {
        Ok(config) => config,
        Err(Md2PdfError::NoInput) => {
            eprintln!("No input file specified");
            return Ok(());
        }
        Err(e) => return Err(e).context("Invalid configuration"),
    };

    if chatty {
        if let Some(ref md) = config.markdown_path {
            eprintln!("Input .md: {}", md.display());
        }
        if let Some(ref html) = config.html_path {
            eprintln!("Input .html: {}", html.display());
        }
        eprintln!("Output .pdf: {}", config.output_path.display());
        if let Some(ref css) = config.css_path {
            eprintln!("Input .css: {}", css.display());
        }
        if let Some(ref header) = config.header_path {
            eprintln!("Using html header: {}", header.display());
        }
        if let Some(ref footer) = config.footer_path {
            eprintln!("Using html footer: {}", footer.display());
        }
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let prepared = prepare(&config, &renderer)
        .await
        .context("Cannot read the input")?;
    let engine = engine.context("Cannot start the PDF converter")?;
    let output = convert_prepared(&config, prepared, &engine)
        .await
        .context("Conversion failed")?;
    let stats = write_output(&config, output)
        .await
        .context("Cannot write the PDF")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        if let Some(ref html) = stats.debug_html_path {
            eprintln!("{}", dim(&format!("Intermediate HTML: {}", html.display())));
        }
        if stats.written {
            eprintln!(
                "{}  {} bytes  {}ms  →  {}",
                if stats.succeeded() { green("✔") } else { yellow("⚠") },
                stats.pdf_bytes,
                stats.total_duration_ms,
                bold(&stats.output_path.display().to_string()),
            );
        } else {
            eprintln!(
                "{}  {} not written",
                red("✘"),
                bold(&stats.output_path.display().to_string())
            );
        }
    }

    Ok(())
}

/// Normalise legacy flags, drop unknown options and parse what is left.
///
/// Returns the parsed CLI and the tokens that were dropped.
fn parse_args<I, T>(args: I) -> Result<(Cli, Vec<OsString>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let command = Cli::command();
    let mut known: Vec<&str> = command.get_arguments().filter_map(|a| a.get_long()).collect();
    known.extend(["help", "version"]);

    let normalized = normalize_legacy_args(args).retain_long_options(&known);
    let cli = Cli::try_parse_from(normalized.args)?;
    Ok((cli, normalized.ignored))
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RunConfig, Md2PdfError> {
    let global = GlobalSettings {
        paper_size: cli.page_size.clone(),
        orientation: cli.orientation.map(Into::into),
        margin_top: cli.margin_top.clone(),
        margin_bottom: cli.margin_bottom.clone(),
        margin_left: cli.margin_left.clone(),
        margin_right: cli.margin_right.clone(),
        document_title: cli.title.clone(),
        color_mode: cli.grayscale.then_some(ColorMode::Grayscale),
        dpi: cli.dpi,
        outline: cli.outline.then_some(true),
        outline_depth: cli.outline_depth,
        use_compression: cli.no_compression.then_some(false),
        ..Default::default()
    };

    let mut builder = RunConfig::builder()
        .debug(cli.debug || cfg!(debug_assertions))
        .global(global)
        .failure_policy(if cli.skip_on_failure {
            FailurePolicy::SkipWrite
        } else {
            FailurePolicy::BestEffort
        });

    if let Some(ref p) = cli.input {
        builder = builder.input(p);
    }
    if let Some(ref p) = cli.output {
        builder = builder.output(p);
    }
    if let Some(ref p) = cli.css {
        builder = builder.css(p);
    }
    if let Some(ref p) = cli.header {
        builder = builder.header(p);
    }
    if let Some(ref p) = cli.footer {
        builder = builder.footer(p);
    }
    if let Some(ref p) = cli.wkhtmltopdf {
        builder = builder.wkhtmltopdf_path(p);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build()
}

fn print_banner(renderer: &str, converter_version: Option<&str>) {
    let rule = "#".repeat(77);
    eprintln!("{}", dim(&rule));
    eprintln!("#  {} {}", bold("md2pdf"), env!("CARGO_PKG_VERSION"));
    eprintln!("#  Uses:");
    eprintln!("#    Markdown renderer: {renderer}");
    eprintln!(
        "#    PDF converter:     {}",
        converter_version.unwrap_or("wkhtmltopdf (not found)")
    );
    eprintln!("#  Usage:");
    eprintln!("#    {USAGE}");
    eprintln!("{}", dim(&rule));
}
