//! HTML → PDF conversion through an external converter.
//!
//! [`PdfEngine`] is the seam between the pipeline and the converter: it takes
//! one [`ConversionJob`] (settings + HTML document) and returns the PDF bytes
//! together with the converter's verdict. [`WkhtmltopdfEngine`] implements it
//! by running the `wkhtmltopdf` executable: the document goes in on stdin,
//! the PDF comes back on stdout, and stderr is parsed into progress events
//! by [`crate::pipeline::diagnostics`].
//!
//! A failed conversion is *not* an `Err`: the converter frequently produces a
//! usable document even when it reports a failure (a missing image, say), so
//! the verdict travels in [`EngineStatus`] and the caller's
//! [`crate::config::FailurePolicy`] decides what happens next.

use crate::error::{EngineFailure, Md2PdfError};
use crate::pipeline::diagnostics::{Diagnostics, EventDispatcher};
use crate::pipeline::input::DocumentBuffer;
use crate::pipeline::settings::{self, ConverterSettings};
use crate::progress::ConversionProgressCallback;
use futures::future::{BoxFuture, FutureExt};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit `wkhtmltopdf` executable.
pub const WKHTMLTOPDF_PATH_ENV: &str = "WKHTMLTOPDF_PATH";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "wkhtmltopdf.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "wkhtmltopdf";

/// Everything the converter needs for one run.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub settings: ConverterSettings,
    pub document: DocumentBuffer,
}

/// The converter's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Succeeded,
    Failed(EngineFailure),
}

impl EngineStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, EngineStatus::Succeeded)
    }

    pub fn failure(&self) -> Option<&EngineFailure> {
        match self {
            EngineStatus::Succeeded => None,
            EngineStatus::Failed(f) => Some(f),
        }
    }
}

/// What the converter produced.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// The PDF bytes. May be empty or partial when `status` is a failure.
    pub pdf: Vec<u8>,
    pub status: EngineStatus,
    pub diagnostics: Diagnostics,
}

/// An HTML → PDF converter.
pub trait PdfEngine: Send + Sync {
    /// Run one conversion to completion.
    ///
    /// Progress, phase, error and warning events are reported to `callback`
    /// while the conversion runs.
    ///
    /// # Errors
    /// Only when the converter cannot be started or talked to. A conversion
    /// the converter itself reports as failed is returned as
    /// `Ok(EngineOutput { status: EngineStatus::Failed(..), .. })`.
    fn convert<'a>(
        &'a self,
        job: ConversionJob,
        callback: &'a dyn ConversionProgressCallback,
    ) -> BoxFuture<'a, Result<EngineOutput, Md2PdfError>>;

    /// Converter version string for the startup banner, if known.
    fn version(&self) -> BoxFuture<'_, Option<String>> {
        async { None }.boxed()
    }
}

/// Runs the `wkhtmltopdf` executable.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfEngine {
    program: PathBuf,
}

impl WkhtmltopdfEngine {
    /// Use `program` as-is, without checking that it exists.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find the executable: `explicit` path, then `WKHTMLTOPDF_PATH`, then
    /// the directories on `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, Md2PdfError> {
        if let Some(path) = explicit {
            return Self::existing(path);
        }

        if let Some(path) = std::env::var_os(WKHTMLTOPDF_PATH_ENV).filter(|p| !p.is_empty()) {
            return Self::existing(Path::new(&path));
        }

        let path_var = std::env::var_os("PATH").unwrap_or_default();
        std::env::split_paths(&path_var)
            .map(|dir| dir.join(EXECUTABLE_NAME))
            .find(|candidate| candidate.is_file())
            .map(|program| {
                debug!("Found converter at {}", program.display());
                Self { program }
            })
            .ok_or_else(|| {
                Md2PdfError::EngineUnavailable(format!("'{EXECUTABLE_NAME}' was not found on PATH"))
            })
    }

    fn existing(path: &Path) -> Result<Self, Md2PdfError> {
        if path.is_file() {
            Ok(Self::new(path))
        } else {
            Err(Md2PdfError::EngineUnavailable(format!(
                "'{}' does not exist or is not a file",
                path.display()
            )))
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn run(
        &self,
        job: ConversionJob,
        callback: &dyn ConversionProgressCallback,
    ) -> Result<EngineOutput, Md2PdfError> {
        let args = settings_to_args(&job.settings);
        debug!("Running {} {:?}", self.program.display(), args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .arg("-")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    Md2PdfError::EngineUnavailable(format!("{}: {}", self.program.display(), e))
                }
                _ => Md2PdfError::EngineIo(e),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Md2PdfError::Internal("converter stdin was not captured".into()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Md2PdfError::Internal("converter stdout was not captured".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Md2PdfError::Internal("converter stderr was not captured".into()))?;

        let document = job.document.into_bytes();
        let mut dispatcher = EventDispatcher::new(callback);

        let feed_stdin = async move {
            stdin.write_all(&document).await?;
            stdin.shutdown().await
        };

        let read_stdout = async move {
            let mut pdf = Vec::new();
            stdout.read_to_end(&mut pdf).await.map(|_| pdf)
        };

        let read_stderr = async {
            let mut chunk = [0u8; 4096];
            loop {
                let n = stderr.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                dispatcher.feed(&chunk[..n]);
            }
            Ok::<(), std::io::Error>(())
        };

        let (fed, pdf, drained) = tokio::join!(feed_stdin, read_stdout, read_stderr);

        // The converter may exit before consuming all input; its exit status
        // says what went wrong.
        match fed {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                warn!("Converter closed its input early");
            }
            other => other.map_err(Md2PdfError::EngineIo)?,
        }
        drained.map_err(Md2PdfError::EngineIo)?;
        let pdf = pdf.map_err(Md2PdfError::EngineIo)?;

        let exit = child.wait().await.map_err(Md2PdfError::EngineIo)?;
        let status = match exit.code() {
            Some(0) => EngineStatus::Succeeded,
            Some(code) => EngineStatus::Failed(EngineFailure::Exited { code }),
            None => EngineStatus::Failed(EngineFailure::Terminated),
        };
        info!("Converter finished ({:?}), {} bytes of PDF", status, pdf.len());

        Ok(EngineOutput {
            pdf,
            status,
            diagnostics: dispatcher.finish(),
        })
    }
}

impl PdfEngine for WkhtmltopdfEngine {
    fn convert<'a>(
        &'a self,
        job: ConversionJob,
        callback: &'a dyn ConversionProgressCallback,
    ) -> BoxFuture<'a, Result<EngineOutput, Md2PdfError>> {
        self.run(job, callback).boxed()
    }

    fn version(&self) -> BoxFuture<'_, Option<String>> {
        async move {
            let output = Command::new(&self.program)
                .arg("--version")
                .stdin(Stdio::null())
                .output()
                .await
                .ok()?;
            let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (!text.is_empty()).then_some(text)
        }
        .boxed()
    }
}

/// Translate named settings into `wkhtmltopdf` command-line switches.
///
/// Global switches come first, then object switches. Unknown names are
/// skipped with a warning.
pub fn settings_to_args(settings: &ConverterSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let all = settings.global.iter().chain(settings.object.iter());

    for (name, value) in all {
        let switches = switches_for(name, value);
        if switches.is_empty() && !is_no_op(name, value) {
            warn!("Ignoring unsupported converter setting {name}={value}");
        }
        args.extend(switches.into_iter().map(OsString::from));
    }
    args
}

fn switches_for(name: &str, value: &str) -> Vec<String> {
    let with_value = |flag: &str| vec![flag.to_string(), value.to_string()];
    let is_true = value.eq_ignore_ascii_case("true");

    match name {
        settings::PAPER_SIZE => with_value("--page-size"),
        settings::ORIENTATION => with_value("--orientation"),
        settings::MARGIN_TOP => with_value("--margin-top"),
        settings::MARGIN_BOTTOM => with_value("--margin-bottom"),
        settings::MARGIN_LEFT => with_value("--margin-left"),
        settings::MARGIN_RIGHT => with_value("--margin-right"),
        settings::DOCUMENT_TITLE => with_value("--title"),
        settings::COLOR_MODE if value.eq_ignore_ascii_case("grayscale") => {
            vec!["--grayscale".into()]
        }
        settings::DPI => with_value("--dpi"),
        settings::OUTLINE if is_true => vec!["--outline".into()],
        settings::OUTLINE => vec!["--no-outline".into()],
        settings::OUTLINE_DEPTH => with_value("--outline-depth"),
        settings::USE_COMPRESSION if !is_true => vec!["--no-pdf-compression".into()],
        settings::IMAGE_DPI => with_value("--image-dpi"),
        settings::IMAGE_QUALITY => with_value("--image-quality"),
        settings::PAGE_OFFSET => with_value("--page-offset"),
        settings::HEADER_HTML_URL => with_value("--header-html"),
        settings::FOOTER_HTML_URL => with_value("--footer-html"),
        settings::FOOTER_CENTER => with_value("--footer-center"),
        settings::USER_STYLE_SHEET => with_value("--user-style-sheet"),
        settings::DEFAULT_ENCODING => with_value("--encoding"),
        settings::BLOCK_LOCAL_FILE_ACCESS if is_true => {
            vec!["--disable-local-file-access".into()]
        }
        settings::BLOCK_LOCAL_FILE_ACCESS => vec!["--enable-local-file-access".into()],
        _ => Vec::new(),
    }
}

/// Settings whose value matches the converter default and map to no switch.
fn is_no_op(name: &str, value: &str) -> bool {
    match name {
        settings::COLOR_MODE => value.eq_ignore_ascii_case("color"),
        settings::USE_COMPRESSION => value.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(settings: &ConverterSettings) -> Vec<String> {
        settings_to_args(settings)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn object_settings_translate_to_switches() {
        let mut s = ConverterSettings::default();
        s.set_object(settings::HEADER_HTML_URL, "h.htm");
        s.set_object(settings::FOOTER_CENTER, "Page: [page] of [topage]");
        s.set_object(settings::USER_STYLE_SHEET, "style.css");
        s.set_object(settings::DEFAULT_ENCODING, "utf-8");
        s.set_object(settings::BLOCK_LOCAL_FILE_ACCESS, "false");

        let args = args_of(&s);
        let expect_pair = |flag: &str, value: &str| {
            let i = args
                .iter()
                .position(|a| a == flag)
                .unwrap_or_else(|| panic!("{flag} missing from {args:?}"));
            assert_eq!(args[i + 1], value);
        };
        expect_pair("--header-html", "h.htm");
        expect_pair("--footer-center", "Page: [page] of [topage]");
        expect_pair("--user-style-sheet", "style.css");
        expect_pair("--encoding", "utf-8");
        assert!(args.contains(&"--enable-local-file-access".to_string()));
    }

    #[test]
    fn boolean_global_settings() {
        let mut s = ConverterSettings::default();
        s.set_global(settings::OUTLINE, "false");
        s.set_global(settings::USE_COMPRESSION, "false");
        s.set_global(settings::COLOR_MODE, "Grayscale");
        let args = args_of(&s);
        assert!(args.contains(&"--no-outline".to_string()));
        assert!(args.contains(&"--no-pdf-compression".to_string()));
        assert!(args.contains(&"--grayscale".to_string()));

        let mut s = ConverterSettings::default();
        s.set_global(settings::OUTLINE, "true");
        s.set_global(settings::USE_COMPRESSION, "true");
        s.set_global(settings::COLOR_MODE, "Color");
        assert_eq!(args_of(&s), vec!["--outline".to_string()]);
    }

    #[test]
    fn valued_global_settings() {
        let mut s = ConverterSettings::default();
        s.set_global(settings::PAPER_SIZE, "Letter");
        s.set_global(settings::ORIENTATION, "Landscape");
        s.set_global(settings::MARGIN_TOP, "2cm");
        s.set_global(settings::DPI, "300");
        let args = args_of(&s);
        // BTreeMap order: dpi, margin.top, orientation, size.paperSize
        assert_eq!(
            args,
            vec![
                "--dpi", "300", "--margin-top", "2cm", "--orientation", "Landscape",
                "--page-size", "Letter"
            ]
        );
    }

    #[test]
    fn global_switches_precede_object_switches() {
        let mut s = ConverterSettings::default();
        s.set_object(settings::FOOTER_CENTER, "x");
        s.set_global(settings::DOCUMENT_TITLE, "T");
        let args = args_of(&s);
        assert_eq!(args, vec!["--title", "T", "--footer-center", "x"]);
    }

    #[test]
    fn unknown_settings_are_skipped() {
        let mut s = ConverterSettings::default();
        s.set_object("toc.useDottedLines", "true");
        assert!(args_of(&s).is_empty());
    }

    #[test]
    fn locate_rejects_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-wkhtmltopdf");
        assert!(matches!(
            WkhtmltopdfEngine::locate(Some(&missing)),
            Err(Md2PdfError::EngineUnavailable(_))
        ));
    }

    #[test]
    fn locate_accepts_existing_explicit_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let engine = WkhtmltopdfEngine::locate(Some(file.path())).unwrap();
        assert_eq!(engine.program(), file.path());
    }

    #[tokio::test]
    async fn spawning_missing_program_is_engine_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = WkhtmltopdfEngine::new(dir.path().join("missing-wkhtmltopdf"));
        let job = ConversionJob {
            settings: ConverterSettings::default(),
            document: DocumentBuffer::new(
                b"<p>x</p>".to_vec(),
                crate::pipeline::input::DocumentOrigin::Loaded,
            ),
        };
        let err = engine
            .convert(job, &crate::progress::NoopProgressCallback)
            .await
            .unwrap_err();
        assert!(matches!(err, Md2PdfError::EngineUnavailable(_)), "got {err:?}");
    }

    #[test]
    fn status_helpers() {
        assert!(EngineStatus::Succeeded.is_success());
        let failed = EngineStatus::Failed(EngineFailure::Exited { code: 1 });
        assert!(!failed.is_success());
        assert_eq!(failed.failure(), Some(&EngineFailure::Exited { code: 1 }));
    }
}
