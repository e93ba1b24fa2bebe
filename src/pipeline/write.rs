//! Output writing: the final PDF and the optional debug HTML dump.
//!
//! The PDF is written to a temporary file in the destination directory and
//! then renamed over the target, so a failed write never leaves a truncated
//! PDF behind. Missing parent directories are an error, not created.

use crate::error::Md2PdfError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Write `bytes` to `path`, replacing any existing file.
pub async fn write_pdf(path: &Path, bytes: Vec<u8>) -> Result<(), Md2PdfError> {
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
        .await
        .map_err(|e| Md2PdfError::Internal(format!("Write task panicked: {}", e)))?
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Md2PdfError> {
    let err = |source: std::io::Error| Md2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir: PathBuf = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".md2pdf-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(err)?;
    tmp.write_all(bytes).map_err(err)?;
    tmp.flush().map_err(err)?;

    // Temp files are created owner-only; keep the target's mode instead.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)
            .map(|m| m.permissions().mode())
            .unwrap_or(0o644);
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))
            .map_err(err)?;
    }

    tmp.persist(path).map_err(|e| err(e.error))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Dump the intermediate HTML. Failure is reported and otherwise ignored.
///
/// Returns whether the file was written.
pub async fn write_debug_html(path: &Path, html: &[u8]) -> bool {
    match tokio::fs::write(path, html).await {
        Ok(()) => {
            debug!("Wrote intermediate HTML to {}", path.display());
            true
        }
        Err(e) => {
            warn!("Unable to open output htm file '{}': {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        write_pdf(&path, b"%PDF-1.4\n\x00\xff".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4\n\x00\xff");
    }

    #[tokio::test]
    async fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"old and longer contents").unwrap();
        write_pdf(&path, b"new".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn missing_directory_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.pdf");
        let err = write_pdf(&path, b"x".to_vec()).await.unwrap_err();
        assert!(matches!(err, Md2PdfError::OutputWriteFailed { .. }));
        assert!(!dir.path().join("no").exists());
    }

    #[tokio::test]
    async fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(&dir.path().join("a.pdf"), b"x".to_vec()).await.unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.pdf")]);
    }

    #[tokio::test]
    async fn debug_html_failure_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!write_debug_html(&dir.path().join("missing/x.htm"), b"<p/>").await);
        let ok = dir.path().join("x.htm");
        assert!(write_debug_html(&ok, b"<p/>").await);
        assert_eq!(std::fs::read(ok).unwrap(), b"<p/>");
    }
}
