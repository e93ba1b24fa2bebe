//! Input resolution: decide what kind of document the run starts from and
//! load its bytes.
//!
//! The decision itself was made when the [`RunConfig`] was built (by file
//! extension); this stage turns it into an [`InputSource`] and reads the file,
//! mapping I/O failures onto [`Md2PdfError`] variants that name the path.

use crate::config::RunConfig;
use crate::error::Md2PdfError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What the input file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InputKind {
    /// Markdown that must be rendered to HTML first.
    Markdown,
    /// HTML used directly.
    Html,
}

/// The resolved input: its kind and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    pub kind: InputKind,
    pub path: PathBuf,
}

/// Where the HTML handed to the converter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrigin {
    /// Produced by the Markdown renderer.
    Rendered,
    /// Read verbatim from an HTML input file.
    Loaded,
}

/// An owned HTML document, consumed exactly once by the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBuffer {
    bytes: Vec<u8>,
    origin: DocumentOrigin,
}

impl DocumentBuffer {
    pub fn new(bytes: Vec<u8>, origin: DocumentOrigin) -> Self {
        Self { bytes, origin }
    }

    pub fn origin(&self) -> DocumentOrigin {
        self.origin
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Release the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Pick the input out of a [`RunConfig`]. Markdown takes precedence.
pub fn resolve_input(config: &RunConfig) -> Result<InputSource, Md2PdfError> {
    if let Some(ref path) = config.markdown_path {
        return Ok(InputSource {
            kind: InputKind::Markdown,
            path: path.clone(),
        });
    }
    if let Some(ref path) = config.html_path {
        return Ok(InputSource {
            kind: InputKind::Html,
            path: path.clone(),
        });
    }
    Err(Md2PdfError::NoInput)
}

/// Read the whole input file.
pub async fn read_input(path: &Path) -> Result<Vec<u8>, Md2PdfError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| map_read_error(path, e))?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn map_read_error(path: &Path, e: std::io::Error) -> Md2PdfError {
    match e.kind() {
        ErrorKind::NotFound => Md2PdfError::InputNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => Md2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Md2PdfError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    }
}
