//! Results of a conversion run.

use crate::error::EngineFailure;
use crate::pipeline::input::InputKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The PDF produced by [`crate::convert::convert`] plus run statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// PDF bytes as returned by the converter.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub stats: ConversionStats,
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub input_kind: Option<InputKind>,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Intermediate HTML written in debug mode.
    pub debug_html_path: Option<PathBuf>,
    /// Size of the HTML handed to the converter.
    pub html_bytes: usize,
    /// Size of the PDF returned by the converter.
    pub pdf_bytes: usize,
    /// Set when the converter reported failure.
    pub engine_failure: Option<EngineFailure>,
    /// Whether the PDF was written to `output_path`.
    pub written: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub render_duration_ms: u64,
    pub convert_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    /// The converter reported success.
    pub fn succeeded(&self) -> bool {
        self.engine_failure.is_none()
    }
}
