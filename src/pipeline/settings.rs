//! Converter settings: map a [`RunConfig`] onto named global and object
//! settings.
//!
//! Setting names follow libwkhtmltox (`size.paperSize`, `footer.center`,
//! `web.userStyleSheet`, …). The engine translates them into command-line
//! switches when it starts the converter; this module only decides *which*
//! settings a run uses.

use crate::config::{RunConfig, DEFAULT_FOOTER_TEXT};
use crate::error::Md2PdfError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

// ── Global setting names ─────────────────────────────────────────────────
pub const PAPER_SIZE: &str = "size.paperSize";
pub const ORIENTATION: &str = "orientation";
pub const MARGIN_TOP: &str = "margin.top";
pub const MARGIN_BOTTOM: &str = "margin.bottom";
pub const MARGIN_LEFT: &str = "margin.left";
pub const MARGIN_RIGHT: &str = "margin.right";
pub const DOCUMENT_TITLE: &str = "documentTitle";
pub const COLOR_MODE: &str = "colorMode";
pub const DPI: &str = "dpi";
pub const OUTLINE: &str = "outline";
pub const OUTLINE_DEPTH: &str = "outlineDepth";
pub const USE_COMPRESSION: &str = "useCompression";
pub const IMAGE_DPI: &str = "imageDPI";
pub const IMAGE_QUALITY: &str = "imageQuality";
pub const PAGE_OFFSET: &str = "pageOffset";

// ── Object setting names ─────────────────────────────────────────────────
pub const HEADER_HTML_URL: &str = "header.htmlUrl";
pub const FOOTER_HTML_URL: &str = "footer.htmlUrl";
pub const FOOTER_CENTER: &str = "footer.center";
pub const USER_STYLE_SHEET: &str = "web.userStyleSheet";
pub const DEFAULT_ENCODING: &str = "web.defaultEncoding";
pub const BLOCK_LOCAL_FILE_ACCESS: &str = "load.blockLocalFileAccess";

/// Global (converter-wide) and object (per-document) settings of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterSettings {
    pub global: BTreeMap<String, String>,
    pub object: BTreeMap<String, String>,
}

impl ConverterSettings {
    pub fn set_global(&mut self, name: &str, value: impl Into<String>) {
        self.global.insert(name.to_string(), value.into());
    }

    pub fn set_object(&mut self, name: &str, value: impl Into<String>) {
        self.object.insert(name.to_string(), value.into());
    }

    pub fn global_setting(&self, name: &str) -> Option<&str> {
        self.global.get(name).map(String::as_str)
    }

    pub fn object_setting(&self, name: &str) -> Option<&str> {
        self.object.get(name).map(String::as_str)
    }
}

/// Build the converter settings for a run.
///
/// Object settings:
/// * footer HTML → `footer.htmlUrl`, otherwise `footer.center` =
///   [`DEFAULT_FOOTER_TEXT`]
/// * header HTML → `header.htmlUrl`
/// * CSS → `web.userStyleSheet`
/// * always `web.defaultEncoding = utf-8` and local file access enabled
///
/// Global settings are only present for fields set in
/// [`crate::config::GlobalSettings`].
///
/// # Errors
/// [`Md2PdfError::NonUtf8Path`] if a header/footer/CSS path is not UTF-8.
pub fn build_settings(config: &RunConfig) -> Result<ConverterSettings, Md2PdfError> {
    let mut s = ConverterSettings::default();

    // Object settings
    if let Some(ref header) = config.header_path {
        let header = path_setting(header)?;
        debug!("Using html header: {}", header);
        s.set_object(HEADER_HTML_URL, header);
    }

    match config.footer_path {
        Some(ref footer) => {
            let footer = path_setting(footer)?;
            debug!("Using html footer: {}", footer);
            s.set_object(FOOTER_HTML_URL, footer);
        }
        None => s.set_object(FOOTER_CENTER, DEFAULT_FOOTER_TEXT),
    }

    if let Some(ref css) = config.css_path {
        s.set_object(USER_STYLE_SHEET, path_setting(css)?);
    }

    s.set_object(DEFAULT_ENCODING, "utf-8");
    s.set_object(BLOCK_LOCAL_FILE_ACCESS, "false");

    // Global settings
    let g = &config.global;
    let text_settings = [
        (PAPER_SIZE, &g.paper_size),
        (MARGIN_TOP, &g.margin_top),
        (MARGIN_BOTTOM, &g.margin_bottom),
        (MARGIN_LEFT, &g.margin_left),
        (MARGIN_RIGHT, &g.margin_right),
        (DOCUMENT_TITLE, &g.document_title),
    ];
    for (name, value) in text_settings {
        if let Some(v) = value {
            s.set_global(name, v.as_str());
        }
    }
    if let Some(o) = g.orientation {
        s.set_global(ORIENTATION, o.as_str());
    }
    if let Some(c) = g.color_mode {
        s.set_global(COLOR_MODE, c.as_str());
    }
    if let Some(v) = g.dpi {
        s.set_global(DPI, v.to_string());
    }
    if let Some(v) = g.outline {
        s.set_global(OUTLINE, bool_setting(v));
    }
    if let Some(v) = g.outline_depth {
        s.set_global(OUTLINE_DEPTH, v.to_string());
    }
    if let Some(v) = g.use_compression {
        s.set_global(USE_COMPRESSION, bool_setting(v));
    }
    if let Some(v) = g.image_dpi {
        s.set_global(IMAGE_DPI, v.to_string());
    }
    if let Some(v) = g.image_quality {
        s.set_global(IMAGE_QUALITY, v.to_string());
    }
    if let Some(v) = g.page_offset {
        s.set_global(PAGE_OFFSET, v.to_string());
    }

    Ok(s)
}

fn path_setting(path: &Path) -> Result<String, Md2PdfError> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| Md2PdfError::NonUtf8Path {
            path: path.to_path_buf(),
        })
}

fn bool_setting(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}
