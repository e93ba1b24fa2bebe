//! Converter diagnostics: turn the converter's stderr into events.
//!
//! wkhtmltopdf reports its progress on stderr as a mix of phase headers,
//! redrawn progress bars (separated by `\r`) and `Warning:` / `Error:` lines:
//!
//! ```text
//! Loading pages (1/6)
//! [==============================>                             ] 50%
//! Warning: Failed to load file:///missing.png (ignore)
//! Printing pages (6/6)
//! [============================================================] Page 2 of 2
//! Done
//! ```
//!
//! [`parse_line`] classifies one line; [`EventDispatcher`] splits a raw byte
//! stream into lines, forwards the events to a
//! [`ConversionProgressCallback`] and keeps the warnings and errors.

use crate::progress::{ConversionProgressCallback, Phase};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static PHASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z ]*?) \((\d+)/(\d+)\)$").unwrap());

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[=> ]*\]\s*(\d{1,3})%$").unwrap());

static COUNTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[=> ]*\]\s*(?:Page|Object) (\d+) of (\d+)$").unwrap());

static NETWORK_EXIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Exit with code \d+ due to .+$").unwrap());

/// One classified diagnostics line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(u8),
    Phase(Phase),
    Warning(String),
    Error(String),
}

/// Classify a single stderr line. Returns `None` for lines that carry no
/// event (blank lines, `Preparing` bars, unrecognised chatter).
pub fn parse_line(line: &str) -> Option<EngineEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(msg) = line.strip_prefix("Warning:") {
        return Some(EngineEvent::Warning(msg.trim().to_string()));
    }
    if let Some(msg) = line.strip_prefix("Error:") {
        return Some(EngineEvent::Error(msg.trim().to_string()));
    }
    if NETWORK_EXIT_RE.is_match(line) {
        return Some(EngineEvent::Error(line.to_string()));
    }
    if line == "Done" {
        return Some(EngineEvent::Phase(Phase::named("Done")));
    }

    if let Some(caps) = PHASE_RE.captures(line) {
        return Some(EngineEvent::Phase(Phase {
            index: caps[2].parse().ok(),
            total: caps[3].parse().ok(),
            description: caps[1].to_string(),
        }));
    }

    if let Some(caps) = PERCENT_RE.captures(line) {
        let percent: u32 = caps[1].parse().ok()?;
        return Some(EngineEvent::Progress(percent.min(100) as u8));
    }

    if let Some(caps) = COUNTER_RE.captures(line) {
        let done: u64 = caps[1].parse().ok()?;
        let total: u64 = caps[2].parse().ok()?;
        if total == 0 {
            return None;
        }
        let percent = (done.min(total) * 100 / total) as u8;
        return Some(EngineEvent::Progress(percent));
    }

    None
}

/// Warnings, errors and phases collected during one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub phases: Vec<Phase>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Splits converter stderr into lines and dispatches the events.
pub struct EventDispatcher<'a> {
    callback: &'a dyn ConversionProgressCallback,
    pending: Vec<u8>,
    last_progress: Option<u8>,
    diagnostics: Diagnostics,
}

impl<'a> EventDispatcher<'a> {
    pub fn new(callback: &'a dyn ConversionProgressCallback) -> Self {
        Self {
            callback,
            pending: Vec::new(),
            last_progress: None,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Feed a chunk of raw stderr. Complete lines (ended by `\n` or `\r`)
    /// are dispatched immediately; the remainder waits for the next chunk.
    pub fn feed(&mut self, chunk: &[u8]) {
        for &b in chunk {
            if b == b'\n' || b == b'\r' {
                self.flush_line();
            } else {
                self.pending.push(b);
            }
        }
    }

    /// Dispatch any trailing partial line and return what was collected.
    pub fn finish(mut self) -> Diagnostics {
        self.flush_line();
        self.diagnostics
    }

    fn flush_line(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();

        match parse_line(&line) {
            Some(event) => self.dispatch(event),
            None => debug!("converter: {}", line.trim()),
        }
    }

    /// Forward one event to the callback and record it.
    pub fn dispatch(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Progress(p) => {
                if self.last_progress != Some(p) {
                    self.last_progress = Some(p);
                    self.callback.on_progress(p);
                }
            }
            EngineEvent::Phase(phase) => {
                debug!("Converter phase: {}", phase);
                self.last_progress = None;
                self.callback.on_phase_changed(&phase);
                self.diagnostics.phases.push(phase);
            }
            EngineEvent::Warning(msg) => {
                warn!("Converter warning: {}", msg);
                self.callback.on_warning(&msg);
                self.diagnostics.warnings.push(msg);
            }
            EngineEvent::Error(msg) => {
                warn!("Converter error: {}", msg);
                self.callback.on_error(&msg);
                self.diagnostics.errors.push(msg);
            }
        }
    }
}
