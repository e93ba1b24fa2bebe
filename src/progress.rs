//! Progress-callback trait for converter events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive the
//! converter's progress, phase changes, errors and warnings as they happen.
//! Events are observational only: nothing a callback does changes the flow of
//! the run.
//!
//! # Example
//!
//! ```rust
//! use md2pdf::{ConversionProgressCallback, RunConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct WarningCounter {
//!     warnings: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for WarningCounter {
//!     fn on_warning(&self, message: &str) {
//!         self.warnings.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("warning: {message}");
//!     }
//! }
//!
//! let counter = Arc::new(WarningCounter { warnings: AtomicUsize::new(0) });
//!
//! let config = RunConfig::builder()
//!     .input("notes.md")
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A named stage of the converter's internal pipeline, e.g.
/// `Loading pages (1/6)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// 1-based phase number, when the converter reports one.
    pub index: Option<u32>,
    /// Total number of phases, when the converter reports one.
    pub total: Option<u32>,
    /// Human-readable description, e.g. `Loading pages`.
    pub description: String,
}

impl Phase {
    pub fn named(description: impl Into<String>) -> Self {
        Self {
            index: None,
            total: None,
            description: description.into(),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.index, self.total) {
            (Some(i), Some(t)) => write!(f, "{} ({}/{})", self.description, i, t),
            _ => f.write_str(&self.description),
        }
    }
}

/// Called by the conversion pipeline as the converter runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, right before the converter is started.
    fn on_conversion_start(&self) {}

    /// Overall percentage (0–100) of the current phase.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// The converter entered a new phase.
    fn on_phase_changed(&self, phase: &Phase) {
        let _ = phase;
    }

    /// The converter reported an error. The run continues.
    fn on_error(&self, message: &str) {
        let _ = message;
    }

    /// The converter reported a warning.
    fn on_warning(&self, message: &str) {
        let _ = message;
    }

    /// Called once after the converter finished.
    ///
    /// # Arguments
    /// * `success` — whether the converter reported a successful conversion
    fn on_conversion_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        progress: Mutex<Vec<u8>>,
        phases: Mutex<Vec<String>>,
        errors: AtomicUsize,
        warnings: AtomicUsize,
        completed: Mutex<Option<bool>>,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_progress(&self, percent: u8) {
            self.progress.lock().unwrap().push(percent);
        }

        fn on_phase_changed(&self, phase: &Phase) {
            self.phases.lock().unwrap().push(phase.to_string());
        }

        fn on_error(&self, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_warning(&self, _message: &str) {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, success: bool) {
            *self.completed.lock().unwrap() = Some(success);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start();
        cb.on_progress(50);
        cb.on_phase_changed(&Phase::named("Done"));
        cb.on_error("boom");
        cb.on_warning("hmm");
        cb.on_conversion_complete(true);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_phase_changed(&Phase {
            index: Some(1),
            total: Some(6),
            description: "Loading pages".into(),
        });
        tracker.on_progress(10);
        tracker.on_progress(100);
        tracker.on_warning("Failed to load about:blank");
        tracker.on_error("ContentNotFoundError");
        tracker.on_conversion_complete(false);

        assert_eq!(*tracker.progress.lock().unwrap(), vec![10, 100]);
        assert_eq!(
            *tracker.phases.lock().unwrap(),
            vec!["Loading pages (1/6)".to_string()]
        );
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.warnings.load(Ordering::SeqCst), 1);
        assert_eq!(*tracker.completed.lock().unwrap(), Some(false));
    }

    #[test]
    fn phase_display_without_counts() {
        assert_eq!(Phase::named("Done").to_string(), "Done");
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start();
        cb.on_progress(1);
    }
}
