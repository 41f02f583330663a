//! Progress-callback trait for stage-level conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! when each stage starts and finishes. The OCR stage can run for minutes
//! with no output, so the CLI uses these events to keep a spinner alive.
//!
//! Events are informational only: the pipeline never waits on a callback
//! and offers no cancellation through it.
//!
//! # Example
//!
//! ```rust
//! use pdf2rmd::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("[{}/4] {stage}", stage.step());
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::Stage;
use std::sync::Arc;

/// Called by the conversion pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after the input has been validated.
    fn on_conversion_start(&self, document: &str) {
        let _ = document;
    }

    /// Called just before a stage runs.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finished.
    ///
    /// # Arguments
    /// * `stage` : the stage that finished
    /// * `detail`: short human-readable summary, e.g. `"3 page images"`
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called when a stage failed. No further events follow.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the output document has been written.
    fn on_conversion_complete(&self, output: &std::path::Path) {
        let _ = output;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {stage}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start("paper.pdf");
        cb.on_stage_start(Stage::Copy);
        cb.on_stage_complete(Stage::Copy, "staged");
        cb.on_stage_error(Stage::Ocr, "boom");
        cb.on_conversion_complete(std::path::Path::new("paper.Rmd"));
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Rasterize);
        rec.on_stage_complete(Stage::Rasterize, "ignored by default impl");
        rec.on_stage_error(Stage::Rasterize, "pdftoppm exited 1");

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start rasterize".to_string(),
                "error rasterize: pdftoppm exited 1".to_string()
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Assemble);
    }
}
