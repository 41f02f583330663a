//! Error types for the pdf2rmd library.
//!
//! Every failure is fatal: the pipeline stops at the first failing stage and
//! surfaces a [`Pdf2RmdError`] naming that stage. There is no page-level or
//! partial-success error type because the external tools either produce a
//! complete artifact or they don't.
//!
//! Each variant maps to a distinct process exit status via
//! [`Pdf2RmdError::exit_code`] so shell scripts can tell a missing OCR
//! install apart from a corrupt PDF without parsing stderr.

use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2rmd library.
#[derive(Debug, Error)]
pub enum Pdf2RmdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input string is empty or names something that is not a file.
    #[error("Invalid input '{input}': expected a path to a PDF file")]
    InvalidInput { input: String },

    /// The file exists but does not carry a `.pdf` extension.
    #[error("File is not a PDF: '{path}'")]
    NotAPdf { path: PathBuf },

    /// Source document was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    // ── Staging errors ────────────────────────────────────────────────────
    /// Copying the source into the input staging directory failed.
    #[error("Failed to stage '{path}': {source}")]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// The rasteriser could not be run, exited non-zero, or produced no images.
    #[error(
        "Rasterisation failed ({}): {}\n\
Is poppler-utils installed? Try: sudo apt-get install poppler-utils",
        describe_status(*.status),
        stderr_or_placeholder(.stderr)
    )]
    RasterizationFailed { status: Option<i32>, stderr: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR program could not be located.
    #[error("OCR engine '{program}' not found on PATH.\nInstall it with: pip install nougat-ocr")]
    OcrNotAvailable { program: String },

    /// The OCR program ran but exited non-zero.
    #[error("OCR failed ({}): {}", describe_status(*.status), stderr_or_placeholder(.stderr))]
    OcrFailed { status: Option<i32>, stderr: String },

    /// The OCR program reported success but left no transcript behind.
    #[error("OCR finished but no transcript was written to '{path}'")]
    TranscriptMissing { path: PathBuf },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// The transcript exists but could not be read as UTF-8 text.
    #[error("Transcript '{path}' is unreadable: {reason}")]
    TranscriptUnreadable { path: PathBuf, reason: String },

    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2RmdError {
    /// The pipeline stage this error belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Pdf2RmdError::InvalidInput { .. }
            | Pdf2RmdError::NotAPdf { .. }
            | Pdf2RmdError::InputNotFound { .. }
            | Pdf2RmdError::InvalidConfig(_) => Some(Stage::Input),
            Pdf2RmdError::CopyFailed { .. } => Some(Stage::Copy),
            Pdf2RmdError::RasterizationFailed { .. } => Some(Stage::Rasterize),
            Pdf2RmdError::OcrNotAvailable { .. }
            | Pdf2RmdError::OcrFailed { .. }
            | Pdf2RmdError::TranscriptMissing { .. } => Some(Stage::Ocr),
            Pdf2RmdError::TranscriptUnreadable { .. } | Pdf2RmdError::OutputWriteFailed { .. } => {
                Some(Stage::Assemble)
            }
            Pdf2RmdError::Internal(_) => None,
        }
    }

    /// Process exit status for this error. Never zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            Pdf2RmdError::Internal(_) => 1,
            Pdf2RmdError::InvalidInput { .. }
            | Pdf2RmdError::NotAPdf { .. }
            | Pdf2RmdError::InvalidConfig(_) => 2,
            Pdf2RmdError::InputNotFound { .. } => 3,
            Pdf2RmdError::CopyFailed { .. } => 4,
            Pdf2RmdError::RasterizationFailed { .. } => 5,
            Pdf2RmdError::OcrNotAvailable { .. } => 6,
            Pdf2RmdError::OcrFailed { .. } => 7,
            Pdf2RmdError::TranscriptMissing { .. } => 8,
            Pdf2RmdError::TranscriptUnreadable { .. } => 9,
            Pdf2RmdError::OutputWriteFailed { .. } => 10,
        }
    }
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "no exit status".to_string(),
    }
}

fn stderr_or_placeholder(stderr: &str) -> &str {
    if stderr.trim().is_empty() {
        "<no diagnostic output>"
    } else {
        stderr.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterization_failed_display_includes_status_and_stderr() {
        let e = Pdf2RmdError::RasterizationFailed {
            status: Some(99),
            stderr: "Syntax Error: Couldn't read xref table\n".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exit status 99"), "got: {msg}");
        assert!(msg.contains("xref table"), "got: {msg}");
    }

    #[test]
    fn ocr_failed_without_stderr_uses_placeholder() {
        let e = Pdf2RmdError::OcrFailed {
            status: None,
            stderr: "  ".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("no exit status"), "got: {msg}");
        assert!(msg.contains("<no diagnostic output>"), "got: {msg}");
    }

    #[test]
    fn stage_attribution() {
        let missing = Pdf2RmdError::TranscriptMissing {
            path: "nougat/paper.mmd".into(),
        };
        assert_eq!(missing.stage(), Some(Stage::Ocr));

        let raster = Pdf2RmdError::RasterizationFailed {
            status: Some(1),
            stderr: String::new(),
        };
        assert_eq!(raster.stage(), Some(Stage::Rasterize));

        assert_eq!(Pdf2RmdError::Internal("x".into()).stage(), None);
    }

    #[test]
    fn exit_codes_are_distinct_and_non_zero() {
        let errors = [
            Pdf2RmdError::Internal(String::new()),
            Pdf2RmdError::InvalidInput { input: String::new() },
            Pdf2RmdError::InputNotFound { path: PathBuf::new() },
            Pdf2RmdError::CopyFailed {
                path: PathBuf::new(),
                source: std::io::Error::other("x"),
            },
            Pdf2RmdError::RasterizationFailed { status: None, stderr: String::new() },
            Pdf2RmdError::OcrNotAvailable { program: String::new() },
            Pdf2RmdError::OcrFailed { status: None, stderr: String::new() },
            Pdf2RmdError::TranscriptMissing { path: PathBuf::new() },
            Pdf2RmdError::TranscriptUnreadable {
                path: PathBuf::new(),
                reason: String::new(),
            },
            Pdf2RmdError::OutputWriteFailed {
                path: PathBuf::new(),
                source: std::io::Error::other("x"),
            },
        ];
        let mut codes: Vec<u8> = errors.iter().map(Pdf2RmdError::exit_code).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
