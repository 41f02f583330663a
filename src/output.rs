//! Result types returned by a successful conversion.

use crate::config::OcrMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where every artifact of a finished run ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// File stem shared by the transcript and the output document.
    pub stem: String,
    /// Staged copy of the source PDF.
    pub staged_pdf: PathBuf,
    /// Canonical page images, `1.png` first.
    pub page_images: Vec<PathBuf>,
    /// OCR transcript.
    pub transcript: PathBuf,
    /// Final R Markdown document.
    pub output: PathBuf,
    /// What the OCR engine was run on.
    pub ocr_mode: OcrMode,
    pub stats: ConversionStats,
}

/// Wall-clock timings for each stage, in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub page_count: usize,
    pub copy_duration_ms: u64,
    pub rasterize_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub assemble_duration_ms: u64,
    pub total_duration_ms: u64,
}
