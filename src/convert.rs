//! Pipeline driver: run the four stages in order, stop at the first failure.
//!
//! ```text
//! resolve_input ─▶ [1] copy ─▶ [2] rasterize ─▶ [3] ocr ─▶ [4] assemble
//! ```
//!
//! Nothing is retried or resumed. A second call after a failed OCR run
//! starts again from the copy stage; artifacts a failed run left behind
//! are overwritten, not reused.

use crate::config::ConversionConfig;
use crate::error::Pdf2RmdError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::{assemble, input, ocr, render, stage, Stage};
use std::future::Future;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

/// Convert the PDF at `input` to R Markdown.
///
/// `input` is resolved with [`input::resolve_input`] first, so relative
/// paths, surrounding quotes and whitespace are accepted.
///
/// # Errors
/// The first stage failure, unchanged. See [`Pdf2RmdError::stage`].
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2RmdError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let source = match input::resolve_input(input_str) {
        Ok(path) => path,
        Err(e) => {
            report_failure(Stage::Input, &e, config);
            return Err(e);
        }
    };
    run_pipeline(&source, config).await
}

/// Run the four stages on an already validated source path.
pub async fn run_pipeline(
    source: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2RmdError> {
    let total_start = Instant::now();
    let workspace = &config.workspace;
    let stem = input::document_stem(source)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(&source.display().to_string());
    }

    // A run that fails must not leave an older document looking current.
    let output = config.output_path(&stem);
    if let Err(e) = assemble::remove_stale_output(&output).await {
        report_failure(Stage::Assemble, &e, config);
        return Err(e);
    }

    // ── Step 1: Stage the source ─────────────────────────────────────────
    let (staged_pdf, copy_ms) =
        run_stage(Stage::Copy, config, stage::stage_document(source, workspace)).await?;
    complete(Stage::Copy, config, &format!("staged {}", staged_pdf.display()));

    // ── Step 2: Rasterise ────────────────────────────────────────────────
    let (page_images, rasterize_ms) = run_stage(
        Stage::Rasterize,
        config,
        render::rasterize(&staged_pdf, workspace, config),
    )
    .await?;
    complete(
        Stage::Rasterize,
        config,
        &format!("{} page images", page_images.len()),
    );

    // ── Step 3: OCR ──────────────────────────────────────────────────────
    let (transcript, ocr_ms) = run_stage(
        Stage::Ocr,
        config,
        ocr::run_ocr(&staged_pdf, &stem, &page_images, workspace, config),
    )
    .await?;
    complete(Stage::Ocr, config, &format!("transcript {}", transcript.display()));

    // ── Step 4: Assemble ─────────────────────────────────────────────────
    let ((), assemble_ms) = run_stage(
        Stage::Assemble,
        config,
        assemble::assemble(&transcript, &stem, &output, &config.template),
    )
    .await?;
    complete(Stage::Assemble, config, &format!("wrote {}", output.display()));

    let stats = ConversionStats {
        page_count: page_images.len(),
        copy_duration_ms: copy_ms,
        rasterize_duration_ms: rasterize_ms,
        ocr_duration_ms: ocr_ms,
        assemble_duration_ms: assemble_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {}ms total → {}",
        stats.page_count,
        stats.total_duration_ms,
        output.display()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(&output);
    }

    Ok(ConversionOutput {
        stem,
        staged_pdf,
        page_images,
        transcript,
        output,
        ocr_mode: config.ocr_mode,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a current-thread tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2RmdError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Pdf2RmdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run one stage, reporting start/failure and timing it.
async fn run_stage<T, F>(
    stage: Stage,
    config: &ConversionConfig,
    fut: F,
) -> Result<(T, u64), Pdf2RmdError>
where
    F: Future<Output = Result<T, Pdf2RmdError>>,
{
    info!("[{}/{}] {}", stage.step(), Stage::PIPELINE.len(), stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }

    let start = Instant::now();
    match fut.await {
        Ok(value) => Ok((value, start.elapsed().as_millis() as u64)),
        Err(e) => {
            report_failure(stage, &e, config);
            Err(e)
        }
    }
}

fn complete(stage: Stage, config: &ConversionConfig, detail: &str) {
    info!("✓ {}: {}", stage, detail);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, detail);
    }
}

fn report_failure(stage: Stage, e: &Pdf2RmdError, config: &ConversionConfig) {
    error!("✗ {} failed: {}", stage, e);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_error(stage, &e.to_string());
    }
}
