//! OCR: run the Nougat model over the document and locate its transcript.
//!
//! Nougat writes `<stem>.mmd` into its output directory. Its exit status is
//! not a reliable success signal on its own (it can exit 0 after skipping
//! every page), so the transcript's presence is checked explicitly, and a
//! transcript left over from an earlier run is deleted beforehand.
//!
//! No timeout is applied: on CPU a 30-page paper takes tens of minutes.

use crate::config::{ConversionConfig, OcrMode, Workspace};
use crate::error::Pdf2RmdError;
use crate::pipeline::tool;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Run the OCR engine and return the transcript path.
///
/// `pages` are the canonical page images in page order; they are only
/// passed to the engine in [`OcrMode::Images`].
///
/// # Errors
/// - [`Pdf2RmdError::OcrNotAvailable`]: the program is not on `PATH`
/// - [`Pdf2RmdError::OcrFailed`]: it could not be spawned or exited non-zero
/// - [`Pdf2RmdError::TranscriptMissing`]: it succeeded but wrote nothing
pub async fn run_ocr(
    pdf_path: &Path,
    stem: &str,
    pages: &[PathBuf],
    workspace: &Workspace,
    config: &ConversionConfig,
) -> Result<PathBuf, Pdf2RmdError> {
    let program =
        tool::find_program(&config.ocr_program).ok_or_else(|| Pdf2RmdError::OcrNotAvailable {
            program: config.ocr_program.to_string_lossy().into_owned(),
        })?;

    tokio::fs::create_dir_all(&workspace.transcript_dir)
        .await
        .map_err(|e| Pdf2RmdError::OcrFailed {
            status: None,
            stderr: format!("Cannot create {}: {e}", workspace.transcript_dir.display()),
        })?;

    let transcript = workspace.transcript_file(stem, &config.transcript_ext);
    remove_stale(&transcript).await?;

    let args = ocr_args(config.ocr_mode, pdf_path, pages, &workspace.transcript_dir, &config.ocr_args);
    info!(
        "Running: {}",
        tool::describe_command(config.ocr_program.as_os_str(), &args)
    );

    let output = tool::run_tool(&program, &args)
        .await
        .map_err(|e| Pdf2RmdError::OcrFailed {
            status: None,
            stderr: format!("Failed to spawn {}: {e}", program.display()),
        })?;

    if !output.success {
        return Err(Pdf2RmdError::OcrFailed {
            status: output.status,
            stderr: output.stderr,
        });
    }
    if !output.stdout.trim().is_empty() {
        debug!("OCR stdout:\n{}", output.stdout.trim_end());
    }
    if !output.stderr.trim().is_empty() {
        debug!("OCR stderr:\n{}", output.stderr.trim_end());
    }

    if !tokio::fs::try_exists(&transcript).await.unwrap_or(false) {
        warn!("OCR exited successfully but {} is missing", transcript.display());
        return Err(Pdf2RmdError::TranscriptMissing { path: transcript });
    }

    info!("OCR completed: {}", transcript.display());
    Ok(transcript)
}

/// Build the OCR command line for `mode`.
///
/// ```text
/// Pdf:    nougat <pdf> -o <out_dir> [extra…]
/// Images: nougat <1.png> <2.png> … -o <out_dir> [extra…]
/// ```
pub fn ocr_args(
    mode: OcrMode,
    pdf_path: &Path,
    pages: &[PathBuf],
    out_dir: &Path,
    extra: &[OsString],
) -> Vec<OsString> {
    let mut args: Vec<OsString> = match mode {
        OcrMode::Pdf => vec![pdf_path.as_os_str().to_owned()],
        OcrMode::Images => pages.iter().map(|p| p.as_os_str().to_owned()).collect(),
    };
    args.push("-o".into());
    args.push(out_dir.as_os_str().to_owned());
    args.extend(extra.iter().cloned());
    args
}

async fn remove_stale(transcript: &Path) -> Result<(), Pdf2RmdError> {
    match tokio::fs::remove_file(transcript).await {
        Ok(()) => {
            debug!("Removed stale transcript {}", transcript.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Pdf2RmdError::OcrFailed {
            status: None,
            stderr: format!("Cannot remove stale {}: {e}", transcript.display()),
        }),
    }
}
