//! Input resolution: turn a raw path argument into a validated PDF path.
//!
//! This runs before any stage and never touches the filesystem beyond
//! `stat`, so a bad path fails with [`Pdf2RmdError::InputNotFound`] before
//! a single directory has been created.

use crate::error::Pdf2RmdError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a user-supplied path (CLI argument or prompt answer) to an
/// absolute path of an existing `.pdf` file.
///
/// Surrounding whitespace and one pair of matching quotes are stripped;
/// terminals wrap dragged-in paths in quotes.
pub fn resolve_input(raw: &str) -> Result<PathBuf, Pdf2RmdError> {
    let cleaned = strip_quotes(raw.trim());
    if cleaned.is_empty() {
        return Err(Pdf2RmdError::InvalidInput {
            input: raw.to_string(),
        });
    }

    let path = absolutize(Path::new(cleaned))?;

    if !path.exists() {
        return Err(Pdf2RmdError::InputNotFound { path });
    }
    if !path.is_file() {
        return Err(Pdf2RmdError::InvalidInput {
            input: cleaned.to_string(),
        });
    }
    if !has_pdf_extension(&path) {
        return Err(Pdf2RmdError::NotAPdf { path });
    }

    debug!("Resolved input PDF: {}", path.display());
    Ok(path)
}

/// File stem used for the transcript and output names, e.g. `paper` for
/// `paper.pdf`.
pub fn document_stem(path: &Path) -> Result<String, Pdf2RmdError> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Pdf2RmdError::InvalidInput {
            input: path.display().to_string(),
        })
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return s[1..s.len() - 1].trim();
        }
    }
    s
}

fn absolutize(path: &Path) -> Result<PathBuf, Pdf2RmdError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Pdf2RmdError::Internal(format!("Cannot read current directory: {e}")))?;
    Ok(cwd.join(path))
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
