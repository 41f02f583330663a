//! Input staging: copy the source PDF into the workspace input directory.

use crate::config::Workspace;
use crate::error::Pdf2RmdError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Copy `source` into [`Workspace::input_dir`] under its original file name.
///
/// The directory is created if needed. An older staged copy with the same
/// name is overwritten. When `source` already is the staged file nothing is
/// copied, since copying a file onto itself would truncate it.
///
/// # Returns
/// The path of the staged document.
pub async fn stage_document(source: &Path, workspace: &Workspace) -> Result<PathBuf, Pdf2RmdError> {
    if !tokio::fs::try_exists(source).await.unwrap_or(false) {
        return Err(Pdf2RmdError::InputNotFound {
            path: source.to_path_buf(),
        });
    }

    let file_name = source.file_name().ok_or_else(|| Pdf2RmdError::InvalidInput {
        input: source.display().to_string(),
    })?;

    tokio::fs::create_dir_all(&workspace.input_dir)
        .await
        .map_err(|e| Pdf2RmdError::CopyFailed {
            path: workspace.input_dir.clone(),
            source: e,
        })?;

    let staged = workspace.input_dir.join(file_name);

    if same_file(source, &staged).await {
        debug!("Source is already staged at {}", staged.display());
        return Ok(staged);
    }

    let bytes = tokio::fs::copy(source, &staged)
        .await
        .map_err(|e| Pdf2RmdError::CopyFailed {
            path: source.to_path_buf(),
            source: e,
        })?;

    info!("Staged {} ({} bytes) → {}", source.display(), bytes, staged.display());
    Ok(staged)
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn copies_under_original_name() {
        let src_dir = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let source = src_dir.path().join("paper.pdf");
        std::fs::write(&source, b"%PDF-1.5 body").unwrap();

        let ws = Workspace::under(root.path());
        let staged = stage_document(&source, &ws).await.unwrap();

        assert_eq!(staged, ws.input_dir.join("paper.pdf"));
        assert_eq!(std::fs::read(&staged).unwrap(), b"%PDF-1.5 body");
    }

    #[tokio::test]
    async fn restaging_overwrites_previous_copy() {
        let src_dir = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let source = src_dir.path().join("paper.pdf");
        let ws = Workspace::under(root.path());

        std::fs::write(&source, b"%PDF old").unwrap();
        stage_document(&source, &ws).await.unwrap();
        std::fs::write(&source, b"%PDF new").unwrap();
        let staged = stage_document(&source, &ws).await.unwrap();

        assert_eq!(std::fs::read(staged).unwrap(), b"%PDF new");
    }

    #[tokio::test]
    async fn staging_the_staged_file_keeps_its_content() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::under(root.path());
        std::fs::create_dir_all(&ws.input_dir).unwrap();
        let source = ws.input_dir.join("paper.pdf");
        std::fs::write(&source, b"%PDF keep me").unwrap();

        let staged = stage_document(&source, &ws).await.unwrap();

        assert_eq!(std::fs::read(staged).unwrap(), b"%PDF keep me");
    }

    #[tokio::test]
    async fn missing_source_creates_nothing() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::under(root.path());
        let err = stage_document(&root.path().join("ghost.pdf"), &ws)
            .await
            .unwrap_err();

        assert!(matches!(err, Pdf2RmdError::InputNotFound { .. }));
        assert!(!ws.input_dir.exists());
    }
}
