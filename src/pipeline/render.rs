//! PDF rasterisation: one PNG per page via an external `pdftoppm`.
//!
//! The rasteriser is told to write `page-N.png` files into the image
//! directory; afterwards every emitted image is renamed to its canonical
//! `N.png` name (see [`crate::pipeline::naming`]). The image directory is
//! emptied of PNGs first so leftovers from a longer document can't pose as
//! pages of this one.

use crate::config::{ConversionConfig, Workspace};
use crate::error::Pdf2RmdError;
use crate::pipeline::naming::{self, PageRename};
use crate::pipeline::tool;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-name root handed to the rasteriser.
const OUTPUT_ROOT: &str = "page";

/// Prefix of the intermediate names used by a two-phase rename.
const RENAME_TMP_PREFIX: &str = ".pdf2rmd-rename-";

/// Rasterise every page of `pdf_path` into [`Workspace::image_dir`].
///
/// # Returns
/// Canonical page image paths (`1.png`, `2.png`, …) in page order.
///
/// # Errors
/// [`Pdf2RmdError::RasterizationFailed`] if the rasteriser is missing,
/// exits non-zero, produces no images, or the images can't be renamed.
pub async fn rasterize(
    pdf_path: &Path,
    workspace: &Workspace,
    config: &ConversionConfig,
) -> Result<Vec<PathBuf>, Pdf2RmdError> {
    let image_dir = &workspace.image_dir;
    tokio::fs::create_dir_all(image_dir)
        .await
        .map_err(|e| io_failure(format!("Cannot create {}: {e}", image_dir.display())))?;
    clear_images(image_dir).await?;

    let program = tool::find_program(&config.rasterizer).ok_or_else(|| {
        Pdf2RmdError::RasterizationFailed {
            status: None,
            stderr: format!(
                "'{}' not found on PATH",
                config.rasterizer.to_string_lossy()
            ),
        }
    })?;

    let args = rasterizer_args(pdf_path, image_dir, config.dpi);
    info!(
        "Running: {}",
        tool::describe_command(config.rasterizer.as_os_str(), &args)
    );

    let output = tool::run_tool(&program, &args)
        .await
        .map_err(|e| io_failure(format!("Failed to spawn {}: {e}", program.display())))?;

    if !output.success {
        return Err(Pdf2RmdError::RasterizationFailed {
            status: output.status,
            stderr: output.stderr,
        });
    }
    if !output.stdout.trim().is_empty() {
        debug!("Rasteriser stdout:\n{}", output.stdout.trim_end());
    }

    let listing = list_dir(image_dir).await?;
    let plan = naming::plan_canonical_names(&listing);
    if plan.is_empty() {
        return Err(Pdf2RmdError::RasterizationFailed {
            status: output.status,
            stderr: if output.stderr.trim().is_empty() {
                "rasteriser exited successfully but produced no images".to_string()
            } else {
                output.stderr
            },
        });
    }

    apply_plan(image_dir, &plan).await?;
    info!("Created {} PNG images in {}", plan.len(), image_dir.display());

    Ok(plan
        .iter()
        .map(|r| image_dir.join(r.to_name()))
        .collect())
}

/// `pdftoppm -png -r <dpi> <pdf> <image_dir>/page`
pub fn rasterizer_args(pdf_path: &Path, image_dir: &Path, dpi: u32) -> Vec<OsString> {
    vec![
        "-png".into(),
        "-r".into(),
        dpi.to_string().into(),
        pdf_path.as_os_str().to_owned(),
        image_dir.join(OUTPUT_ROOT).into_os_string(),
    ]
}

/// Rename images according to `plan`.
///
/// Goes through temporary names first when a target would overwrite a
/// source that hasn't been moved yet.
pub async fn apply_plan(dir: &Path, plan: &[PageRename]) -> Result<(), Pdf2RmdError> {
    if naming::needs_two_phase(plan) {
        debug!("Renaming {} images in two phases", plan.len());
        let mut staged = Vec::with_capacity(plan.len());
        for rename in plan {
            let tmp = dir.join(format!("{RENAME_TMP_PREFIX}{}.tmp", rename.page));
            rename_file(&dir.join(&rename.from), &tmp).await?;
            staged.push((tmp, dir.join(rename.to_name())));
        }
        for (tmp, target) in staged {
            rename_file(&tmp, &target).await?;
        }
        return Ok(());
    }

    for rename in plan.iter().filter(|r| !r.is_identity()) {
        rename_file(&dir.join(&rename.from), &dir.join(rename.to_name())).await?;
    }
    Ok(())
}

async fn rename_file(from: &Path, to: &Path) -> Result<(), Pdf2RmdError> {
    tokio::fs::rename(from, to).await.map_err(|e| {
        io_failure(format!(
            "Cannot rename {} → {}: {e}",
            from.display(),
            to.display()
        ))
    })
}

/// Remove PNGs and interrupted-rename leftovers from an earlier run.
async fn clear_images(dir: &Path) -> Result<(), Pdf2RmdError> {
    for name in list_dir(dir).await? {
        if naming::is_png(&name) || name.starts_with(RENAME_TMP_PREFIX) {
            let path = dir.join(&name);
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| io_failure(format!("Cannot remove stale {}: {e}", path.display())))?;
            debug!("Removed stale image {}", path.display());
        }
    }
    Ok(())
}

/// File names (not paths) of regular files in `dir`.
async fn list_dir(dir: &Path) -> Result<Vec<String>, Pdf2RmdError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| io_failure(format!("Cannot list {}: {e}", dir.display())))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| io_failure(format!("Cannot list {}: {e}", dir.display())))?
    {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!("Skipping non-UTF-8 file name {:?}", raw),
        }
    }
    Ok(names)
}

fn io_failure(detail: String) -> Pdf2RmdError {
    Pdf2RmdError::RasterizationFailed {
        status: None,
        stderr: detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn sorted_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn args_request_png_at_dpi() {
        let args = rasterizer_args(Path::new("/in/paper.pdf"), Path::new("/out/png"), 150);
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(
            args,
            vec!["-png", "-r", "150", "/in/paper.pdf", "/out/png/page"]
        );
    }

    #[tokio::test]
    async fn apply_plan_renames_padded_images() {
        let dir = TempDir::new().unwrap();
        for i in 1..=3 {
            touch(dir.path(), &format!("page-0{i}.png"), &format!("p{i}"));
        }
        let listing = list_dir(dir.path()).await.unwrap();
        let plan = naming::plan_canonical_names(&listing);
        apply_plan(dir.path(), &plan).await.unwrap();

        assert_eq!(sorted_names(dir.path()), vec!["1.png", "2.png", "3.png"]);
        assert_eq!(std::fs::read_to_string(dir.path().join("2.png")).unwrap(), "p2");
    }

    #[tokio::test]
    async fn apply_plan_two_phase_keeps_contents() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "2.png", "second");
        touch(dir.path(), "3.png", "third");
        let plan = naming::plan_canonical_names(&["2.png", "3.png"]);
        apply_plan(dir.path(), &plan).await.unwrap();

        assert_eq!(sorted_names(dir.path()), vec!["1.png", "2.png"]);
        assert_eq!(std::fs::read_to_string(dir.path().join("1.png")).unwrap(), "second");
        assert_eq!(std::fs::read_to_string(dir.path().join("2.png")).unwrap(), "third");
    }

    #[tokio::test]
    async fn clear_images_only_removes_png() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "7.png", "");
        touch(dir.path(), "keep.txt", "");
        clear_images(dir.path()).await.unwrap();
        assert_eq!(sorted_names(dir.path()), vec!["keep.txt"]);
    }

    #[tokio::test]
    async fn clear_images_removes_interrupted_rename_leftovers() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".pdf2rmd-rename-1.tmp", "half-moved page");
        touch(dir.path(), ".pdf2rmd-rename-12.tmp", "");
        touch(dir.path(), "3.png", "");
        touch(dir.path(), "keep.txt", "");
        clear_images(dir.path()).await.unwrap();
        assert_eq!(sorted_names(dir.path()), vec!["keep.txt"]);
    }

    #[tokio::test]
    async fn missing_rasterizer_is_rasterization_failure() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::under(root.path());
        let config = ConversionConfig::builder()
            .rasterizer("pdf2rmd-no-such-rasterizer")
            .build()
            .unwrap();

        let err = rasterize(Path::new("/nonexistent.pdf"), &ws, &config)
            .await
            .unwrap_err();
        match err {
            Pdf2RmdError::RasterizationFailed { status, stderr } => {
                assert_eq!(status, None);
                assert!(stderr.contains("not found"), "got: {stderr}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
