//! Configuration types for PDF-to-R-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The working directories live in a
//! [`Workspace`] value that is constructed once and passed to every stage;
//! nothing in the pipeline consults the process working directory on its own.

use crate::error::Pdf2RmdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for a PDF-to-R-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2rmd::{ConversionConfig, OcrMode};
///
/// let config = ConversionConfig::builder()
///     .root("/tmp/run")
///     .dpi(200)
///     .ocr_mode(OcrMode::Images)
///     .build()
///     .unwrap();
/// assert_eq!(config.workspace.image_dir, std::path::Path::new("/tmp/run/assets/out/png"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directories the stages read from and write to.
    pub workspace: Workspace,

    /// Rasterisation resolution passed to the rasteriser as `-r`. Range: 72–600. Default: 150.
    pub dpi: u32,

    /// Rasteriser executable, looked up on `PATH` unless it contains a separator.
    /// Default: `pdftoppm`.
    pub rasterizer: OsString,

    /// OCR executable, looked up on `PATH` unless it contains a separator.
    /// Default: `nougat`.
    pub ocr_program: OsString,

    /// What the OCR engine is pointed at. Default: [`OcrMode::Pdf`].
    pub ocr_mode: OcrMode,

    /// Extra arguments appended to the OCR invocation. Default: `["--no-skipping"]`.
    ///
    /// Nougat's failure-detection heuristic drops pages it considers
    /// repetitive, which on scanned books silently loses real content.
    pub ocr_args: Vec<OsString>,

    /// Transcript extension the OCR engine writes. Default: `mmd`.
    pub transcript_ext: String,

    /// Extension of the final document. Default: `Rmd`.
    pub output_ext: String,

    /// Front-matter settings for the output document.
    pub template: RmdTemplate,

    /// Optional observer for stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            workspace: Workspace::default(),
            dpi: 150,
            rasterizer: "pdftoppm".into(),
            ocr_program: "nougat".into(),
            ocr_mode: OcrMode::default(),
            ocr_args: vec!["--no-skipping".into()],
            transcript_ext: "mmd".to_string(),
            output_ext: "Rmd".to_string(),
            template: RmdTemplate::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("workspace", &self.workspace)
            .field("dpi", &self.dpi)
            .field("rasterizer", &self.rasterizer)
            .field("ocr_program", &self.ocr_program)
            .field("ocr_mode", &self.ocr_mode)
            .field("ocr_args", &self.ocr_args)
            .field("transcript_ext", &self.transcript_ext)
            .field("output_ext", &self.output_ext)
            .field("template", &self.template)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Transcript path the OCR engine is expected to produce for `stem`.
    pub fn transcript_path(&self, stem: &str) -> PathBuf {
        self.workspace.transcript_file(stem, &self.transcript_ext)
    }

    /// Path of the final document for `stem`.
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.workspace.output_file(stem, &self.output_ext)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Lay the workspace out under `root` (see [`Workspace::under`]).
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.workspace = Workspace::under(root);
        self
    }

    pub fn workspace(mut self, workspace: Workspace) -> Self {
        self.config.workspace = workspace;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn rasterizer(mut self, program: impl Into<OsString>) -> Self {
        self.config.rasterizer = program.into();
        self
    }

    pub fn ocr_program(mut self, program: impl Into<OsString>) -> Self {
        self.config.ocr_program = program.into();
        self
    }

    pub fn ocr_mode(mut self, mode: OcrMode) -> Self {
        self.config.ocr_mode = mode;
        self
    }

    pub fn ocr_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.config.ocr_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn transcript_ext(mut self, ext: impl Into<String>) -> Self {
        self.config.transcript_ext = ext.into();
        self
    }

    pub fn output_ext(mut self, ext: impl Into<String>) -> Self {
        self.config.output_ext = ext.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.template.author = author.into();
        self
    }

    pub fn template(mut self, template: RmdTemplate) -> Self {
        self.config.template = template;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2RmdError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2RmdError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.rasterizer.is_empty() {
            return Err(Pdf2RmdError::InvalidConfig(
                "Rasterizer program must not be empty".into(),
            ));
        }
        if c.ocr_program.is_empty() {
            return Err(Pdf2RmdError::InvalidConfig(
                "OCR program must not be empty".into(),
            ));
        }
        for (name, ext) in [("transcript", &c.transcript_ext), ("output", &c.output_ext)] {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(Pdf2RmdError::InvalidConfig(format!(
                    "Invalid {name} extension '{ext}': expected a bare extension like 'mmd'"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Workspace ────────────────────────────────────────────────────────────

/// The four directories a run works in.
///
/// Constructed once per run and threaded through every stage. Directories
/// are created lazily by the stage that writes to them, so a run that fails
/// input validation leaves the filesystem untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Holds the staged copy of the source PDF.
    pub input_dir: PathBuf,
    /// Holds `1.png`, `2.png`, … in page order.
    pub image_dir: PathBuf,
    /// Holds the OCR transcript.
    pub transcript_dir: PathBuf,
    /// Holds the final document.
    pub output_dir: PathBuf,
}

impl Workspace {
    /// The standard layout under `root`:
    ///
    /// ```text
    /// <root>/assets/in
    /// <root>/assets/out
    /// <root>/assets/out/png
    /// <root>/assets/out/nougat
    /// ```
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let assets_in = root.join("assets").join("in");
        let assets_out = root.join("assets").join("out");
        Self {
            input_dir: assets_in,
            image_dir: assets_out.join("png"),
            transcript_dir: assets_out.join("nougat"),
            output_dir: assets_out,
        }
    }

    /// `<transcript_dir>/<stem>.<ext>`
    pub fn transcript_file(&self, stem: &str, ext: &str) -> PathBuf {
        self.transcript_dir.join(format!("{stem}.{ext}"))
    }

    /// `<output_dir>/<stem>.<ext>`
    pub fn output_file(&self, stem: &str, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.{ext}"))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::under(".")
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the OCR engine reads.
///
/// Nougat natively consumes PDFs and rasterises internally. The page images
/// produced by the rasteriser can be fed to an image-capable engine instead
/// when a specific DPI matters more than Nougat's own rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrMode {
    /// Pass the staged PDF. (default)
    #[default]
    Pdf,
    /// Pass the canonical page images, in page order.
    ///
    /// The engine must still write a single `<stem>.<transcript_ext>` for
    /// the whole document. Stock `nougat` does not: it reads only PDFs and
    /// names each output after its input file. Use this mode with a wrapper
    /// script or another engine that accepts images.
    Images,
}

/// Front-matter settings for the generated R Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmdTemplate {
    /// `author:` field. Default: `Generated by pdf2rmd`.
    pub author: String,
    /// LaTeX engine for `pdf_document`. Default: `lualatex`.
    pub latex_engine: String,
    /// Main, sans and mono fonts set via `fontspec`.
    pub main_font: String,
    pub sans_font: String,
    pub mono_font: String,
}

impl Default for RmdTemplate {
    fn default() -> Self {
        Self {
            author: "Generated by pdf2rmd".to_string(),
            latex_engine: "lualatex".to_string(),
            main_font: "DejaVu Serif".to_string(),
            sans_font: "DejaVu Sans".to_string(),
            mono_font: "DejaVu Sans Mono".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_layout_under_root() {
        let ws = Workspace::under("/work");
        assert_eq!(ws.input_dir, PathBuf::from("/work/assets/in"));
        assert_eq!(ws.image_dir, PathBuf::from("/work/assets/out/png"));
        assert_eq!(ws.transcript_dir, PathBuf::from("/work/assets/out/nougat"));
        assert_eq!(ws.output_dir, PathBuf::from("/work/assets/out"));
    }

    #[test]
    fn default_paths_for_stem() {
        let config = ConversionConfig::builder().root("/w").build().unwrap();
        assert_eq!(
            config.transcript_path("paper"),
            PathBuf::from("/w/assets/out/nougat/paper.mmd")
        );
        assert_eq!(
            config.output_path("paper"),
            PathBuf::from("/w/assets/out/paper.Rmd")
        );
    }

    #[test]
    fn dpi_out_of_range_is_rejected() {
        let err = ConversionConfig::builder().dpi(30).build().unwrap_err();
        assert!(matches!(err, Pdf2RmdError::InvalidConfig(_)));
        assert!(ConversionConfig::builder().dpi(600).build().is_ok());
    }

    #[test]
    fn dotted_extension_is_rejected() {
        let err = ConversionConfig::builder()
            .transcript_ext(".mmd")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("transcript extension"));
    }

    #[test]
    fn empty_ocr_program_is_rejected() {
        assert!(ConversionConfig::builder().ocr_program("").build().is_err());
    }

    #[test]
    fn ocr_args_replace_default() {
        let config = ConversionConfig::builder()
            .ocr_args(["--batchsize", "4"])
            .build()
            .unwrap();
        assert_eq!(config.ocr_args, vec![OsString::from("--batchsize"), OsString::from("4")]);
    }
}
