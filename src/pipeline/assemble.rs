//! Document assembly: wrap the OCR transcript in an R Markdown skeleton.
//!
//! The transcript is appended verbatim. Nougat's output is Mathpix-flavoured
//! Markdown (`\[ … \]` display math, `\begin{table}` blocks), which Pandoc
//! handles well enough that reparsing it here would only add ways to lose
//! content. The header contains no timestamps of its own: the date is an R
//! expression evaluated when the document is knitted, so assembling the
//! same transcript twice yields identical bytes.

use crate::config::RmdTemplate;
use crate::error::Pdf2RmdError;
use std::path::Path;
use tracing::{debug, info};

/// Marker placed between the setup chunk and the transcript body.
pub const TRANSCRIPT_MARKER: &str = "<!-- Nougat OCR Transcript -->";

/// Read `transcript`, render it under `title`, and write `output_path`.
///
/// The write goes to a sibling temp file that is renamed into place, so a
/// crash never leaves a half-written document behind.
pub async fn assemble(
    transcript: &Path,
    title: &str,
    output_path: &Path,
    template: &RmdTemplate,
) -> Result<(), Pdf2RmdError> {
    let body = read_transcript(transcript).await?;
    debug!("Transcript {} is {} bytes", transcript.display(), body.len());

    let document = render_document(title, &body, template);

    let write_err = |e| Pdf2RmdError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = output_path.with_extension("tmp");
    tokio::fs::write(&tmp_path, document.as_bytes())
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, output_path)
        .await
        .map_err(write_err)?;

    info!("Created {}", output_path.display());
    Ok(())
}

/// Delete the document an earlier run left at `output_path`.
///
/// Called before a run starts, so that a run failing at any stage leaves
/// no output document behind. A missing file is not an error.
pub async fn remove_stale_output(output_path: &Path) -> Result<(), Pdf2RmdError> {
    match tokio::fs::remove_file(output_path).await {
        Ok(()) => {
            debug!("Removed previous output {}", output_path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Pdf2RmdError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        }),
    }
}

/// Read the whole transcript as UTF-8 text.
pub async fn read_transcript(path: &Path) -> Result<String, Pdf2RmdError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Pdf2RmdError::TranscriptUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    String::from_utf8(bytes).map_err(|e| Pdf2RmdError::TranscriptUnreadable {
        path: path.to_path_buf(),
        reason: format!(
            "not valid UTF-8 (first bad byte at offset {})",
            e.utf8_error().valid_up_to()
        ),
    })
}

/// Render the complete R Markdown document.
pub fn render_document(title: &str, transcript: &str, template: &RmdTemplate) -> String {
    let mut doc = String::with_capacity(transcript.len() + 1024);

    doc.push_str("---\n");
    doc.push_str(&format!("title: {}\n", yaml_quote(title)));
    doc.push_str(&format!("author: {}\n", yaml_quote(&template.author)));
    doc.push_str("date: \"`r Sys.Date()`\"\n");
    doc.push_str("output:\n");
    doc.push_str("  pdf_document:\n");
    doc.push_str(&format!("    latex_engine: {}\n", template.latex_engine));
    doc.push_str("  html_document:\n");
    doc.push_str("    df_print: paged\n");
    doc.push_str("header-includes:\n");
    doc.push_str("  - \\usepackage{fontspec}\n");
    doc.push_str(&format!("  - \\setmainfont{{{}}}\n", template.main_font));
    doc.push_str(&format!("  - \\setsansfont{{{}}}\n", template.sans_font));
    doc.push_str(&format!("  - \\setmonofont{{{}}}\n", template.mono_font));
    doc.push_str("---\n\n");

    doc.push_str("```{r setup, include=FALSE}\n");
    doc.push_str(
        "knitr::opts_chunk$set(echo = TRUE, message = FALSE, warning = FALSE, fig.align = \"center\")\n",
    );
    doc.push_str("library(knitr)\n");
    doc.push_str("library(magrittr)\n");
    doc.push_str("```\n\n");

    doc.push_str(TRANSCRIPT_MARKER);
    doc.push_str("\n\n");
    doc.push_str(transcript);
    if !transcript.ends_with('\n') {
        doc.push('\n');
    }
    doc
}

/// YAML double-quoted scalar.
fn yaml_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
