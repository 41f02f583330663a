//! # pdf2rmd
//!
//! Convert scanned PDF documents to R Markdown using the
//! [Nougat](https://github.com/facebookresearch/nougat) OCR model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Copy       stage the PDF in assets/in/
//!  ├─ 2. Rasterize  pdftoppm → assets/out/png/1.png, 2.png, …
//!  ├─ 3. OCR        nougat → assets/out/nougat/<stem>.mmd
//!  └─ 4. Assemble   R Markdown header + transcript → assets/out/<stem>.Rmd
//! ```
//!
//! Stages run one after another and communicate only through the
//! [`Workspace`] directories. The first failure ends the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2rmd::{convert, ConversionConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().root("/tmp/work").build()?;
//!     let output = convert("paper.pdf", &config).await?;
//!     println!("{} pages → {}", output.stats.page_count, output.output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## External tools
//!
//! | Tool       | Package                         | Used by |
//! |------------|---------------------------------|---------|
//! | `pdftoppm` | `poppler-utils`                 | rasterise stage |
//! | `nougat`   | `pip install nougat-ocr`        | OCR stage |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2rmd` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, OcrMode, RmdTemplate, Workspace};
pub use convert::{convert, convert_sync, run_pipeline};
pub use error::Pdf2RmdError;
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::input::resolve_input;
pub use pipeline::Stage;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
