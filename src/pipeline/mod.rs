//! Pipeline stages for PDF-to-R-Markdown conversion.
//!
//! Each submodule implements exactly one step. Stages never hand data to
//! each other in memory: each one writes its artifact into the
//! [`crate::config::Workspace`] and the next one reads it back from disk.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ stage ──▶ render ──▶ ocr ──▶ assemble
//! (path)    (copy)   (pdftoppm) (nougat) (template)
//! ```
//!
//! 1. [`input`]   : validate the user-supplied path before anything touches disk
//! 2. [`stage`]   : copy the source PDF into `assets/in`
//! 3. [`render`]  : rasterise every page with `pdftoppm`, then rename the
//!    images to `1.png`, `2.png`, … via [`naming`]
//! 4. [`ocr`]     : run Nougat and check the `.mmd` transcript exists
//! 5. [`assemble`]: wrap the transcript in the R Markdown template
//!
//! [`tool`] holds the shared child-process plumbing.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod assemble;
pub mod input;
pub mod naming;
pub mod ocr;
pub mod render;
pub mod stage;
pub mod tool;

/// A step of the pipeline, used for progress events and error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Input resolution, before the pipeline proper.
    Input,
    /// Copy the source into the staging directory.
    Copy,
    /// Rasterise pages to PNG.
    Rasterize,
    /// Run the OCR engine.
    Ocr,
    /// Render the output document.
    Assemble,
}

impl Stage {
    /// The four stages the driver runs, in order.
    pub const PIPELINE: [Stage; 4] = [Stage::Copy, Stage::Rasterize, Stage::Ocr, Stage::Assemble];

    /// 1-based position within [`Stage::PIPELINE`]; `0` for [`Stage::Input`].
    pub fn step(self) -> usize {
        Stage::PIPELINE
            .iter()
            .position(|s| *s == self)
            .map_or(0, |i| i + 1)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Copy => "copy",
            Stage::Rasterize => "rasterize",
            Stage::Ocr => "ocr",
            Stage::Assemble => "assemble",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_pipeline_order() {
        assert_eq!(Stage::Input.step(), 0);
        assert_eq!(Stage::Copy.step(), 1);
        assert_eq!(Stage::Rasterize.step(), 2);
        assert_eq!(Stage::Ocr.step(), 3);
        assert_eq!(Stage::Assemble.step(), 4);
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Stage::Rasterize.to_string(), "rasterize");
        assert_eq!(Stage::Ocr.to_string(), "ocr");
    }
}
